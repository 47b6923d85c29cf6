use celestial_astdys::{CatalogRow, CatalogStore, CatalogTable, DEFAULT_AXIS_SIGMA, OSCULATING};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Parser)]
#[command(name = "astdys")]
#[command(about = "Query AstDyS asteroid orbital element catalogs")]
struct Cli {
    /// Directory holding the cache/ folder
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Catalog type (osculating or synthetic)
    #[arg(long, default_value = OSCULATING)]
    catalog: String,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up bodies by identifier
    Search {
        /// One or more identifiers, e.g. 1 or 2017HV1
        #[arg(required = true)]
        ids: Vec<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Find bodies by semi-major axis
    Axis {
        /// Semi-major axis in AU
        axis: f64,
        /// Half-width of the window in AU
        #[arg(long, default_value_t = DEFAULT_AXIS_SIGMA)]
        sigma: f64,
        /// Maximum number of rows to print
        #[arg(long)]
        limit: Option<usize>,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Print the catalog epoch
    Epoch,
    /// Print catalog information
    Info,
    /// Download the raw catalog again and rebuild the cache
    Rebuild,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut store = CatalogStore::builder()
        .with_root_dir(&cli.root)
        .with_default_type(cli.catalog.as_str())
        .build()?;

    for catalog_type in store.catalog_types() {
        if let Some(dir) = store.raw_path(catalog_type).as_deref().and_then(|p| p.parent()) {
            fs::create_dir_all(dir)?;
        }
    }

    match cli.command {
        Commands::Search { ids, format } => {
            let found = store.search_many(&ids)?;
            let rows: Vec<CatalogRow> = ids
                .iter()
                .filter_map(|id| found.get(id).cloned())
                .collect();
            for id in ids.iter().filter(|id| !found.contains_key(*id)) {
                eprintln!("Not found: {}", id);
            }
            print_rows(&rows, &format)?;
        }
        Commands::Axis {
            axis,
            sigma,
            limit,
            format,
        } => {
            let table = store.search_by_axis(axis, sigma)?;
            let rows: Vec<CatalogRow> = table.rows().take(limit.unwrap_or(usize::MAX)).collect();
            print_rows(&rows, &format)?;
            if rows.len() < table.len() {
                eprintln!("Showing {} of {} matches", rows.len(), table.len());
            }
        }
        Commands::Epoch => {
            println!("{}", store.catalog_time()?);
        }
        Commands::Info => {
            print_info(&mut store)?;
        }
        Commands::Rebuild => {
            let rows = store.rebuild()?.len();
            println!("Rebuilt '{}' catalog: {} rows", store.current_type(), rows);
        }
    }

    Ok(())
}

fn print_info(store: &mut CatalogStore) -> anyhow::Result<()> {
    let current = store.current_type().to_string();
    for catalog_type in store.catalog_types() {
        let marker = if catalog_type == current { "*" } else { " " };
        let Some(descriptor) = store.descriptor(catalog_type) else {
            continue;
        };
        println!("{} {}", marker, catalog_type);
        println!("    source: {}", descriptor.source_url);
        if let Some(raw) = store.raw_path(catalog_type) {
            println!("    raw:    {} ({})", raw.display(), presence(&raw));
        }
        if let Some(cache) = store.cache_path(catalog_type) {
            println!("    cache:  {} ({})", cache.display(), presence(&cache));
        }
    }

    let table: &CatalogTable = store.catalog()?;
    println!();
    println!("Rows:    {}", table.len());
    println!("Columns: {}", table.column_names().join(", "));
    if store.descriptor(&current).is_some_and(|d| d.has_epoch()) {
        println!("Epoch:   {}", store.catalog_time()?);
    }
    Ok(())
}

fn presence(path: &Path) -> &'static str {
    if path.exists() {
        "present"
    } else {
        "missing"
    }
}

fn print_rows(rows: &[CatalogRow], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print_table(rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Csv => write_csv(rows, io::stdout().lock())?,
    }
    Ok(())
}

fn print_table(rows: &[CatalogRow]) {
    let Some(first) = rows.first() else {
        println!("No bodies found matching the search criteria.");
        return;
    };

    let header: Vec<&str> = first.iter().map(|(name, _)| name).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|(_, value)| value.to_string()).collect())
        .collect();
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |fields: Vec<&str>| {
        fields
            .iter()
            .zip(&widths)
            .map(|(field, width)| format!("{:>width$}", field, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(header));
    for row in &cells {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
    println!("\nTotal results: {}", rows.len());
}

fn write_csv<W: Write>(rows: &[CatalogRow], writer: W) -> anyhow::Result<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(first.iter().map(|(name, _)| name))?;
    for row in rows {
        csv.write_record(row.iter().map(|(_, value)| value.to_string()))?;
    }
    csv.flush()?;
    Ok(())
}
