//! Catalog descriptors: where a catalog variant lives and how its raw rows map to columns.
//!
//! Both AstDyS variants are handled by one parameterized descriptor rather
//! than per-variant parsers. Column names starting with [`FILLER_PREFIX`] mark
//! raw fields that are parsed positionally and then discarded.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::PathBuf;

/// Catalog type of the osculating element catalog.
pub const OSCULATING: &str = "osculating";

/// Catalog type of the synthetic proper element catalog.
pub const SYNTHETIC: &str = "synthetic";

/// Prefix of raw columns that are dropped during the transform.
pub const FILLER_PREFIX: &str = "del_";

/// Name of the column holding the MJD epoch, when a variant has one.
pub const EPOCH_COLUMN: &str = "epoch";

pub const OSCULATING_URL: &str = "https://newton.spacedys.com/~astdys2/catalogs/allnum.cat";
pub const SYNTHETIC_URL: &str = "https://newton.spacedys.com/~astdys2/propsynth/all.syn";

/// Immutable description of one catalog variant.
///
/// Paths are relative to the store's root directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDescriptor {
    /// Raw fixed-format file as downloaded from `source_url`.
    pub original_filename: PathBuf,
    /// Normalized CSV cache built from the raw file.
    pub cached_filename: PathBuf,
    pub source_url: String,
    pub catalog_type: String,
    /// Header lines to discard before the first data row.
    pub skip_rows: usize,
    /// One name per raw column, identifier first.
    pub column_names: Vec<String>,
    /// Columns converted from degrees to radians.
    pub degree_columns: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl CatalogDescriptor {
    /// Osculating Keplerian elements of numbered asteroids (`allnum.cat`).
    ///
    /// Rows are `name epoch a e i node peri M H G nongrav`; the last three are dropped.
    pub fn osculating() -> Self {
        Self {
            original_filename: PathBuf::from("cache/allnum.cat"),
            cached_filename: PathBuf::from("cache/allnum.csv"),
            source_url: OSCULATING_URL.to_string(),
            catalog_type: OSCULATING.to_string(),
            skip_rows: 6,
            column_names: names(&[
                "num", "epoch", "a", "e", "inc", "Omega", "omega", "M", "del_1", "del_2", "del_3",
            ]),
            degree_columns: names(&["inc", "Omega", "omega", "M"]),
        }
    }

    /// Synthetic proper elements of numbered asteroids (`all.syn`).
    ///
    /// Rows are `name mag a e sinI n g s LCE my`. The proper frequencies are
    /// rates, not angles, so nothing is converted.
    pub fn synthetic() -> Self {
        Self {
            original_filename: PathBuf::from("cache/all.syn"),
            cached_filename: PathBuf::from("cache/all_syn.csv"),
            source_url: SYNTHETIC_URL.to_string(),
            catalog_type: SYNTHETIC.to_string(),
            skip_rows: 2,
            column_names: names(&["num", "mag", "a", "e", "sinI", "n", "g", "s", "lce", "my"]),
            degree_columns: Vec::new(),
        }
    }

    /// Both built-in variants.
    pub fn builtins() -> Vec<Self> {
        vec![Self::osculating(), Self::synthetic()]
    }

    /// Name of the identifier column.
    pub fn identifier_column(&self) -> Option<&str> {
        self.column_names.first().map(String::as_str)
    }

    /// Columns that survive the transform, in output order (identifier first, epoch last).
    pub fn retained_columns(&self) -> Vec<&str> {
        let mut kept: Vec<&str> = self
            .column_names
            .iter()
            .map(String::as_str)
            .filter(|name| !is_filler(name))
            .collect();
        if let Some(pos) = kept.iter().skip(1).position(|&n| n == EPOCH_COLUMN) {
            let epoch = kept.remove(pos + 1);
            kept.push(epoch);
        }
        kept
    }

    /// True when the transformed table carries an epoch column.
    pub fn has_epoch(&self) -> bool {
        self.retained_columns().contains(&EPOCH_COLUMN)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    /// [`Error::Config`] when the column list is empty, the identifier column
    /// is a filler, a retained name repeats, or a degree column is missing
    /// from `column_names` or is a filler.
    pub fn validate(&self) -> Result<()> {
        let id = self.identifier_column().ok_or_else(|| {
            Error::Config(format!("catalog '{}' has no columns", self.catalog_type))
        })?;
        if is_filler(id) {
            return Err(Error::Config(format!(
                "catalog '{}': identifier column '{}' cannot be a filler",
                self.catalog_type, id
            )));
        }

        let mut seen = HashSet::new();
        for name in self.column_names.iter().filter(|n| !is_filler(n)) {
            if !seen.insert(name.as_str()) {
                return Err(Error::Config(format!(
                    "catalog '{}': duplicate column '{}'",
                    self.catalog_type, name
                )));
            }
        }

        for col in &self.degree_columns {
            if !seen.contains(col.as_str()) {
                return Err(Error::Config(format!(
                    "catalog '{}': degree column '{}' is not a retained column",
                    self.catalog_type, col
                )));
            }
            if col == id {
                return Err(Error::Config(format!(
                    "catalog '{}': identifier column '{}' cannot be converted to radians",
                    self.catalog_type, col
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn is_filler(name: &str) -> bool {
    name.starts_with(FILLER_PREFIX)
}
