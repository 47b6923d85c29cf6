//! Raw AstDyS catalog → normalized [`CatalogTable`].
//!
//! Raw catalogs are whitespace-delimited text with a few header lines. The
//! transform assigns the descriptor's column names positionally, strips the
//! single quotes that wrap some identifiers (`'1'`), drops `del_` filler
//! columns, converts angle columns from degrees to radians and moves the
//! epoch column to the end.

use crate::descriptor::{is_filler, CatalogDescriptor};
use crate::error::{Error, Result};
use crate::table::{CatalogTable, Column, ColumnData};
use std::fs;
use std::path::Path;

/// Read and transform a raw catalog file.
pub fn transform_file(
    path: impl AsRef<Path>,
    descriptor: &CatalogDescriptor,
) -> Result<CatalogTable> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    transform_str(&content, descriptor).map_err(|e| match e {
        Error::Format(msg) => Error::Format(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Transform raw catalog text.
///
/// # Errors
/// [`Error::Config`] for an invalid descriptor; [`Error::Format`] when a row's
/// field count differs from the descriptor's column count or a degree
/// column holds a non-numeric value.
pub fn transform_str(content: &str, descriptor: &CatalogDescriptor) -> Result<CatalogTable> {
    descriptor.validate()?;

    let width = descriptor.column_names.len();
    let mut raw: Vec<Vec<String>> = vec![Vec::new(); width];
    let mut line_numbers = Vec::new();

    for (line_num, line) in content.lines().enumerate().skip(descriptor.skip_rows) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != width {
            return Err(Error::Format(format!(
                "line {}: expected {} fields for '{}' catalog, got {}",
                line_num + 1,
                width,
                descriptor.catalog_type,
                fields.len()
            )));
        }
        for (col, field) in raw.iter_mut().zip(fields) {
            col.push(field.replace('\'', ""));
        }
        line_numbers.push(line_num + 1);
    }

    let mut columns = Vec::with_capacity(width);
    for name in descriptor.retained_columns() {
        let pos = descriptor
            .column_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::Config(format!("column '{}' not in descriptor", name)))?;
        let values = std::mem::take(&mut raw[pos]);

        let data = if pos == 0 {
            ColumnData::Text(values)
        } else if descriptor.degree_columns.iter().any(|d| d == name) {
            ColumnData::Float(to_radians(name, &values, &line_numbers)?)
        } else {
            ColumnData::infer(values)
        };
        columns.push(Column::new(name, data));
    }

    let dropped = descriptor
        .column_names
        .iter()
        .filter(|n| is_filler(n))
        .count();
    log::debug!(
        "transformed {} rows of '{}' catalog ({} columns kept, {} dropped)",
        line_numbers.len(),
        descriptor.catalog_type,
        columns.len(),
        dropped
    );

    CatalogTable::new(columns)
}

fn to_radians(name: &str, values: &[String], lines: &[usize]) -> Result<Vec<f64>> {
    values
        .iter()
        .zip(lines)
        .map(|(value, line)| {
            value
                .parse::<f64>()
                .map(f64::to_radians)
                .map_err(|_| {
                    Error::Format(format!(
                        "line {}: non-numeric value '{}' in degree column '{}'",
                        line, value, name
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const OSCULATING_SAMPLE: &str = "\
format  = 'OEF2.0'       ! file format
rectype = 'ML'           ! record type (1L/ML)
elem    = 'KEP'          ! type of orbital elements
refsys  = ECLM J2000     ! default reference system
END_OF_HEADER
! Name, Epoch(MJD), a, e, i, long. node, arg. peric., mean anomaly, absolute magnitude, slope param., non-grav param.
'1'  59215.000000   2.7660318   0.0781612  10.587790  80.268040  73.734200 162.686600  3.53  0.12 0
'6'  59215.000000   2.4245600   0.2032800  14.739730 138.642930 239.707650 242.944810  5.65  0.24 0
'2017HV1'  59215.000000   1.2000000   0.3000000   5.000000  90.000000 180.000000  45.000000 22.10  0.15 0
";

    const SYNTHETIC_SAMPLE: &str = "\
% Name   mag.     a         e         sinI        n            g            s          LCE     My
%-------------------------------------------------------------------------------------------------
       1  3.53  2.767089  0.115800  0.167702   78.193436    54.251553   -59.170138   5.34   3.22
       6  5.65  2.425362  0.158900  0.228100   95.286520    32.195110   -40.897610   4.12   2.90
";

    #[test]
    fn test_osculating_columns() {
        let table = transform_str(OSCULATING_SAMPLE, &CatalogDescriptor::osculating()).unwrap();
        assert_eq!(
            table.column_names(),
            vec!["num", "a", "e", "inc", "Omega", "omega", "M", "epoch"]
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_quotes_stripped_from_identifiers() {
        let table = transform_str(OSCULATING_SAMPLE, &CatalogDescriptor::osculating()).unwrap();
        assert_eq!(
            table.identifiers(),
            &["1".to_string(), "6".to_string(), "2017HV1".to_string()]
        );
    }

    #[test]
    fn test_degrees_converted() {
        let table = transform_str(OSCULATING_SAMPLE, &CatalogDescriptor::osculating()).unwrap();
        let row = table.get("6").unwrap();
        assert!((row.get_f64("inc").unwrap() - 14.73973 * PI / 180.0).abs() < 1e-12);
        assert!((row.get_f64("Omega").unwrap().to_degrees() - 138.64293).abs() < 1e-9);
        assert!((row.get_f64("omega").unwrap().to_degrees() - 239.70765).abs() < 1e-9);
        assert!((row.get_f64("M").unwrap().to_degrees() - 242.94481).abs() < 1e-9);
        assert_eq!(row.get_f64("a"), Some(2.42456));
        assert_eq!(row.get_f64("epoch"), Some(59215.0));
    }

    #[test]
    fn test_synthetic_columns_unconverted() {
        let table = transform_str(SYNTHETIC_SAMPLE, &CatalogDescriptor::synthetic()).unwrap();
        assert_eq!(
            table.column_names(),
            vec!["num", "mag", "a", "e", "sinI", "n", "g", "s", "lce", "my"]
        );
        let row = table.get("1").unwrap();
        assert_eq!(row.get_f64("g"), Some(54.251553));
        assert_eq!(row.get_f64("s"), Some(-59.170138));
    }

    #[test]
    fn test_field_count_mismatch() {
        let content = format!("{}'7' 59215.0 2.38 0.23\n", OSCULATING_SAMPLE);
        let err = transform_str(&content, &CatalogDescriptor::osculating()).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        let msg = err.to_string();
        assert!(msg.contains("line 10"), "unexpected error: {}", msg);
        assert!(msg.contains("expected 11"), "unexpected error: {}", msg);
    }

    #[test]
    fn test_non_numeric_degree_value() {
        let content = OSCULATING_SAMPLE.replace("14.739730", "n/a");
        let err = transform_str(&content, &CatalogDescriptor::osculating()).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("'inc'"));
    }

    #[test]
    fn test_quoted_degree_value_still_parses() {
        let content = OSCULATING_SAMPLE.replace("14.739730", "'14.739730'");
        let table = transform_str(&content, &CatalogDescriptor::osculating()).unwrap();
        let inc = table.get("6").unwrap().get_f64("inc").unwrap();
        assert!((inc.to_degrees() - 14.73973).abs() < 1e-9);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let content = format!("{}\n\n", OSCULATING_SAMPLE);
        let table = transform_str(&content, &CatalogDescriptor::osculating()).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_header_only_gives_empty_table() {
        let header: String = OSCULATING_SAMPLE
            .lines()
            .take(6)
            .map(|l| format!("{}\n", l))
            .collect();
        let table = transform_str(&header, &CatalogDescriptor::osculating()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_names().len(), 8);
    }

    #[test]
    fn test_invalid_descriptor_rejected() {
        let mut descriptor = CatalogDescriptor::osculating();
        descriptor.degree_columns.push("nope".into());
        assert!(matches!(
            transform_str(OSCULATING_SAMPLE, &descriptor),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_transform_file_prefixes_path_on_format_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.cat");
        fs::write(&path, format!("{}'7' 1 2\n", OSCULATING_SAMPLE)).unwrap();
        let err = transform_file(&path, &CatalogDescriptor::osculating()).unwrap_err();
        assert!(err.to_string().contains("broken.cat"));
    }

    #[test]
    fn test_transform_file_missing_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = transform_file(dir.path().join("absent.cat"), &CatalogDescriptor::osculating())
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
