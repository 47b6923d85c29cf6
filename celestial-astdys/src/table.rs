//! Column-typed in-memory catalog table and its CSV persistence.
//!
//! A [`CatalogTable`] holds one row per body and one typed column per field.
//! The first column is always the identifier and is always text, so that
//! designations like `2017HV1` and numeric names like `1` are compared as
//! written. Exact lookups go through a hash index built on construction.

use crate::error::{Error, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Float(f64),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Float(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Float(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<String>),
    Float(Vec<f64>),
}

impl ColumnData {
    /// Float when every value parses as `f64`, text otherwise.
    pub fn infer(values: Vec<String>) -> Self {
        let parsed: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse().ok()).collect();
        match parsed {
            Some(floats) => ColumnData::Float(floats),
            None => ColumnData::Text(values),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value(&self, row: usize) -> Option<Value> {
        match self {
            ColumnData::Text(v) => v.get(row).cloned().map(Value::Text),
            ColumnData::Float(v) => v.get(row).copied().map(Value::Float),
        }
    }

    fn select(&self, rows: &[usize]) -> Self {
        match self {
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&i| v[i].clone()).collect()),
            ColumnData::Float(v) => ColumnData::Float(rows.iter().map(|&i| v[i]).collect()),
        }
    }

    fn csv_field(&self, row: usize) -> String {
        match self {
            ColumnData::Text(v) => v[row].clone(),
            ColumnData::Float(v) => v[row].to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// One catalog row as ordered `(column, value)` pairs. Serializes as a map.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    fields: Vec<(String, Value)>,
}

impl CatalogRow {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Value of the identifier (first) column.
    pub fn identifier(&self) -> &str {
        self.fields
            .first()
            .and_then(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for CatalogRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// In-memory catalog keyed by identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTable {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl CatalogTable {
    /// Assemble a table from columns, identifier first.
    ///
    /// # Errors
    /// [`Error::Format`] if there are no columns, the first column is not
    /// text, column lengths differ, or a column name repeats.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let first = columns
            .first()
            .ok_or_else(|| Error::Format("table has no columns".into()))?;
        let ids = match &first.data {
            ColumnData::Text(ids) => ids,
            ColumnData::Float(_) => {
                return Err(Error::Format(format!(
                    "identifier column '{}' must be text",
                    first.name
                )))
            }
        };

        let rows = ids.len();
        for (i, col) in columns.iter().enumerate() {
            if col.data.len() != rows {
                return Err(Error::Format(format!(
                    "column '{}' has {} values, expected {}",
                    col.name,
                    col.data.len(),
                    rows
                )));
            }
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(Error::Format(format!("duplicate column '{}'", col.name)));
            }
        }

        let mut index = HashMap::with_capacity(rows);
        for (row, id) in ids.iter().enumerate() {
            index.entry(id.clone()).or_insert(row);
        }

        Ok(Self { columns, index })
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Values of a float column; `None` if the column is missing or text.
    pub fn float_column(&self, name: &str) -> Option<&[f64]> {
        match &self.column(name)?.data {
            ColumnData::Float(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }

    pub fn identifier_column(&self) -> &str {
        &self.columns[0].name
    }

    pub fn identifiers(&self) -> &[String] {
        match &self.columns[0].data {
            ColumnData::Text(ids) => ids,
            ColumnData::Float(_) => &[],
        }
    }

    /// Row position of an identifier, exact match.
    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.index.get(identifier).copied()
    }

    pub fn row(&self, index: usize) -> Option<CatalogRow> {
        if index >= self.len() {
            return None;
        }
        let fields = self
            .columns
            .iter()
            .filter_map(|c| c.data.value(index).map(|v| (c.name.clone(), v)))
            .collect();
        Some(CatalogRow { fields })
    }

    pub fn get(&self, identifier: &str) -> Option<CatalogRow> {
        self.position(identifier).and_then(|i| self.row(i))
    }

    pub fn rows(&self) -> impl Iterator<Item = CatalogRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// New table with the given rows, in the given order.
    ///
    /// # Panics
    /// If a row index is out of range.
    pub fn select(&self, rows: &[usize]) -> CatalogTable {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.select(rows)))
            .collect();
        let mut index = HashMap::with_capacity(rows.len());
        if let Some(ColumnData::Text(ids)) = columns.first().map(|c| &c.data) {
            for (row, id) in ids.iter().enumerate() {
                index.entry(id.clone()).or_insert(row);
            }
        }
        CatalogTable { columns, index }
    }

    /// Render as CSV: header row, then one line per body.
    pub fn to_csv_string(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_csv_to(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.columns.iter().map(|c| c.name.as_str()))
            .map_err(csv_error)?;
        for row in 0..self.len() {
            csv.write_record(self.columns.iter().map(|c| c.data.csv_field(row)))
                .map_err(csv_error)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Write the table as CSV.
    ///
    /// The file is written to a temporary sibling and renamed into place,
    /// so an existing cache is never left half-written.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("csv.tmp");
        let result = File::create(&tmp_path)
            .map_err(Error::from)
            .and_then(|file| self.write_csv_to(BufWriter::new(file)))
            .and_then(|()| fs::rename(&tmp_path, path).map_err(Error::from));
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    /// Read a table written by [`CatalogTable::write_csv`].
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    /// Parse CSV text. The first column is kept as text; the others are
    /// typed by [`ColumnData::infer`].
    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_csv_reader(content.as_bytes())
    }

    fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let header: Vec<String> = csv
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();
        if header.is_empty() {
            return Err(Error::Format("CSV has no header row".into()));
        }

        let mut raw: Vec<Vec<String>> = vec![Vec::new(); header.len()];
        for record in csv.records() {
            let record = record.map_err(csv_error)?;
            for (col, field) in raw.iter_mut().zip(record.iter()) {
                col.push(field.to_string());
            }
        }

        let columns = header
            .into_iter()
            .zip(raw)
            .enumerate()
            .map(|(i, (name, values))| {
                let data = if i == 0 {
                    ColumnData::Text(values)
                } else {
                    ColumnData::infer(values)
                };
                Column::new(name, data)
            })
            .collect();
        Self::new(columns)
    }
}

fn csv_error(err: csv::Error) -> Error {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(e) = err.into_kind() {
            return Error::Io(e);
        }
        return Error::Format("CSV I/O error".into());
    }
    match err.position() {
        Some(pos) => Error::Format(format!("line {}: {}", pos.line(), err)),
        None => Error::Format(err.to_string()),
    }
}
