//! Lookups against the current catalog.
//!
//! Every query loads the current catalog first if it is not in memory yet.

use crate::descriptor::EPOCH_COLUMN;
use crate::error::{Error, Result};
use crate::store::CatalogStore;
use crate::table::{CatalogRow, CatalogTable};
use crate::time::{mjd_to_datetime, mjd_to_string};

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt;

/// Half-width of the default semi-major axis window, in AU.
pub const DEFAULT_AXIS_SIGMA: f64 = 0.1;

/// Column searched by [`CatalogStore::search_by_axis`].
pub const AXIS_COLUMN: &str = "a";

/// Identifier of the body whose epoch stamps the whole catalog.
pub const REFERENCE_IDENTIFIER: &str = "1";

/// A catalog identifier.
///
/// Identifiers are compared as exact strings. Integers convert to their
/// decimal form, strings are kept verbatim, so `"0001"` and `1` are
/// different identifiers and designations like `"4150T-3"` are never
/// reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for Identifier {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

macro_rules! identifier_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Identifier {
                fn from(value: $t) -> Self {
                    Self(value.to_string())
                }
            }
        )*
    };
}

identifier_from_int!(u16, u32, u64, usize, i32, i64);

impl CatalogStore {
    /// Look up one body by exact identifier.
    ///
    /// Returns `Ok(None)` when no row matches.
    pub fn search(&mut self, id: impl Into<Identifier>) -> Result<Option<CatalogRow>> {
        let id = id.into();
        let table = self.ensure_loaded()?;
        Ok(table.get(id.as_str()))
    }

    /// Look up several bodies. Identifiers without a match are left out.
    pub fn search_many<I, T>(&mut self, ids: I) -> Result<HashMap<String, CatalogRow>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Identifier>,
    {
        let table = self.ensure_loaded()?;
        let found = ids
            .into_iter()
            .map(Into::into)
            .filter_map(|id: Identifier| {
                table
                    .get(id.as_str())
                    .map(|row| (id.into_string(), row))
            })
            .collect();
        Ok(found)
    }

    /// All rows whose semi-major axis lies in `[axis - sigma, axis + sigma]`.
    ///
    /// # Errors
    /// [`Error::Validation`] unless both `axis` and `sigma` are positive;
    /// [`Error::Config`] when the current catalog has no numeric `a` column.
    pub fn search_by_axis(&mut self, axis: f64, sigma: f64) -> Result<CatalogTable> {
        if axis.is_nan() || axis <= 0.0 {
            return Err(Error::Validation(format!(
                "axis must be positive, got {}",
                axis
            )));
        }
        if sigma.is_nan() || sigma <= 0.0 {
            return Err(Error::Validation(format!(
                "sigma must be positive, got {}",
                sigma
            )));
        }

        let catalog_type = self.current_type().to_string();
        let table = self.ensure_loaded()?;
        let values = table.float_column(AXIS_COLUMN).ok_or_else(|| {
            Error::Config(format!(
                "catalog '{}' has no numeric '{}' column",
                catalog_type, AXIS_COLUMN
            ))
        })?;

        let (low, high) = (axis - sigma, axis + sigma);
        let matches: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, &a)| a >= low && a <= high)
            .map(|(i, _)| i)
            .collect();
        log::debug!(
            "axis search [{}, {}]: {} of {} rows",
            low,
            high,
            matches.len(),
            values.len()
        );
        Ok(table.select(&matches))
    }

    /// Catalog epoch as `YYYY-MM-DD HH:MM:SS`.
    pub fn catalog_time(&mut self) -> Result<String> {
        let mjd = self.catalog_epoch()?;
        mjd_to_string(mjd)
    }

    pub fn catalog_datetime(&mut self) -> Result<NaiveDateTime> {
        let mjd = self.catalog_epoch()?;
        mjd_to_datetime(mjd)
    }

    /// The full in-memory table of the current catalog.
    pub fn catalog(&mut self) -> Result<&CatalogTable> {
        self.ensure_loaded()
    }

    /// MJD epoch of the reference body.
    fn catalog_epoch(&mut self) -> Result<f64> {
        let descriptor = self.current_descriptor()?;
        if !descriptor.has_epoch() {
            return Err(Error::Config(format!(
                "catalog '{}' has no '{}' column",
                descriptor.catalog_type, EPOCH_COLUMN
            )));
        }

        let row = self.search(REFERENCE_IDENTIFIER)?.ok_or_else(|| {
            Error::Config(format!(
                "catalog '{}' has no body '{}' to read the epoch from",
                self.current_type(),
                REFERENCE_IDENTIFIER
            ))
        })?;
        row.get_f64(EPOCH_COLUMN).ok_or_else(|| {
            Error::Config(format!(
                "body '{}' has no numeric epoch",
                REFERENCE_IDENTIFIER
            ))
        })
    }
}
