//! Typed, indexed access to AstDyS asteroid orbital element catalogs.
//!
//! AstDyS publishes its catalogs as fixed-format text files. This crate
//! downloads a catalog on first use, normalizes it (quote stripping, filler
//! columns dropped, angles in radians), caches the result as CSV and answers
//! identifier and semi-major axis lookups against it.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`store`] | [`CatalogStore`]: fetch-if-missing, build, load, catalog type selection |
//! | [`query`] | [`search`](CatalogStore::search), [`search_by_axis`](CatalogStore::search_by_axis), catalog epoch, [`Identifier`] |
//! | [`config`] | [`StoreConfig`], [`CatalogStoreBuilder`] |
//! | [`descriptor`] | [`CatalogDescriptor`] for the osculating and synthetic catalogs |
//! | [`transform`] | Raw text → [`CatalogTable`] |
//! | [`table`] | [`CatalogTable`], [`CatalogRow`], CSV cache format |
//! | [`download`] | [`Fetcher`] trait and the blocking [`HttpFetcher`] |
//! | [`time`] | MJD → calendar date |
//! | [`error`] | [`Error`] and [`Result`] |
//!
//! # Quick Start
//!
//! ```ignore
//! use celestial_astdys::CatalogStore;
//!
//! let mut store = CatalogStore::builder().with_root_dir("data").build()?;
//!
//! // First call downloads data/cache/allnum.cat and writes data/cache/allnum.csv
//! if let Some(ceres) = store.search(1)? {
//!     println!("a = {:?} AU", ceres.get_f64("a"));
//! }
//!
//! let near_ceres = store.search_by_axis(2.77, 0.01)?;
//! println!("{} bodies within 0.01 AU", near_ceres.len());
//!
//! println!("elements at {}", store.catalog_time()?);
//!
//! store.set_type("synthetic")?;
//! let proper = store.search_many([1, 2, 4])?;
//! ```
//!
//! # Filesystem Layout
//!
//! Descriptor paths are relative to [`StoreConfig::root_dir`]. Both built-in
//! catalogs live under `cache/`, which must exist before the first build.
//!
//! | Catalog | Raw file | CSV cache |
//! |---------|----------|-----------|
//! | `osculating` | `cache/allnum.cat` | `cache/allnum.csv` |
//! | `synthetic` | `cache/all.syn` | `cache/all_syn.csv` |
//!
//! # Features
//!
//! - **`cli`**: Enables the `astdys` binary.
//! - **`integration-tests`**: Enables tests that hit the live AstDyS server.

pub mod config;
pub mod descriptor;
pub mod download;
pub mod error;
pub mod query;
pub mod store;
pub mod table;
pub mod time;
pub mod transform;

pub use config::{CatalogStoreBuilder, StoreConfig};
pub use descriptor::{CatalogDescriptor, OSCULATING, SYNTHETIC};
pub use download::{Fetcher, HttpFetcher};
pub use error::{Error, Result};
pub use query::{Identifier, DEFAULT_AXIS_SIGMA};
pub use store::CatalogStore;
pub use table::{CatalogRow, CatalogTable, Value};
pub use time::{mjd_to_datetime, mjd_to_string};
