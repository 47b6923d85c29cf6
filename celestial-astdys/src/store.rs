//! The catalog store: descriptors, loaded tables and the current catalog type.
//!
//! A table moves through raw file → CSV cache → memory lazily:
//!
//! ```text
//! source_url --fetch--> original_filename --transform--> cached_filename --read--> memory
//! ```
//!
//! Each step only runs when its output is missing. Constructing a store
//! never touches the filesystem or the network.

use crate::config::{CatalogStoreBuilder, StoreConfig};
use crate::descriptor::CatalogDescriptor;
use crate::download::Fetcher;
use crate::error::{Error, Result};
use crate::table::CatalogTable;
use crate::transform::transform_file;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CatalogStore {
    config: StoreConfig,
    descriptors: HashMap<String, CatalogDescriptor>,
    tables: HashMap<String, CatalogTable>,
    current: String,
    fetcher: Box<dyn Fetcher>,
}

impl CatalogStore {
    /// Store with default configuration and both built-in catalogs.
    pub fn new() -> Result<Self> {
        CatalogStoreBuilder::new().build()
    }

    pub fn builder() -> CatalogStoreBuilder {
        CatalogStoreBuilder::new()
    }

    pub(crate) fn with_parts(
        config: StoreConfig,
        descriptors: Vec<CatalogDescriptor>,
        fetcher: Box<dyn Fetcher>,
    ) -> Result<Self> {
        let mut registry = HashMap::with_capacity(descriptors.len());
        for descriptor in descriptors {
            descriptor.validate()?;
            registry.insert(descriptor.catalog_type.clone(), descriptor);
        }
        if !registry.contains_key(&config.default_type) {
            return Err(Error::Config(format!(
                "default catalog type '{}' has no descriptor",
                config.default_type
            )));
        }

        Ok(Self {
            current: config.default_type.clone(),
            config,
            descriptors: registry,
            tables: HashMap::new(),
            fetcher,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn current_type(&self) -> &str {
        &self.current
    }

    /// Registered catalog types, sorted.
    pub fn catalog_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn descriptor(&self, catalog_type: &str) -> Option<&CatalogDescriptor> {
        self.descriptors.get(catalog_type)
    }

    pub fn current_descriptor(&self) -> Result<&CatalogDescriptor> {
        self.descriptors.get(&self.current).ok_or_else(|| {
            Error::Config(format!("unknown catalog type '{}'", self.current))
        })
    }

    pub fn is_loaded(&self, catalog_type: &str) -> bool {
        self.tables.contains_key(catalog_type)
    }

    /// In-memory table for `catalog_type`, without loading.
    pub fn table(&self, catalog_type: &str) -> Option<&CatalogTable> {
        self.tables.get(catalog_type)
    }

    /// Absolute location of the raw catalog for `catalog_type`.
    pub fn raw_path(&self, catalog_type: &str) -> Option<PathBuf> {
        self.descriptor(catalog_type)
            .map(|d| self.resolve(&d.original_filename))
    }

    /// Absolute location of the CSV cache for `catalog_type`.
    pub fn cache_path(&self, catalog_type: &str) -> Option<PathBuf> {
        self.descriptor(catalog_type)
            .map(|d| self.resolve(&d.cached_filename))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.config.root_dir.join(path)
    }

    /// Add or replace a descriptor. Replacing drops that type's loaded table.
    ///
    /// Returns the previous descriptor for the type, if any.
    pub fn register_descriptor(
        &mut self,
        descriptor: CatalogDescriptor,
    ) -> Result<Option<CatalogDescriptor>> {
        descriptor.validate()?;
        let catalog_type = descriptor.catalog_type.clone();
        let previous = self.descriptors.insert(catalog_type.clone(), descriptor);
        if previous.is_some() && self.tables.remove(&catalog_type).is_some() {
            log::warn!("descriptor for '{}' replaced; dropped loaded table", catalog_type);
        }
        Ok(previous)
    }

    /// Switch the current catalog type and load it from disk.
    ///
    /// An unknown type leaves the current type untouched. A known type is
    /// always re-read, even when a table for it is already in memory.
    pub fn set_type(&mut self, catalog_type: &str) -> Result<&CatalogTable> {
        if !self.descriptors.contains_key(catalog_type) {
            return Err(Error::Config(format!(
                "unknown catalog type '{}' (expected one of: {})",
                catalog_type,
                self.catalog_types().join(", ")
            )));
        }
        if self.current != catalog_type {
            log::info!("switching catalog type {} -> {}", self.current, catalog_type);
        }
        self.current = catalog_type.to_string();
        self.load()
    }

    /// Load the current catalog unless it is already in memory.
    pub fn ensure_loaded(&mut self) -> Result<&CatalogTable> {
        if !self.tables.contains_key(&self.current) {
            self.load()?;
        }
        self.loaded_table()
    }

    /// Read the CSV cache into memory, building it first if absent.
    ///
    /// Replaces any table already loaded for the current type.
    pub fn load(&mut self) -> Result<&CatalogTable> {
        let descriptor = self.current_descriptor()?;
        let cache_path = self.resolve(&descriptor.cached_filename);
        if !cache_path.exists() {
            self.build_catalog(descriptor)?;
        }

        let table = CatalogTable::read_csv(&cache_path)?;
        log::info!(
            "loaded '{}' catalog: {} rows from {}",
            self.current,
            table.len(),
            cache_path.display()
        );
        self.tables.insert(self.current.clone(), table);
        self.loaded_table()
    }

    /// Fetch the raw file if missing, transform it and write the CSV cache.
    ///
    /// The in-memory table is left alone; call [`load`](Self::load) to pick
    /// up the new cache. Returns the number of rows written.
    pub fn build(&self) -> Result<usize> {
        let descriptor = self.current_descriptor()?;
        self.build_catalog(descriptor).map(|table| table.len())
    }

    /// Delete the raw file, rebuild from a fresh download and reload.
    pub fn rebuild(&mut self) -> Result<&CatalogTable> {
        let descriptor = self.current_descriptor()?;
        let raw_path = self.resolve(&descriptor.original_filename);
        if raw_path.exists() {
            log::warn!("removing {} to force a fresh download", raw_path.display());
            fs::remove_file(&raw_path)?;
        }
        self.build()?;
        self.load()
    }

    fn build_catalog(&self, descriptor: &CatalogDescriptor) -> Result<CatalogTable> {
        let raw_path = self.resolve(&descriptor.original_filename);
        if !raw_path.exists() {
            log::info!(
                "raw '{}' catalog not found at {}, fetching",
                descriptor.catalog_type,
                raw_path.display()
            );
            self.fetcher
                .fetch(&descriptor.source_url, &raw_path)
                .map_err(|e| {
                    log::warn!("fetching {} failed: {}", descriptor.source_url, e);
                    match e {
                        Error::Download { .. } => e,
                        other => Error::download(&descriptor.source_url, &raw_path, other),
                    }
                })?;
        }

        let table = transform_file(&raw_path, descriptor)?;
        let cache_path = self.resolve(&descriptor.cached_filename);
        table.write_csv(&cache_path)?;
        log::info!(
            "built '{}' catalog: {} rows written to {}",
            descriptor.catalog_type,
            table.len(),
            cache_path.display()
        );
        Ok(table)
    }

    fn loaded_table(&self) -> Result<&CatalogTable> {
        self.tables.get(&self.current).ok_or_else(|| {
            Error::Config(format!("catalog '{}' is not loaded", self.current))
        })
    }
}

impl fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut loaded: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        loaded.sort_unstable();
        f.debug_struct("CatalogStore")
            .field("config", &self.config)
            .field("catalog_types", &self.catalog_types())
            .field("current", &self.current)
            .field("loaded", &loaded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{OSCULATING, SYNTHETIC};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    const ALLNUM: &str = include_str!("../tests/data/allnum_small.cat");
    const ALL_SYN: &str = include_str!("../tests/data/all_small.syn");

    /// Serves fixture text by URL suffix and counts calls.
    struct FixtureFetcher {
        calls: Arc<AtomicUsize>,
    }

    impl Fetcher for FixtureFetcher {
        fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = if url.ends_with("allnum.cat") {
                ALLNUM
            } else if url.ends_with("all.syn") {
                ALL_SYN
            } else {
                return Err(Error::download(url, dest, "no fixture"));
            };
            fs::write(dest, body)?;
            Ok(body.len() as u64)
        }
    }

    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn fetch(&self, _url: &str, _dest: &Path) -> Result<u64> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
    }

    fn fixture_store() -> (TempDir, CatalogStore, Arc<AtomicUsize>) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("cache")).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let store = CatalogStore::builder()
            .with_root_dir(dir.path())
            .with_fetcher(FixtureFetcher {
                calls: Arc::clone(&calls),
            })
            .build()
            .unwrap();
        (dir, store, calls)
    }

    #[test]
    fn test_new_store_is_lazy() {
        let (dir, store, calls) = fixture_store();
        assert_eq!(store.current_type(), OSCULATING);
        assert!(!store.is_loaded(OSCULATING));
        assert!(!dir.path().join("cache/allnum.cat").exists());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_load_fetches_builds_and_caches() {
        let (dir, mut store, calls) = fixture_store();
        let table = store.load().unwrap();
        assert_eq!(table.len(), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(dir.path().join("cache/allnum.cat").exists());
        assert!(dir.path().join("cache/allnum.csv").exists());
        assert!(store.is_loaded(OSCULATING));
    }

    #[test]
    fn test_cached_csv_header() {
        let (dir, mut store, _) = fixture_store();
        store.load().unwrap();
        let csv = fs::read_to_string(dir.path().join("cache/allnum.csv")).unwrap();
        assert_eq!(
            csv.lines().next().unwrap(),
            "num,a,e,inc,Omega,omega,M,epoch"
        );
        assert_eq!(csv.lines().count(), 11);
    }

    #[test]
    fn test_existing_raw_file_is_not_fetched() {
        let (dir, mut store, calls) = fixture_store();
        fs::write(dir.path().join("cache/allnum.cat"), ALLNUM).unwrap();
        store.load().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_existing_cache_skips_build() {
        let (dir, mut store, calls) = fixture_store();
        fs::write(
            dir.path().join("cache/allnum.csv"),
            "num,a,e,inc,Omega,omega,M,epoch\n42,1.5,0.1,0.2,0.3,0.4,0.5,59000.0\n",
        )
        .unwrap();
        let table = store.load().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.identifiers(), &["42".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("cache/allnum.cat").exists());
    }

    #[test]
    fn test_ensure_loaded_only_loads_once() {
        let (dir, mut store, _) = fixture_store();
        store.ensure_loaded().unwrap();
        fs::remove_file(dir.path().join("cache/allnum.csv")).unwrap();
        fs::remove_file(dir.path().join("cache/allnum.cat")).unwrap();
        assert_eq!(store.ensure_loaded().unwrap().len(), 10);
    }

    #[test]
    fn test_load_replaces_table() {
        let (dir, mut store, _) = fixture_store();
        store.load().unwrap();
        fs::write(
            dir.path().join("cache/allnum.csv"),
            "num,a,e,inc,Omega,omega,M,epoch\n1,2.7,0.1,0.2,0.3,0.4,0.5,59000.0\n",
        )
        .unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_build_does_not_touch_memory() {
        let (dir, store, _) = fixture_store();
        assert_eq!(store.build().unwrap(), 10);
        assert!(dir.path().join("cache/allnum.csv").exists());
        assert!(!store.is_loaded(OSCULATING));
    }

    #[test]
    fn test_download_failure() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("cache")).unwrap();
        let mut store = CatalogStore::builder()
            .with_root_dir(dir.path())
            .with_fetcher(FailingFetcher)
            .build()
            .unwrap();

        let err = store.load().unwrap_err();
        match &err {
            Error::Download { url, path, .. } => {
                assert!(url.ends_with("allnum.cat"));
                assert_eq!(path, &dir.path().join("cache/allnum.cat"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.to_string().contains("manually"));
        assert!(!dir.path().join("cache/allnum.csv").exists());
        assert!(!store.is_loaded(OSCULATING));
    }

    #[test]
    fn test_format_error_writes_no_cache() {
        let (dir, mut store, _) = fixture_store();
        fs::write(
            dir.path().join("cache/allnum.cat"),
            format!("{}'11' 59215.0 2.2\n", ALLNUM),
        )
        .unwrap();
        assert!(matches!(store.load(), Err(Error::Format(_))));
        assert!(!dir.path().join("cache/allnum.csv").exists());
    }

    #[test]
    fn test_rebuild_refetches() {
        let (dir, mut store, calls) = fixture_store();
        store.load().unwrap();
        fs::write(dir.path().join("cache/allnum.cat"), "stale").unwrap();
        let table = store.rebuild().unwrap();
        assert_eq!(table.len(), 10);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let raw = fs::read_to_string(dir.path().join("cache/allnum.cat")).unwrap();
        assert_eq!(raw, ALLNUM);
    }

    #[test]
    fn test_set_type_switches_and_loads() {
        let (_dir, mut store, _) = fixture_store();
        let table = store.set_type(SYNTHETIC).unwrap();
        assert!(table.has_column("sinI"));
        assert_eq!(store.current_type(), SYNTHETIC);
        assert!(store.is_loaded(SYNTHETIC));
        assert!(!store.is_loaded(OSCULATING));
    }

    #[test]
    fn test_set_type_unknown_keeps_current() {
        let (_dir, mut store, _) = fixture_store();
        let err = store.set_type("bogus").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("osculating, synthetic"));
        assert_eq!(store.current_type(), OSCULATING);
    }

    #[test]
    fn test_set_type_rereads_from_disk() {
        let (dir, mut store, _) = fixture_store();
        store.set_type(OSCULATING).unwrap();
        fs::write(
            dir.path().join("cache/allnum.csv"),
            "num,a,e,inc,Omega,omega,M,epoch\n1,2.7,0.1,0.2,0.3,0.4,0.5,59000.0\n",
        )
        .unwrap();
        store.set_type(SYNTHETIC).unwrap();
        assert_eq!(store.set_type(OSCULATING).unwrap().len(), 1);
    }

    #[test]
    fn test_register_descriptor_drops_stale_table() {
        let (_dir, mut store, _) = fixture_store();
        store.load().unwrap();
        let mut moved = CatalogDescriptor::osculating();
        moved.cached_filename = PathBuf::from("cache/allnum_v2.csv");
        let previous = store.register_descriptor(moved).unwrap();
        assert_eq!(previous, Some(CatalogDescriptor::osculating()));
        assert!(!store.is_loaded(OSCULATING));
        assert!(store
            .cache_path(OSCULATING)
            .unwrap()
            .ends_with("cache/allnum_v2.csv"));
    }

    #[test]
    fn test_register_invalid_descriptor() {
        let (_dir, mut store, _) = fixture_store();
        let mut broken = CatalogDescriptor::osculating();
        broken.column_names.clear();
        assert!(matches!(
            store.register_descriptor(broken),
            Err(Error::Config(_))
        ));
        assert_eq!(
            store.descriptor(OSCULATING),
            Some(&CatalogDescriptor::osculating())
        );
    }

    #[test]
    fn test_debug_lists_loaded_types() {
        let (_dir, mut store, _) = fixture_store();
        store.load().unwrap();
        let debug = format!("{:?}", store);
        assert!(debug.contains("loaded: [\"osculating\"]"));
    }
}
