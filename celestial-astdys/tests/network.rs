#![cfg(feature = "integration-tests")]

use celestial_astdys::{CatalogStore, SYNTHETIC};
use std::fs;
use tempfile::TempDir;

fn live_store() -> (TempDir, CatalogStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::create_dir(dir.path().join("cache")).expect("Failed to create cache dir");
    let store = CatalogStore::builder()
        .with_root_dir(dir.path())
        .build()
        .expect("Failed to build store");
    (dir, store)
}

#[test]
fn test_live_osculating_ceres() {
    let (_dir, mut store) = live_store();
    let ceres = store
        .search(1)
        .expect("Failed to download osculating catalog")
        .expect("Ceres missing from catalog");

    let a = ceres.get_f64("a").unwrap();
    assert!((2.7..2.8).contains(&a), "Ceres a = {}", a);
    assert!(store.catalog().unwrap().len() > 500_000);

    let epoch = store.catalog_datetime().unwrap();
    assert!(epoch.format("%Y").to_string().parse::<i32>().unwrap() >= 2020);
}

#[test]
fn test_live_synthetic_ceres() {
    let (_dir, mut store) = live_store();
    store
        .set_type(SYNTHETIC)
        .expect("Failed to download synthetic catalog");
    let ceres = store.search(1).unwrap().expect("Ceres missing from catalog");
    let a = ceres.get_f64("a").unwrap();
    assert!((2.7..2.8).contains(&a), "Ceres proper a = {}", a);
}
