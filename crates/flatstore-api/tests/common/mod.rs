// Common test utilities for store integration tests

use flatstore::{Store, StoreConfig, SyncMode};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test fixture that opens a store catalog in a temporary directory
pub struct StoreFixture {
    #[allow(dead_code)]
    pub temp_dir: TempDir,
    #[allow(dead_code)]
    pub catalog_path: PathBuf,
    pub store: Store,
}

impl StoreFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let catalog_path = temp_dir.path().join("test.estore");
        let config = StoreConfig {
            sync_mode: SyncMode::None,
            ..Default::default()
        };
        let store = Store::open_with_config(&catalog_path, config).expect("Failed to open store");

        Self {
            temp_dir,
            catalog_path,
            store,
        }
    }

    #[allow(dead_code)]
    pub fn read(&self, file_name: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(file_name)).expect("Failed to read file")
    }

    #[allow(dead_code)]
    pub fn record_lines(&self, sub_store: &str) -> Vec<String> {
        self.read(&format!("{}.sbstore", sub_store))
            .lines()
            .skip_while(|line| *line != "#records")
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .map(String::from)
            .collect()
    }

    #[allow(dead_code)]
    pub fn list_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.temp_dir.path())
            .expect("Failed to read store directory")
            .filter_map(|entry| {
                entry
                    .ok()
                    .and_then(|e| e.file_name().to_str().map(String::from))
            })
            .collect();
        names.sort();
        names
    }
}

impl Default for StoreFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_catalog() {
        let fixture = StoreFixture::new();
        assert!(fixture.catalog_path.exists());
        assert!(fixture.store.list().unwrap().is_empty());
    }
}
