//! Dataset discovery and the modification-time keyed table cache.
//!
//! Datasets are files under a single data directory whose names end with a
//! fixed suffix. Each loaded table is cached under its file name together with
//! the file's modification time; a changed timestamp replaces the entry.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use crate::error::{DataError, Result};
use crate::table::Table;

struct CachedTable {
    modified: SystemTime,
    table: Arc<Table>,
}

/// Process-wide dataset cache. One entry per dataset name, replaced on change.
///
/// Two requests racing on a changed file may both parse it; either result is
/// a valid snapshot and the last writer wins.
pub struct DatasetCache {
    data_dir: PathBuf,
    suffix: String,
    entries: RwLock<HashMap<String, CachedTable>>,
}

impl DatasetCache {
    pub fn new(data_dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            suffix: suffix.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Names of all dataset files, sorted lexicographically.
    pub fn list(&self) -> Result<Vec<String>> {
        let dir = match fs::read_dir(&self.data_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in dir {
            let entry = entry?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(&self.suffix) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Load `name`, reusing the cached table while its mtime is unchanged.
    pub fn load(&self, name: &str) -> Result<Arc<Table>> {
        let path = self.resolve(name)?;
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|_| not_found(name))?;

        if let Some(hit) = self.cached(name, modified) {
            tracing::debug!(dataset = %name, "Dataset cache hit");
            return Ok(hit);
        }

        let file = fs::File::open(&path).map_err(|e| read_error(name, e))?;
        let table = Arc::new(Table::from_reader(file).map_err(|e| read_error(name, e))?);
        tracing::info!(
            dataset = %name,
            rows = table.len(),
            columns = table.columns().len(),
            "Dataset loaded"
        );

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(
            name.to_string(),
            CachedTable {
                modified,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    fn cached(&self, name: &str, modified: SystemTime) -> Option<Arc<Table>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(name)
            .filter(|entry| entry.modified == modified)
            .map(|entry| Arc::clone(&entry.table))
    }

    /// Map a dataset name to a file inside the data directory.
    fn resolve(&self, name: &str) -> Result<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && !name.contains("..")
            && !name.contains('/')
            && !name.contains('\\');
        if !plain {
            return Err(not_found(name));
        }

        let path = self.data_dir.join(name);
        if !path.is_file() {
            return Err(not_found(name));
        }
        Ok(path)
    }
}

fn not_found(name: &str) -> DataError {
    DataError::NotFound {
        dataset: name.to_string(),
    }
}

fn read_error(name: &str, err: impl std::fmt::Display) -> DataError {
    DataError::Read {
        dataset: name.to_string(),
        message: err.to_string(),
    }
}
