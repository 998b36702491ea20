//! Dataset loading
//!
//! A session reads its spreadsheet exactly once. [`load`] turns a workbook or
//! CSV file into a typed [`Table`]; [`DataStore`] memoizes that load so a
//! long-running session only rereads the file when it actually changed.
//!
//! # Normalization rules
//!
//! - The 8 numeric columns are coerced to non-negative numbers. Anything that
//!   can't be read (text, negatives, NaN) becomes 0 and is never an error.
//! - Rows without a macro-trend, or carrying the uncategorized label, are
//!   dropped before any filter runs.
//! - The two trend-description columns are optional; reports fall back to
//!   placeholder text when they are missing.

pub mod reader;
pub mod record;

pub use record::{Category, Cell, Metric, RawTable, Record, Table};

use crate::config::DataConfig;
use crate::error::LoadError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Read and normalize a dataset
pub fn load<P: AsRef<Path>>(path: P, config: &DataConfig) -> Result<Table, LoadError> {
    let path = path.as_ref();
    let raw = reader::read(path)?;
    let table = Table::from_raw(raw, config)?;

    tracing::info!(
        path = %path.display(),
        rows = table.source_rows,
        kept = table.len(),
        dropped = table.dropped_rows(),
        "dataset loaded"
    );
    if table.coerced_cells > 0 {
        tracing::debug!(cells = table.coerced_cells, "unreadable numeric cells set to 0");
    }

    Ok(table)
}

/// Identity of a source file as seen by the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl Fingerprint {
    fn of(path: &Path) -> Result<Self, LoadError> {
        let meta = std::fs::metadata(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound { path: path.to_path_buf() }
            } else {
                LoadError::Io { path: path.to_path_buf(), source }
            }
        })?;
        Ok(Self { len: meta.len(), modified: meta.modified().ok() })
    }
}

/// Memoized loader for one source file
pub struct DataStore {
    path: PathBuf,
    config: DataConfig,
    cached: Option<(Fingerprint, Arc<Table>)>,
}

impl DataStore {
    pub fn new<P: Into<PathBuf>>(path: P, config: DataConfig) -> Self {
        Self { path: path.into(), config, cached: None }
    }

    /// The session table, reloaded only when the file changed since last time
    pub fn load(&mut self) -> Result<Arc<Table>, LoadError> {
        let fingerprint = Fingerprint::of(&self.path)?;

        if let Some((cached_fp, table)) = &self.cached {
            if *cached_fp == fingerprint {
                return Ok(Arc::clone(table));
            }
            tracing::info!(path = %self.path.display(), "dataset changed on disk, reloading");
        }

        let table = Arc::new(load(&self.path, &self.config)?);
        self.cached = Some((fingerprint, Arc::clone(&table)));
        Ok(table)
    }
}
