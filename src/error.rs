//! Error types for loading datasets and configuration
//!
//! Once a [`Table`](crate::data::Table) is loaded the pipeline cannot fail, so
//! these are the only library errors. Both are meant to be shown to the user
//! as-is: every variant renders a complete sentence.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("dataset not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable workbook {}: {reason}", path.display())]
    Workbook { path: PathBuf, reason: String },

    #[error("malformed CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("workbook {} has no worksheet", path.display())]
    NoWorksheet { path: PathBuf },

    #[error("dataset has no header row")]
    EmptySheet,

    #[error("missing required column(s): {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("unsupported dataset format \"{extension}\" (expected xlsx, xls, ods or csv)")]
    UnsupportedFormat { extension: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
