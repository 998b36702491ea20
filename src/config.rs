//! Dashboard configuration
//!
//! Everything has a default, so a config file only needs the keys it changes:
//!
//! ```toml
//! log_level = "debug"
//!
//! [data]
//! uncategorized_label = "Outros/Sem Categoria"
//!
//! [limits]
//! top_micro_by_views = 15
//! top_micro_by_frequency = 10
//!
//! [bubble]
//! min = 50
//! max = 80
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Label used in the source data for rows that never got a macro-trend
pub const UNCATEGORIZED_LABEL: &str = "Outros/Sem Categoria";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_level: Option<String>,
    pub data: DataConfig,
    pub limits: Limits,
    pub bubble: BubbleScale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub uncategorized_label: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { uncategorized_label: UNCATEGORIZED_LABEL.to_string() }
    }
}

/// Sizes of ranked lists and label budgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub top_micro_by_views: usize,
    pub top_micro_by_frequency: usize,
    pub top_influencers: usize,
    pub treemap_wrap_width: usize,
    pub bar_label_len: usize,
    pub card_description_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            top_micro_by_views: 15,
            top_micro_by_frequency: 10,
            top_influencers: 10,
            treemap_wrap_width: 20,
            bar_label_len: 40,
            card_description_len: 300,
        }
    }
}

/// Bounds for the maximum bubble size of the scatter chart.
///
/// The bound shrinks by `step` for every entity on screen, starting from
/// `base`, and is clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleScale {
    pub min: u32,
    pub max: u32,
    pub base: u32,
    pub step: u32,
}

impl Default for BubbleScale {
    fn default() -> Self {
        Self { min: 50, max: 80, base: 150, step: 2 }
    }
}

impl DashboardConfig {
    /// Load config from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bubble.min > self.bubble.max {
            return Err(ConfigError::Invalid {
                field: "bubble.min",
                reason: format!("{} exceeds bubble.max ({})", self.bubble.min, self.bubble.max),
            });
        }
        if self.limits.treemap_wrap_width == 0 {
            return Err(ConfigError::Invalid {
                field: "limits.treemap_wrap_width",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.data.uncategorized_label.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "data.uncategorized_label",
                reason: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_dashboard_constants() {
        let config = DashboardConfig::default();
        assert_eq!(config.data.uncategorized_label, "Outros/Sem Categoria");
        assert_eq!(config.limits.top_micro_by_views, 15);
        assert_eq!(config.limits.top_micro_by_frequency, 10);
        assert_eq!(config.limits.top_influencers, 10);
        assert_eq!(config.bubble, BubbleScale { min: 50, max: 80, base: 150, step: 2 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"\n\n[limits]\ntop_influencers = 5").unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.limits.top_influencers, 5);
        assert_eq!(config.limits.top_micro_by_views, 15);
        assert_eq!(config.bubble.max, 80);
    }

    #[test]
    fn test_inverted_bubble_bounds_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bubble]\nmin = 90\nmax = 80").unwrap();

        let err = DashboardConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "bubble.min", .. }));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[limits\ntop_influencers = ").unwrap();

        let err = DashboardConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_without_path_is_default() {
        assert_eq!(DashboardConfig::load(None).unwrap(), DashboardConfig::default());
    }
}
