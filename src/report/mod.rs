//! Report generation for assembled dashboards
//!
//! - **HTML**: self-contained page with D3.js charts for both views
//! - **JSON**: the same payload the interactive server returns
//!
//! # Usage
//!
//! ```ignore
//! use trendlens::report;
//!
//! // Picks the format from the extension
//! report::generate("trends.html", &dashboard)?;
//! report::generate("trends.json", &dashboard)?;
//! ```

pub mod html;
pub mod json;

use crate::config::DashboardConfig;
use crate::data::Table;
use crate::filter::Selections;
use crate::view::{InfluencerView, TrendOverview};
use serde::Serialize;
use std::io;
use std::path::Path;

/// Write a report, HTML unless the extension says JSON
pub fn generate<P: AsRef<Path>>(path: P, dashboard: &Dashboard) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "json" => json::write(&mut file, dashboard),
        _ => html::write(&mut file, dashboard),
    }
}

/// Row counts of the loaded dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub source_rows: usize,
    pub rows: usize,
    pub dropped: usize,
}

impl DatasetSummary {
    pub fn from_table(table: &Table) -> Self {
        Self {
            source_rows: table.source_rows,
            rows: table.len(),
            dropped: table.dropped_rows(),
        }
    }
}

/// Both views for one set of selections
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub generated: String,
    pub source: String,
    pub dataset: DatasetSummary,
    pub selections: Selections,
    pub trends: TrendOverview,
    pub influencers: InfluencerView,
}

impl Dashboard {
    pub fn build(
        table: &Table,
        source: &str,
        selections: &Selections,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            generated: chrono::Local::now().to_rfc3339(),
            source: source.to_string(),
            dataset: DatasetSummary::from_table(table),
            selections: selections.clone(),
            trends: TrendOverview::build(table, selections, config),
            influencers: InfluencerView::build(table, selections, config),
        }
    }
}
