//! Trendlens - Explore social media trends and the influencers behind them
//!
//! Trendlens reads a spreadsheet of social media videos, each tagged with a
//! macro-trend, a micro-trend, a channel and the influencer who posted it,
//! and turns it into two dashboard views.
//!
//! # Overview
//!
//! Selections narrow the data in a fixed order. Every stage only offers the
//! values that survived the stages before it, so picking a macro-trend
//! shrinks the micro-trend list, and so on down to a single influencer.
//!
//! 1. **Macro & Micro Trends**: engagement per macro-trend as a tree map,
//!    a card per macro-trend, and the top micro-trends by views.
//!
//! 2. **Microtrends & Influencers**: KPI totals, micro-trend frequency,
//!    social vs media power bubbles, and the top influencers by reach.
//!
//! # Quick Start
//!
//! ```no_run
//! use trendlens::filter::{Selection, Selections};
//! use trendlens::view::TrendOverview;
//! use trendlens::DashboardConfig;
//!
//! let config = DashboardConfig::default();
//! let table = trendlens::data::load("base.xlsx", &config.data)?;
//!
//! let selections = Selections {
//!     macro_trend: Selection::only(["Beauty"]),
//!     ..Selections::default()
//! };
//! let view = TrendOverview::build(&table, &selections, &config);
//!
//! for card in &view.macro_cards {
//!     println!("{}: {}", card.category, card.views_display);
//! }
//! # Ok::<(), trendlens::LoadError>(())
//! ```
//!
//! # Modules
//!
//! - [`data`]: loading and normalizing the dataset
//! - [`filter`]: the cascading selection stages
//! - [`aggregate`]: group-by summaries and rankings
//! - [`format`]: number and label formatting for display
//! - [`view`]: assembly of the two dashboard views
//! - [`report`]: output formatters (HTML, JSON)
//! - [`serve`]: the interactive browser session

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod format;
pub mod report;
pub mod serve;
pub mod view;

pub use config::DashboardConfig;
pub use data::{Category, DataStore, Metric, Record, Table};
pub use error::{ConfigError, LoadError};
pub use filter::{Cascade, Selection, Selections};
pub use view::{InfluencerView, TrendOverview};
