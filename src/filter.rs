//! Cascading filters
//!
//! A [`Cascade`] is an ordered list of [`Stage`]s. Each stage sees only the
//! rows left by the stages before it, so its option list shrinks as upstream
//! selections narrow the data:
//!
//! ```text
//! trend overview:  MacroTrend -> MicroTrend
//! influencers:     Channel -> MacroTrend -> MicroTrend -> Influencer
//! ```
//!
//! Stages are pure reducers from `(rows, selection)` to `(state, rows)`.
//! Nothing is remembered between runs: the same selections over the same
//! table always give the same result.

use crate::aggregate::CategoryDescriptions;
use crate::data::{Category, Record, Table};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Label of the first single-select option, meaning no pick
pub const ALL: &str = "All";

/// What the user picked at one stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Every available option (the default)
    #[default]
    All,
    /// Only these values, in the order they were picked
    Only(Vec<String>),
}

impl Selection {
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Only(values.into_iter().map(Into::into).collect())
    }
}

/// Selections for every stage of both cascades
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selections {
    pub channel: Selection,
    pub macro_trend: Selection,
    pub micro_trend: Selection,
    /// `None` means every influencer
    pub influencer: Option<String>,
}

impl Selections {
    pub fn for_category(&self, category: Category) -> Selection {
        match category {
            Category::Channel => self.channel.clone(),
            Category::MacroTrend => self.macro_trend.clone(),
            Category::MicroTrend => self.micro_trend.clone(),
            Category::Handle => match self.influencer.as_deref() {
                None => Selection::All,
                Some(handle) => Selection::only([handle]),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    MultiSelect,
    /// One value or no pick; options are listed alphabetically after `All`
    SingleSelect,
}

/// A category description shown because its category was picked explicitly
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfacedDescription {
    pub category: String,
    pub description: String,
}

/// Widget state of one stage after a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageState {
    pub category: Category,
    pub label: &'static str,
    pub kind: StageKind,
    pub options: Vec<String>,
    pub selected: Vec<String>,
    pub surfaced: Vec<SurfacedDescription>,
    pub rows_in: usize,
    pub rows_out: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub category: Category,
    pub kind: StageKind,
}

impl Stage {
    pub fn multi(category: Category) -> Self {
        Self { category, kind: StageKind::MultiSelect }
    }

    pub fn single(category: Category) -> Self {
        Self { category, kind: StageKind::SingleSelect }
    }

    /// Distinct values present in `rows`.
    ///
    /// Multi-select stages list them in first-seen order; single-select
    /// stages sort them. The `All` sentinel is not included.
    pub fn options(&self, rows: &[&Record]) -> Vec<String> {
        let distinct: IndexSet<&str> = rows.iter().filter_map(|r| self.category.value(r)).collect();
        let mut options: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        if self.kind == StageKind::SingleSelect {
            options.sort();
        }
        options
    }

    /// Filter `rows` by `selection`, reporting the stage's widget state
    pub fn apply<'a>(&self, rows: &[&'a Record], selection: &Selection) -> (StageState, Vec<&'a Record>) {
        let options = self.options(rows);

        let picked: Option<Vec<String>> = match selection {
            Selection::All => None,
            Selection::Only(values) => {
                let available: HashSet<&str> = options.iter().map(String::as_str).collect();
                let valid: IndexSet<&str> = values
                    .iter()
                    .map(String::as_str)
                    .filter(|v| available.contains(v))
                    .collect();
                let valid: Vec<String> = valid.into_iter().map(str::to_string).collect();
                if valid.len() < values.len() {
                    tracing::warn!(
                        stage = self.category.label(),
                        ignored = values.len() - valid.len(),
                        "selection contains values that are not available options"
                    );
                }
                match self.kind {
                    // An unavailable influencer falls back to no pick
                    StageKind::SingleSelect if valid.is_empty() => None,
                    _ => Some(valid),
                }
            }
        };

        let (out, selected, surfaced) = match picked {
            None => {
                // A single-select stage with no pick shows its leading `All`
                let selected = match self.kind {
                    StageKind::MultiSelect => options.clone(),
                    StageKind::SingleSelect => Vec::new(),
                };
                (rows.to_vec(), selected, Vec::new())
            }
            Some(picked) => {
                let keep: HashSet<&str> = picked.iter().map(String::as_str).collect();
                let out: Vec<&'a Record> = rows
                    .iter()
                    .copied()
                    .filter(|r| self.category.value(r).is_some_and(|v| keep.contains(v)))
                    .collect();
                let surfaced = self.surface(rows, &picked, options.len());
                (out, picked, surfaced)
            }
        };

        let mut shown_options = options;
        if self.kind == StageKind::SingleSelect {
            shown_options.insert(0, ALL.to_string());
        }

        let state = StageState {
            category: self.category,
            label: self.category.label(),
            kind: self.kind,
            options: shown_options,
            selected,
            surfaced,
            rows_in: rows.len(),
            rows_out: out.len(),
        };
        (state, out)
    }

    /// Descriptions of explicitly picked categories.
    ///
    /// Only non-exhaustive multi-select picks surface anything; picking
    /// everything would just repeat every description.
    fn surface(&self, rows: &[&Record], picked: &[String], available: usize) -> Vec<SurfacedDescription> {
        if self.kind != StageKind::MultiSelect || picked.is_empty() || picked.len() >= available {
            return Vec::new();
        }
        let descriptions = CategoryDescriptions::build(rows, self.category);
        picked
            .iter()
            .filter_map(|c| {
                descriptions.get(c).map(|d| SurfacedDescription {
                    category: c.clone(),
                    description: d.to_string(),
                })
            })
            .collect()
    }
}

/// Result of running a cascade: every stage's state plus the final subset
#[derive(Debug, Clone)]
pub struct Filtered<'a> {
    pub stages: Vec<StageState>,
    pub rows: Vec<&'a Record>,
}

impl Filtered<'_> {
    pub fn stage(&self, category: Category) -> Option<&StageState> {
        self.stages.iter().find(|s| s.category == category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cascade {
    stages: Vec<Stage>,
}

impl Cascade {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// MacroTrend -> MicroTrend
    pub fn trend_overview() -> Self {
        Self::new(vec![Stage::multi(Category::MacroTrend), Stage::multi(Category::MicroTrend)])
    }

    /// Channel -> MacroTrend -> MicroTrend -> Influencer
    pub fn influencers() -> Self {
        Self::new(vec![
            Stage::multi(Category::Channel),
            Stage::multi(Category::MacroTrend),
            Stage::multi(Category::MicroTrend),
            Stage::single(Category::Handle),
        ])
    }

    pub fn run<'a>(&self, table: &'a Table, selections: &Selections) -> Filtered<'a> {
        self.run_rows(table.rows(), selections)
    }

    pub fn run_rows<'a>(&self, rows: Vec<&'a Record>, selections: &Selections) -> Filtered<'a> {
        let mut rows = rows;
        let mut states = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let (state, out) = stage.apply(&rows, &selections.for_category(stage.category));
            states.push(state);
            rows = out;
        }

        Filtered { stages: states, rows }
    }
}
