//! Typed record schema and the normalization applied once at load time

use crate::config::DataConfig;
use crate::error::LoadError;
use serde::Serialize;

pub const COL_MACRO: &str = "MacroTrends";
pub const COL_MICRO: &str = "MicroTrends";
pub const COL_CHANNEL: &str = "origem";
pub const COL_HANDLE: &str = "nickName";
pub const COL_VIDEO_ID: &str = "video_id";
pub const COL_ENGAGEMENT: &str = "engajamento";
pub const COL_FOLLOWERS: &str = "followers";
pub const COL_AUDIENCE: &str = "audienceSizes";
pub const COL_SOCIAL_POWER: &str = "socialPowers";
pub const COL_MEDIA_POWER: &str = "mediaPowers";
pub const COL_LIKES: &str = "likes";
pub const COL_SHARES: &str = "shares";
pub const COL_COMMENTS: &str = "comentarios";
pub const COL_DESCRIPTION: &str = "Desc";
pub const COL_LINK: &str = "link";
pub const COL_MACRO_DESCRIPTION: &str = "Descricao Macrotrends";
pub const COL_MICRO_DESCRIPTION: &str = "Descricao Microtrends";

pub const REQUIRED_COLUMNS: &[&str] = &[
    COL_MACRO,
    COL_MICRO,
    COL_CHANNEL,
    COL_HANDLE,
    COL_VIDEO_ID,
    COL_ENGAGEMENT,
    COL_FOLLOWERS,
    COL_AUDIENCE,
    COL_SOCIAL_POWER,
    COL_MEDIA_POWER,
    COL_LIKES,
    COL_SHARES,
    COL_COMMENTS,
    COL_DESCRIPTION,
    COL_LINK,
];

/// One cell as read from the source, before any typing
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Text content, `None` for blanks and the literal `nan` spreadsheets leave behind
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) if !n.is_finite() => None,
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Text(s) => {
                let s = s.trim();
                if s.is_empty() || s.eq_ignore_ascii_case("nan") {
                    None
                } else {
                    Some(s.to_string())
                }
            }
        }
    }

    /// Non-negative number, or `None` when the cell can't be read as one
    pub fn as_metric(&self) -> Option<f64> {
        let n = match self {
            Cell::Empty => return Some(0.0),
            Cell::Number(n) => *n,
            Cell::Text(s) if s.trim().is_empty() => return Some(0.0),
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (n.is_finite() && n >= 0.0).then_some(n)
    }
}

/// Header row plus data rows, format independent
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// One video/post observation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub macro_trend: String,
    pub micro_trend: Option<String>,
    pub channel: Option<String>,
    pub handle: Option<String>,
    pub video_id: Option<String>,
    pub engagement: f64,
    pub followers: f64,
    pub audience_size: f64,
    pub social_power: f64,
    pub media_power: f64,
    pub likes: f64,
    pub shares: f64,
    pub comments: f64,
    pub description: Option<String>,
    pub link: Option<String>,
    pub macro_description: Option<String>,
    pub micro_description: Option<String>,
}

/// Category columns that can be filtered and grouped on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Channel,
    MacroTrend,
    MicroTrend,
    Handle,
}

impl Category {
    pub fn value<'a>(&self, record: &'a Record) -> Option<&'a str> {
        match self {
            Category::Channel => record.channel.as_deref(),
            Category::MacroTrend => Some(record.macro_trend.as_str()),
            Category::MicroTrend => record.micro_trend.as_deref(),
            Category::Handle => record.handle.as_deref(),
        }
    }

    /// Per-row copy of the category's description, where the dataset has one
    pub fn description<'a>(&self, record: &'a Record) -> Option<&'a str> {
        match self {
            Category::MacroTrend => record.macro_description.as_deref(),
            Category::MicroTrend => record.micro_description.as_deref(),
            Category::Handle => record.description.as_deref(),
            Category::Channel => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Channel => "Channel",
            Category::MacroTrend => "MacroTrend",
            Category::MicroTrend => "MicroTrend",
            Category::Handle => "Influencer",
        }
    }
}

/// Numeric columns, all non-negative after load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Engagement,
    Followers,
    AudienceSize,
    SocialPower,
    MediaPower,
    Likes,
    Shares,
    Comments,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Engagement,
        Metric::Followers,
        Metric::AudienceSize,
        Metric::SocialPower,
        Metric::MediaPower,
        Metric::Likes,
        Metric::Shares,
        Metric::Comments,
    ];

    pub fn of(&self, record: &Record) -> f64 {
        match self {
            Metric::Engagement => record.engagement,
            Metric::Followers => record.followers,
            Metric::AudienceSize => record.audience_size,
            Metric::SocialPower => record.social_power,
            Metric::MediaPower => record.media_power,
            Metric::Likes => record.likes,
            Metric::Shares => record.shares,
            Metric::Comments => record.comments,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Metric::Engagement => COL_ENGAGEMENT,
            Metric::Followers => COL_FOLLOWERS,
            Metric::AudienceSize => COL_AUDIENCE,
            Metric::SocialPower => COL_SOCIAL_POWER,
            Metric::MediaPower => COL_MEDIA_POWER,
            Metric::Likes => COL_LIKES,
            Metric::Shares => COL_SHARES,
            Metric::Comments => COL_COMMENTS,
        }
    }

    fn slot<'r>(&self, record: &'r mut Record) -> &'r mut f64 {
        match self {
            Metric::Engagement => &mut record.engagement,
            Metric::Followers => &mut record.followers,
            Metric::AudienceSize => &mut record.audience_size,
            Metric::SocialPower => &mut record.social_power,
            Metric::MediaPower => &mut record.media_power,
            Metric::Likes => &mut record.likes,
            Metric::Shares => &mut record.shares,
            Metric::Comments => &mut record.comments,
        }
    }
}

/// The canonical, read-only dataset of a session
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub records: Vec<Record>,
    pub has_macro_descriptions: bool,
    pub has_micro_descriptions: bool,
    /// Rows in the source before uncategorized rows were dropped
    pub source_rows: usize,
    /// Numeric cells that could not be read and were set to 0
    pub coerced_cells: usize,
}

impl Table {
    /// Type and filter a raw table.
    ///
    /// Rows whose macro-trend is blank or equals the uncategorized label are
    /// dropped here, so no later stage ever sees them.
    pub fn from_raw(raw: RawTable, config: &DataConfig) -> Result<Self, LoadError> {
        if raw.headers.is_empty() {
            return Err(LoadError::EmptySheet);
        }

        let find = |name: &str| raw.headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| find(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns { missing });
        }

        // Every required column was found above
        let idx = |name: &str| find(name).unwrap_or(usize::MAX);
        let macro_desc_idx = find(COL_MACRO_DESCRIPTION);
        let micro_desc_idx = find(COL_MICRO_DESCRIPTION);
        let metric_idx: Vec<(Metric, usize)> =
            Metric::ALL.iter().map(|m| (*m, idx(m.column()))).collect();

        let mut table = Table {
            records: Vec::with_capacity(raw.rows.len()),
            has_macro_descriptions: macro_desc_idx.is_some(),
            has_micro_descriptions: micro_desc_idx.is_some(),
            source_rows: raw.rows.len(),
            coerced_cells: 0,
        };

        let sentinel = config.uncategorized_label.trim();

        for row in &raw.rows {
            let text = |i: Option<usize>| -> Option<String> {
                i.and_then(|i| row.get(i)).and_then(Cell::as_text)
            };

            let macro_trend = match text(Some(idx(COL_MACRO))) {
                Some(m) if m != sentinel => m,
                _ => continue,
            };

            let mut record = Record {
                macro_trend,
                micro_trend: text(Some(idx(COL_MICRO))),
                channel: text(Some(idx(COL_CHANNEL))),
                handle: text(Some(idx(COL_HANDLE))),
                video_id: text(Some(idx(COL_VIDEO_ID))),
                description: text(Some(idx(COL_DESCRIPTION))),
                link: text(Some(idx(COL_LINK))),
                macro_description: text(macro_desc_idx),
                micro_description: text(micro_desc_idx),
                ..Record::default()
            };

            for (metric, i) in &metric_idx {
                let value = match row.get(*i) {
                    Some(cell) => cell.as_metric(),
                    None => Some(0.0),
                };
                *metric.slot(&mut record) = value.unwrap_or_else(|| {
                    table.coerced_cells += 1;
                    0.0
                });
            }

            table.records.push(record);
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows dropped as uncategorized
    pub fn dropped_rows(&self) -> usize {
        self.source_rows.saturating_sub(self.records.len())
    }

    /// Every record, as the unfiltered subset the filter chain starts from
    pub fn rows(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // CELL COERCION TESTS
    // ==========================================================================
    //
    // Numeric columns never carry text or nulls past load: anything unreadable
    // becomes 0. Text columns treat blanks and spreadsheet "nan" as absent.
    // ==========================================================================

    #[test]
    fn test_metric_from_number_and_text() {
        assert_eq!(Cell::Number(12.5).as_metric(), Some(12.5));
        assert_eq!(Cell::Text(" 340 ".to_string()).as_metric(), Some(340.0));
        assert_eq!(Cell::Empty.as_metric(), Some(0.0));
        assert_eq!(Cell::Text("   ".to_string()).as_metric(), Some(0.0));
    }

    #[test]
    fn test_metric_rejects_garbage_and_negatives() {
        assert_eq!(Cell::Text("1,2k".to_string()).as_metric(), None);
        assert_eq!(Cell::Text("NaN".to_string()).as_metric(), None);
        assert_eq!(Cell::Text("inf".to_string()).as_metric(), None);
        assert_eq!(Cell::Number(-3.0).as_metric(), None);
    }

    #[test]
    fn test_text_normalization() {
        assert_eq!(Cell::Text("  Beauty ".to_string()).as_text(), Some("Beauty".to_string()));
        assert_eq!(Cell::Text("nan".to_string()).as_text(), None);
        assert_eq!(Cell::Text("".to_string()).as_text(), None);
        assert_eq!(Cell::Number(7301234.0).as_text(), Some("7301234".to_string()));
        assert_eq!(Cell::Number(1.5).as_text(), Some("1.5".to_string()));
        assert_eq!(Cell::Empty.as_text(), None);
    }

    // ==========================================================================
    // TABLE NORMALIZATION TESTS
    // ==========================================================================

    fn headers(extra: &[&str]) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .chain(extra.iter())
            .map(|s| s.to_string())
            .collect()
    }

    fn row(macro_trend: Cell, engagement: Cell) -> Vec<Cell> {
        REQUIRED_COLUMNS
            .iter()
            .map(|c| match *c {
                COL_MACRO => macro_trend.clone(),
                COL_ENGAGEMENT => engagement.clone(),
                COL_MICRO => Cell::Text("Micro".to_string()),
                COL_HANDLE => Cell::Text("@someone".to_string()),
                _ => Cell::Empty,
            })
            .collect()
    }

    #[test]
    fn test_uncategorized_and_blank_macro_rows_dropped() {
        let raw = RawTable {
            headers: headers(&[]),
            rows: vec![
                row(Cell::Text("Beauty".to_string()), Cell::Number(10.0)),
                row(Cell::Text(UNCATEGORIZED.to_string()), Cell::Number(99.0)),
                row(Cell::Empty, Cell::Number(99.0)),
                row(Cell::Text("nan".to_string()), Cell::Number(99.0)),
            ],
        };

        let table = Table::from_raw(raw, &DataConfig::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.source_rows, 4);
        assert_eq!(table.dropped_rows(), 3);
        assert_eq!(table.records[0].macro_trend, "Beauty");
        assert_eq!(table.records[0].engagement, 10.0);
    }

    const UNCATEGORIZED: &str = crate::config::UNCATEGORIZED_LABEL;

    #[test]
    fn test_bad_numbers_coerce_to_zero() {
        let raw = RawTable {
            headers: headers(&[]),
            rows: vec![
                row(Cell::Text("Tech".to_string()), Cell::Text("lots".to_string())),
                row(Cell::Text("Tech".to_string()), Cell::Number(-1.0)),
            ],
        };

        let table = Table::from_raw(raw, &DataConfig::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.records.iter().all(|r| r.engagement == 0.0));
        assert_eq!(table.coerced_cells, 2);
    }

    #[test]
    fn test_short_rows_default_to_absent() {
        let raw = RawTable {
            headers: headers(&[]),
            rows: vec![vec![Cell::Text("Food".to_string())]],
        };

        let table = Table::from_raw(raw, &DataConfig::default()).unwrap();
        let record = &table.records[0];
        assert_eq!(record.macro_trend, "Food");
        assert_eq!(record.micro_trend, None);
        assert_eq!(record.likes, 0.0);
        assert_eq!(table.coerced_cells, 0);
    }

    #[test]
    fn test_missing_required_columns_reported() {
        let raw = RawTable {
            headers: vec![COL_MACRO.to_string(), COL_MICRO.to_string()],
            rows: vec![],
        };

        match Table::from_raw(raw, &DataConfig::default()) {
            Err(LoadError::MissingColumns { missing }) => {
                assert!(missing.contains(&COL_ENGAGEMENT.to_string()));
                assert!(missing.contains(&COL_LINK.to_string()));
                assert!(!missing.contains(&COL_MACRO.to_string()));
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_header_is_error() {
        let result = Table::from_raw(RawTable::default(), &DataConfig::default());
        assert!(matches!(result, Err(LoadError::EmptySheet)));
    }

    #[test]
    fn test_optional_description_columns_detected() {
        let mut raw = RawTable {
            headers: headers(&[COL_MICRO_DESCRIPTION]),
            rows: vec![row(Cell::Text("Beauty".to_string()), Cell::Number(1.0))],
        };
        raw.rows[0].push(Cell::Text("Short-form skincare".to_string()));

        let table = Table::from_raw(raw, &DataConfig::default()).unwrap();
        assert!(!table.has_macro_descriptions);
        assert!(table.has_micro_descriptions);
        assert_eq!(
            table.records[0].micro_description.as_deref(),
            Some("Short-form skincare")
        );
    }

    #[test]
    fn test_dropped_rows_never_underflows() {
        let table = Table {
            records: vec![Record::default(), Record::default()],
            source_rows: 1,
            ..Table::default()
        };
        assert_eq!(table.dropped_rows(), 0);
    }

    #[test]
    fn test_custom_uncategorized_label() {
        let raw = RawTable {
            headers: headers(&[]),
            rows: vec![
                row(Cell::Text("Other".to_string()), Cell::Number(1.0)),
                row(Cell::Text(UNCATEGORIZED.to_string()), Cell::Number(1.0)),
            ],
        };
        let config = DataConfig { uncategorized_label: "Other".to_string() };

        let table = Table::from_raw(raw, &config).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].macro_trend, UNCATEGORIZED);
    }
}
