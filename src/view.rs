//! The two dashboard views, in the exact shapes the charts consume
//!
//! Each `build` runs the whole pipeline for one interaction: the view's
//! cascade filters the table, the aggregator summarizes the surviving rows,
//! and the results are reshaped here into chart rows. Horizontal bar charts
//! draw bottom-up, so their rows come out smallest first.

use crate::aggregate::{self, CategoryStats, CategoryTotal, EntityRank, Totals};
use crate::config::DashboardConfig;
use crate::data::{Category, Metric, Record, Table};
use crate::filter::{Cascade, Selections, StageState};
use crate::format::{
    bubble_diameter, dynamic_bubble_scale, format_magnitude, format_millions, truncate_label,
    truncate_text, wrap_label,
};
use serde::Serialize;

pub const TREND_OVERVIEW_TITLE: &str = "Macro & Micro Trends";
pub const INFLUENCERS_TITLE: &str = "Microtrends & Influencers";

pub const DESCRIPTION_UNAVAILABLE: &str = "Description not available";
pub const NO_DESCRIPTION: &str = "No description";
pub const NO_MICRO_TREND: &str = "(no micro-trend)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreemapRow {
    pub category: String,
    /// Wrapped category name with the engagement-in-millions suffix
    pub label: String,
    pub value: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCard {
    pub category: String,
    pub views: f64,
    pub views_display: String,
    pub description: String,
}

/// "Showing data for N macro-trends and M micro-trends"
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveAnalysis {
    pub macro_trends: usize,
    pub micro_trends: usize,
    pub videos: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarRow {
    pub category: String,
    pub value: f64,
    pub description: String,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub category: String,
    pub label: String,
    pub count: usize,
    pub engagement: f64,
    pub percent: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiTile {
    pub label: &'static str,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub handle: Option<String>,
    pub social_power: f64,
    pub media_power: f64,
    pub audience: f64,
    /// Marker diameter in pixels
    pub size: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPlot {
    pub size_max: u32,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingCard {
    pub rank: usize,
    pub handle: String,
    pub views: String,
    pub followers: String,
    pub audience: String,
    pub videos: usize,
    pub description: String,
    pub link: Option<String>,
}

/// "Macro & Micro Trends"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendOverview {
    pub title: &'static str,
    pub stages: Vec<StageState>,
    pub treemap: Vec<TreemapRow>,
    pub macro_cards: Vec<CategoryCard>,
    pub active: ActiveAnalysis,
    pub micro_bars: Vec<BarRow>,
}

/// "Microtrends & Influencers"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfluencerView {
    pub title: &'static str,
    pub stages: Vec<StageState>,
    pub kpis: Vec<KpiTile>,
    pub frequency: Vec<FrequencyRow>,
    pub scatter: ScatterPlot,
    pub ranking: Vec<RankingCard>,
}

impl TrendOverview {
    pub fn build(table: &Table, selections: &Selections, config: &DashboardConfig) -> Self {
        let filtered = Cascade::trend_overview().run(table, selections);
        let rows = &filtered.rows;
        let limits = &config.limits;

        let macro_totals = aggregate::sum_by(rows, Category::MacroTrend, Metric::Engagement);
        let micro_top = aggregate::top_n(
            rows,
            Category::MicroTrend,
            Metric::Engagement,
            limits.top_micro_by_views,
        );

        tracing::debug!(rows = rows.len(), macros = macro_totals.len(), "trend overview rebuilt");

        Self {
            title: TREND_OVERVIEW_TITLE,
            treemap: treemap_rows(&macro_totals, limits.treemap_wrap_width),
            macro_cards: macro_totals.iter().map(category_card).collect(),
            active: ActiveAnalysis {
                macro_trends: aggregate::distinct_count(rows, Category::MacroTrend),
                micro_trends: aggregate::distinct_count(rows, Category::MicroTrend),
                videos: rows.len(),
            },
            micro_bars: micro_top.iter().rev().map(bar_row).collect(),
            stages: filtered.stages,
        }
    }
}

impl InfluencerView {
    pub fn build(table: &Table, selections: &Selections, config: &DashboardConfig) -> Self {
        let filtered = Cascade::influencers().run(table, selections);
        let rows = &filtered.rows;
        let limits = &config.limits;

        let frequency = aggregate::count_and_sum_by(
            rows,
            Category::MicroTrend,
            Metric::Engagement,
            limits.top_micro_by_frequency,
        );
        let ranking = aggregate::rank_entities(rows, limits.top_influencers);
        let size_max =
            dynamic_bubble_scale(aggregate::distinct_count(rows, Category::Handle), &config.bubble);
        let max_audience = aggregate::max_metric(rows, Metric::AudienceSize);

        tracing::debug!(rows = rows.len(), influencers = ranking.len(), "influencer view rebuilt");

        Self {
            title: INFLUENCERS_TITLE,
            kpis: kpi_tiles(&aggregate::totals(rows)),
            frequency: frequency
                .iter()
                .rev()
                .map(|s| frequency_row(s, limits.bar_label_len))
                .collect(),
            scatter: ScatterPlot {
                size_max,
                points: rows.iter().map(|r| scatter_point(r, max_audience, size_max)).collect(),
            },
            ranking: ranking
                .iter()
                .enumerate()
                .map(|(i, e)| ranking_card(i + 1, e, limits.card_description_len))
                .collect(),
            stages: filtered.stages,
        }
    }
}

fn treemap_rows(totals: &[CategoryTotal], wrap_width: usize) -> Vec<TreemapRow> {
    totals
        .iter()
        .map(|t| TreemapRow {
            category: t.category.clone(),
            label: format!("{}\n{}", wrap_label(&t.category, wrap_width), format_millions(t.value)),
            value: t.value,
            description: t.description.clone(),
        })
        .collect()
}

fn category_card(total: &CategoryTotal) -> CategoryCard {
    CategoryCard {
        category: total.category.clone(),
        views: total.value,
        views_display: format_magnitude(total.value),
        description: total
            .description
            .clone()
            .unwrap_or_else(|| DESCRIPTION_UNAVAILABLE.to_string()),
    }
}

fn bar_row(total: &CategoryTotal) -> BarRow {
    BarRow {
        category: total.category.clone(),
        value: total.value,
        description: total
            .description
            .clone()
            .unwrap_or_else(|| DESCRIPTION_UNAVAILABLE.to_string()),
        percent: total.share,
    }
}

fn frequency_row(stats: &CategoryStats, label_len: usize) -> FrequencyRow {
    FrequencyRow {
        category: stats.category.clone(),
        label: truncate_label(&stats.category, label_len),
        count: stats.count,
        engagement: stats.total,
        percent: stats.share,
        description: stats
            .description
            .clone()
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
    }
}

fn kpi_tiles(totals: &Totals) -> Vec<KpiTile> {
    [
        ("Videos", totals.videos as f64),
        ("Views", totals.engagement),
        ("Followers", totals.followers),
        ("Likes", totals.likes),
        ("Shares", totals.shares),
        ("Comments", totals.comments),
    ]
    .into_iter()
    .map(|(label, value)| KpiTile { label, value, display: format_magnitude(value) })
    .collect()
}

fn scatter_point(record: &Record, max_audience: f64, size_max: u32) -> ScatterPoint {
    ScatterPoint {
        handle: record.handle.clone(),
        social_power: record.social_power,
        media_power: record.media_power,
        audience: record.audience_size,
        size: bubble_diameter(record.audience_size, max_audience, size_max),
        color: record
            .micro_trend
            .clone()
            .unwrap_or_else(|| NO_MICRO_TREND.to_string()),
    }
}

fn ranking_card(rank: usize, entity: &EntityRank, description_len: usize) -> RankingCard {
    RankingCard {
        rank,
        handle: entity.handle.clone(),
        views: format_magnitude(entity.engagement),
        followers: format_magnitude(entity.followers),
        audience: format_magnitude(entity.audience),
        videos: entity.videos,
        description: entity
            .description
            .as_deref()
            .map(|d| truncate_text(d, description_len))
            .unwrap_or_default(),
        link: entity.link.as_deref().filter(|l| is_web_link(l)).map(str::to_string),
    }
}

/// Only http(s) links become clickable
fn is_web_link(link: &str) -> bool {
    let lower = link.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Selection;

    fn rec(macro_trend: &str, micro: &str, handle: &str, engagement: f64) -> Record {
        Record {
            macro_trend: macro_trend.to_string(),
            micro_trend: Some(micro.to_string()),
            channel: Some("tiktok".to_string()),
            handle: Some(handle.to_string()),
            engagement,
            ..Record::default()
        }
    }

    fn table() -> Table {
        let records = vec![
            rec("A", "a1", "@x", 10.0),
            rec("A", "a2", "@y", 20.0),
            rec("A", "a1", "@x", 30.0),
            rec("B", "b1", "@z", 5.0),
            rec("B", "b1", "@w", 5.0),
        ];
        Table { source_rows: records.len(), records, ..Table::default() }
    }

    // ==========================================================================
    // TREND OVERVIEW TESTS
    // ==========================================================================

    #[test]
    fn test_overview_end_to_end() {
        let t = table();
        let view = TrendOverview::build(&t, &Selections::default(), &DashboardConfig::default());

        let treemap: Vec<(&str, f64)> =
            view.treemap.iter().map(|r| (r.category.as_str(), r.value)).collect();
        assert_eq!(treemap, vec![("A", 60.0), ("B", 10.0)]);
        assert_eq!(view.treemap[0].label, "A\n(0.0MM)");

        assert_eq!(view.macro_cards[0].views_display, "60");
        assert_eq!(view.macro_cards[1].description, DESCRIPTION_UNAVAILABLE);

        assert_eq!(view.active, ActiveAnalysis { macro_trends: 2, micro_trends: 3, videos: 5 });
    }

    #[test]
    fn test_micro_bars_ascending_for_horizontal_chart() {
        let t = table();
        let view = TrendOverview::build(&t, &Selections::default(), &DashboardConfig::default());

        let order: Vec<&str> = view.micro_bars.iter().map(|b| b.category.as_str()).collect();
        assert_eq!(order, vec!["b1", "a2", "a1"]);
        assert_eq!(view.micro_bars[2].value, 40.0);
        assert_eq!(view.micro_bars[2].percent, 57.1);
    }

    #[test]
    fn test_micro_bars_limited_to_configured_top() {
        let records: Vec<Record> =
            (0..20).map(|i| rec("A", &format!("m{}", i), "@x", i as f64)).collect();
        let t = Table { source_rows: records.len(), records, ..Table::default() };

        let view = TrendOverview::build(&t, &Selections::default(), &DashboardConfig::default());
        assert_eq!(view.micro_bars.len(), 15);
        assert_eq!(view.micro_bars.last().map(|b| b.category.as_str()), Some("m19"));
    }

    #[test]
    fn test_overview_with_empty_selection() {
        let t = table();
        let selections = Selections { macro_trend: Selection::Only(vec![]), ..Selections::default() };
        let view = TrendOverview::build(&t, &selections, &DashboardConfig::default());

        assert!(view.treemap.is_empty());
        assert!(view.macro_cards.is_empty());
        assert!(view.micro_bars.is_empty());
        assert_eq!(view.active.videos, 0);
    }

    // ==========================================================================
    // INFLUENCER VIEW TESTS
    // ==========================================================================

    #[test]
    fn test_kpi_tiles() {
        let mut t = table();
        t.records[0].likes = 1_500.0;
        t.records[1].followers = 2_300_000.0;
        let view = InfluencerView::build(&t, &Selections::default(), &DashboardConfig::default());

        let tiles: Vec<(&str, &str)> =
            view.kpis.iter().map(|k| (k.label, k.display.as_str())).collect();
        assert_eq!(
            tiles,
            vec![
                ("Videos", "5"),
                ("Views", "70"),
                ("Followers", "2.3M"),
                ("Likes", "1.5K"),
                ("Shares", "0"),
                ("Comments", "0"),
            ]
        );
    }

    #[test]
    fn test_frequency_rows() {
        let t = table();
        let view = InfluencerView::build(&t, &Selections::default(), &DashboardConfig::default());

        let last = view.frequency.last().unwrap();
        assert_eq!(last.category, "a1");
        assert_eq!(last.count, 2);
        assert_eq!(last.engagement, 40.0);
        assert_eq!(last.percent, 40.0);
        assert_eq!(last.description, NO_DESCRIPTION);
    }

    #[test]
    fn test_frequency_labels_truncated() {
        let long = "m".repeat(50);
        let records = vec![rec("A", &long, "@x", 1.0)];
        let t = Table { source_rows: 1, records, ..Table::default() };

        let view = InfluencerView::build(&t, &Selections::default(), &DashboardConfig::default());
        assert_eq!(view.frequency[0].label, format!("{}...", "m".repeat(40)));
        assert_eq!(view.frequency[0].category, long);
    }

    #[test]
    fn test_scatter_scaling() {
        let mut t = table();
        t.records[0].audience_size = 400.0;
        t.records[1].audience_size = 100.0;
        let view = InfluencerView::build(&t, &Selections::default(), &DashboardConfig::default());

        // 4 influencers -> 150 - 8 = 142, clamped to 80
        assert_eq!(view.scatter.size_max, 80);
        assert_eq!(view.scatter.points.len(), 5);
        assert_eq!(view.scatter.points[0].size, 80.0);
        assert_eq!(view.scatter.points[1].size, 40.0);
        assert_eq!(view.scatter.points[3].size, 0.0);
        assert_eq!(view.scatter.points[0].color, "a1");
    }

    #[test]
    fn test_ranking_cards() {
        let mut t = table();
        t.records[3].followers = 5_000.0;
        t.records[0].followers = 1_200_000.0;
        t.records[0].description = Some("d".repeat(320));
        t.records[0].link = Some("https://example.com/v/1".to_string());
        let view = InfluencerView::build(&t, &Selections::default(), &DashboardConfig::default());

        assert_eq!(view.ranking.len(), 4);
        let first = &view.ranking[0];
        assert_eq!(first.rank, 1);
        assert_eq!(first.handle, "@x");
        assert_eq!(first.followers, "1.2M");
        assert_eq!(first.videos, 2);
        assert_eq!(first.description.chars().count(), 303);
        assert_eq!(first.link.as_deref(), Some("https://example.com/v/1"));
        assert_eq!(view.ranking[1].handle, "@z");
    }

    #[test]
    fn test_ranking_links_limited_to_web_urls() {
        let mut t = table();
        t.records[0].followers = 1_200_000.0;
        t.records[0].link = Some("javascript:alert(1)".to_string());
        let view = InfluencerView::build(&t, &Selections::default(), &DashboardConfig::default());
        assert_eq!(view.ranking[0].handle, "@x");
        assert_eq!(view.ranking[0].link, None);

        assert!(is_web_link("HTTP://example.com/v/2"));
        assert!(!is_web_link("data:text/html,hi"));
    }

    #[test]
    fn test_single_influencer_selection() {
        let t = table();
        let selections = Selections { influencer: Some("@y".to_string()), ..Selections::default() };
        let view = InfluencerView::build(&t, &selections, &DashboardConfig::default());

        assert_eq!(view.kpis[0].display, "1");
        assert_eq!(view.ranking.len(), 1);
        assert_eq!(view.stages.last().unwrap().selected, vec!["@y"]);
    }

    #[test]
    fn test_influencer_view_empty() {
        let t = table();
        let selections = Selections { channel: Selection::only(["youtube"]), ..Selections::default() };
        let view = InfluencerView::build(&t, &selections, &DashboardConfig::default());

        assert!(view.frequency.is_empty());
        assert!(view.scatter.points.is_empty());
        assert!(view.ranking.is_empty());
        assert!(view.kpis.iter().all(|k| k.value == 0.0));
        assert_eq!(view.scatter.size_max, 80);
    }
}
