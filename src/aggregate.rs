//! Grouped summaries over a filtered subset
//!
//! Groups are built in first-seen order and then stably sorted, so ties keep
//! the order in which categories appear in the data. Rows whose key is absent
//! don't belong to any group. Every function accepts an empty subset and
//! returns an empty (or zeroed) result.

use crate::data::{Category, Metric, Record};
use crate::format::percent_share;
use indexmap::IndexMap;
use serde::Serialize;

/// One description per category: the first non-empty one found in the rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryDescriptions {
    map: IndexMap<String, String>,
}

impl CategoryDescriptions {
    pub fn build(rows: &[&Record], key: Category) -> Self {
        let mut map = IndexMap::new();
        for r in rows {
            if let (Some(k), Some(desc)) = (key.value(r), key.description(r)) {
                map.entry(k.to_string()).or_insert_with(|| desc.to_string());
            }
        }
        Self { map }
    }

    pub fn get(&self, category: &str) -> Option<&str> {
        self.map.get(category).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Summed metric for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub value: f64,
    /// Percentage of the value summed over every category
    pub share: f64,
    pub description: Option<String>,
}

/// Row count and summed metric for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub count: usize,
    pub total: f64,
    /// Percentage of rows, over every category
    pub share: f64,
    pub description: Option<String>,
}

/// Per-influencer summary for the ranking list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRank {
    pub handle: String,
    pub videos: usize,
    pub audience: f64,
    pub engagement: f64,
    pub followers: f64,
    pub description: Option<String>,
    pub link: Option<String>,
}

/// Headline totals of a subset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub videos: usize,
    pub engagement: f64,
    pub followers: f64,
    pub likes: f64,
    pub shares: f64,
    pub comments: f64,
}

fn group_by<'a>(rows: &[&'a Record], key: Category) -> IndexMap<&'a str, Vec<&'a Record>> {
    let mut groups: IndexMap<&'a str, Vec<&'a Record>> = IndexMap::new();
    for &r in rows {
        if let Some(k) = key.value(r) {
            groups.entry(k).or_default().push(r);
        }
    }
    groups
}

fn first_present<'a>(rows: &[&'a Record], field: impl Fn(&'a Record) -> Option<&'a str>) -> Option<String> {
    rows.iter().find_map(|&r| field(r)).map(str::to_string)
}

/// Sum `metric` per category, largest first
pub fn sum_by(rows: &[&Record], key: Category, metric: Metric) -> Vec<CategoryTotal> {
    let groups = group_by(rows, key);
    let sums: Vec<f64> = groups
        .iter()
        .map(|(_, g)| g.iter().map(|r| metric.of(r)).sum())
        .collect();
    let grand_total: f64 = sums.iter().sum();

    let mut totals: Vec<CategoryTotal> = groups
        .iter()
        .zip(sums)
        .map(|((k, g), value)| CategoryTotal {
            category: k.to_string(),
            value,
            share: percent_share(value, grand_total),
            description: first_present(g, |r| key.description(r)),
        })
        .collect();

    totals.sort_by(|a, b| b.value.total_cmp(&a.value));
    totals
}

/// [`sum_by`] keeping only the `n` largest categories
pub fn top_n(rows: &[&Record], key: Category, metric: Metric, n: usize) -> Vec<CategoryTotal> {
    let mut totals = sum_by(rows, key, metric);
    totals.truncate(n);
    totals
}

/// Row count and `metric` sum per category, most frequent first, at most `n`.
///
/// Shares are computed over all categories before truncation.
pub fn count_and_sum_by(
    rows: &[&Record],
    key: Category,
    metric: Metric,
    n: usize,
) -> Vec<CategoryStats> {
    let groups = group_by(rows, key);
    let total_rows: usize = groups.iter().map(|(_, g)| g.len()).sum();

    let mut stats: Vec<CategoryStats> = groups
        .iter()
        .map(|(k, g)| CategoryStats {
            category: k.to_string(),
            count: g.len(),
            total: g.iter().map(|r| metric.of(r)).sum(),
            share: percent_share(g.len() as f64, total_rows as f64),
            description: first_present(g, |r| key.description(r)),
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats.truncate(n);
    stats
}

/// Influencers ranked by their largest follower count, at most `n`
pub fn rank_entities(rows: &[&Record], n: usize) -> Vec<EntityRank> {
    let mut ranking: Vec<EntityRank> = group_by(rows, Category::Handle)
        .iter()
        .map(|(handle, g)| EntityRank {
            handle: handle.to_string(),
            videos: g.len(),
            audience: g.iter().map(|r| r.audience_size).sum(),
            engagement: g.iter().map(|r| r.engagement).sum(),
            followers: g.iter().map(|r| r.followers).fold(0.0, f64::max),
            description: first_present(g, |r| r.description.as_deref()),
            link: first_present(g, |r| r.link.as_deref()),
        })
        .collect();

    ranking.sort_by(|a, b| b.followers.total_cmp(&a.followers));
    ranking.truncate(n);
    ranking
}

pub fn totals(rows: &[&Record]) -> Totals {
    rows.iter().fold(Totals::default(), |mut t, r| {
        t.videos += 1;
        t.engagement += r.engagement;
        t.followers += r.followers;
        t.likes += r.likes;
        t.shares += r.shares;
        t.comments += r.comments;
        t
    })
}

/// Number of distinct present values of `key`
pub fn distinct_count(rows: &[&Record], key: Category) -> usize {
    group_by(rows, key).len()
}

/// Largest value of `metric`, 0 for an empty subset
pub fn max_metric(rows: &[&Record], metric: Metric) -> f64 {
    rows.iter().map(|r| metric.of(r)).fold(0.0, f64::max)
}
