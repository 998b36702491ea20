//! Display formatting for aggregated values
//!
//! Every number shown on a card or tile goes through [`format_magnitude`], so
//! views, followers, likes, shares, comments and audience sums all read the
//! same way ("2.3M", "1.5K", "999").

use crate::config::BubbleScale;

pub const ELLIPSIS: &str = "...";

/// Abbreviate a non-negative number with a K/M suffix.
///
/// Below one thousand the value is shown as a truncated integer.
pub fn format_magnitude(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.1}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.1}K", n / 1_000.0)
    } else {
        format!("{}", n as i64)
    }
}

/// Engagement in millions, as appended to tree-map labels
pub fn format_millions(n: f64) -> String {
    format!("({:.1}MM)", n / 1_000_000.0)
}

/// Greedy word wrap with a per-line character budget.
///
/// Words are never split: a word longer than the budget gets a line of its
/// own. Lines are joined with `\n`.
pub fn wrap_label(text: &str, max_width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut width = 0;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if width + len + 1 <= max_width {
            current.push(word);
            width += len + 1;
        } else {
            if !current.is_empty() {
                lines.push(current.join(" "));
            }
            current = vec![word];
            width = len;
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }

    lines.join("\n")
}

/// Cut `text` to `max_len` characters, appending an ellipsis when cut
pub fn truncate_label(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Cut a card description to `max_len` characters, appending an ellipsis when cut.
///
/// Same rule as [`truncate_label`]; the ranking cards use a budget of 300.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    truncate_label(text, max_len)
}

/// `count` as a percentage of `total`, rounded to one decimal; 0 when `total` is 0.
///
/// Halves round to even, so 6.25% shows as 6.2 and 18.75% as 18.8.
pub fn percent_share(count: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    let percent = count / total * 100.0;
    (percent * 10.0).round_ties_even() / 10.0
}

/// Maximum bubble size for a chart showing `entities` distinct entities:
/// `base - step * entities`, clamped to `[min, max]`
pub fn dynamic_bubble_scale(entities: usize, scale: &BubbleScale) -> u32 {
    let shrink = (entities as u64).saturating_mul(scale.step as u64);
    let raw = (scale.base as u64).saturating_sub(shrink);
    raw.clamp(scale.min as u64, scale.max as u64) as u32
}

/// Marker diameter with area proportional to `value`; `max` maps to `size_max`
pub fn bubble_diameter(value: f64, max: f64, size_max: u32) -> f64 {
    if max <= 0.0 || value <= 0.0 {
        return 0.0;
    }
    size_max as f64 * (value / max).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // MAGNITUDE FORMATTING TESTS
    // ==========================================================================

    #[test]
    fn test_format_magnitude_thresholds() {
        assert_eq!(format_magnitude(999.0), "999");
        assert_eq!(format_magnitude(1500.0), "1.5K");
        assert_eq!(format_magnitude(2_300_000.0), "2.3M");
        assert_eq!(format_magnitude(1_000.0), "1.0K");
        assert_eq!(format_magnitude(1_000_000.0), "1.0M");
        assert_eq!(format_magnitude(0.0), "0");
    }

    #[test]
    fn test_format_magnitude_truncates_small_values() {
        assert_eq!(format_magnitude(999.9), "999");
        assert_eq!(format_magnitude(0.4), "0");
    }

    #[test]
    fn test_format_millions() {
        assert_eq!(format_millions(2_340_000.0), "(2.3MM)");
        assert_eq!(format_millions(0.0), "(0.0MM)");
    }

    // ==========================================================================
    // LABEL TESTS
    // ==========================================================================
    //
    // Tree-map labels wrap on word boundaries; bar-chart labels are hard cut.
    // The two rules are independent.
    // ==========================================================================

    #[test]
    fn test_wrap_label_greedy() {
        assert_eq!(
            wrap_label("Sustainable Fashion and Thrift Culture", 20),
            "Sustainable Fashion\nand Thrift Culture"
        );
    }

    #[test]
    fn test_wrap_label_never_splits_words() {
        let wrapped = wrap_label("Supercalifragilisticexpialidocious is long", 20);
        assert_eq!(wrapped, "Supercalifragilisticexpialidocious\nis long");
        for line in wrapped.lines() {
            assert!(!line.starts_with(' ') && !line.ends_with(' '));
        }
    }

    #[test]
    fn test_wrap_label_short_and_empty() {
        assert_eq!(wrap_label("Beauty", 20), "Beauty");
        assert_eq!(wrap_label("", 20), "");
        assert_eq!(wrap_label("   ", 20), "");
    }

    #[test]
    fn test_truncate_label() {
        let long = "a".repeat(45);
        assert_eq!(truncate_label(&long, 40), format!("{}...", "a".repeat(40)));
        assert_eq!(truncate_label("short", 40), "short");
        assert_eq!(truncate_label(&"b".repeat(40), 40), "b".repeat(40));
    }

    #[test]
    fn test_truncate_label_multibyte() {
        let text = "Decoração minimalista é tendência";
        assert_eq!(truncate_label(text, 8), "Decoraçã...");
    }

    #[test]
    fn test_truncate_text_card_budget() {
        let desc = "x".repeat(301);
        assert_eq!(truncate_text(&desc, 300).chars().count(), 303);
        assert_eq!(truncate_text(&"y".repeat(300), 300), "y".repeat(300));
        assert_eq!(truncate_text("brief", 300), "brief");
    }

    // ==========================================================================
    // SHARE & BUBBLE TESTS
    // ==========================================================================

    #[test]
    fn test_percent_share() {
        assert_eq!(percent_share(1.0, 3.0), 33.3);
        assert_eq!(percent_share(2.0, 3.0), 66.7);
        assert_eq!(percent_share(5.0, 5.0), 100.0);
        assert_eq!(percent_share(4.0, 0.0), 0.0);
    }

    #[test]
    fn test_percent_share_halves_round_to_even() {
        assert_eq!(percent_share(1.0, 16.0), 6.2);
        assert_eq!(percent_share(3.0, 16.0), 18.8);
        assert_eq!(percent_share(1.0, 8.0), 12.5);
    }

    #[test]
    fn test_percent_share_partition_sums_to_100() {
        let counts = [7.0, 3.0, 11.0, 1.0, 5.0];
        let total: f64 = counts.iter().sum();
        let sum: f64 = counts.iter().map(|c| percent_share(*c, total)).sum();
        assert!((sum - 100.0).abs() <= 0.05 * counts.len() as f64);
    }

    #[test]
    fn test_default_bubble_scale() {
        let scale = BubbleScale::default();
        assert_eq!(dynamic_bubble_scale(5, &scale), 80);
        assert_eq!(dynamic_bubble_scale(60, &scale), 50);
        assert_eq!(dynamic_bubble_scale(40, &scale), 70);
        assert_eq!(dynamic_bubble_scale(0, &scale), 80);
        assert_eq!(dynamic_bubble_scale(500, &scale), 50);
    }

    #[test]
    fn test_bubble_scale_never_increases_with_more_entities() {
        let scale = BubbleScale::default();
        let mut prev = dynamic_bubble_scale(0, &scale);
        for n in 1..100 {
            let next = dynamic_bubble_scale(n, &scale);
            assert!(next <= prev);
            prev = next;
        }
    }

    #[test]
    fn test_bubble_diameter() {
        assert_eq!(bubble_diameter(100.0, 100.0, 80), 80.0);
        assert_eq!(bubble_diameter(25.0, 100.0, 80), 40.0);
        assert_eq!(bubble_diameter(10.0, 0.0, 80), 0.0);
        assert_eq!(bubble_diameter(0.0, 10.0, 80), 0.0);
    }
}
