use std::collections::BTreeSet;

use super::model::EnrichedChannel;

// ---------------------------------------------------------------------------
// FilterCriteria: the user-chosen predicates
// ---------------------------------------------------------------------------

/// Conjunction of the sidebar predicates. All bounds are inclusive and
/// caller-supplied; an inverted range (min > max) is legal and simply matches
/// nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    /// Categories to keep. A row whose category is null never matches.
    pub categories: BTreeSet<String>,
    pub view_growth_min: f64,
    pub view_growth_max: f64,
    pub sub_growth_min: f64,
    pub sub_growth_max: f64,
    pub min_videos: u64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        FilterCriteria {
            categories: BTreeSet::new(),
            view_growth_min: f64::NEG_INFINITY,
            view_growth_max: f64::INFINITY,
            sub_growth_min: f64::NEG_INFINITY,
            sub_growth_max: f64::INFINITY,
            min_videos: 0,
        }
    }
}

impl FilterCriteria {
    /// The "show everything" state for a given category universe: every
    /// category selected, unbounded ranges, no video floor.
    pub fn all_pass(categories: impl IntoIterator<Item = String>) -> Self {
        FilterCriteria {
            categories: categories.into_iter().collect(),
            ..FilterCriteria::default()
        }
    }

    fn matches(&self, row: &EnrichedChannel) -> bool {
        let category_ok = match &row.category {
            Some(cat) => self.categories.contains(cat),
            None => false,
        };
        if !category_ok {
            return false;
        }

        let in_range = |value: Option<f64>, min: f64, max: f64| match value {
            Some(v) => min <= v && v <= max,
            None => false,
        };
        in_range(
            row.avg_weekly_view_growth,
            self.view_growth_min,
            self.view_growth_max,
        ) && in_range(
            row.avg_weekly_sub_growth,
            self.sub_growth_min,
            self.sub_growth_max,
        ) && row.videos >= self.min_videos
    }
}

// ---------------------------------------------------------------------------
// The filter pass
// ---------------------------------------------------------------------------

/// Keep the rows satisfying every predicate. Pure projection: the input is
/// untouched, rows are carried over unchanged, relative order is preserved,
/// and applying the same criteria twice changes nothing.
pub fn apply(rows: &[EnrichedChannel], criteria: &FilterCriteria) -> Vec<EnrichedChannel> {
    rows.iter()
        .filter(|row| criteria.matches(row))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        id: &str,
        category: Option<&str>,
        view_growth: Option<f64>,
        sub_growth: Option<f64>,
        videos: u64,
    ) -> EnrichedChannel {
        EnrichedChannel {
            channel_id: id.to_string(),
            name: format!("channel {id}"),
            category: category.map(str::to_string),
            subscribers: 1000,
            videos,
            avg_weekly_view_growth: view_growth,
            avg_weekly_sub_growth: sub_growth,
        }
    }

    fn music_criteria() -> FilterCriteria {
        FilterCriteria {
            categories: BTreeSet::from(["Music".to_string()]),
            view_growth_min: 0.0,
            view_growth_max: 500.0,
            sub_growth_min: f64::NEG_INFINITY,
            sub_growth_max: f64::INFINITY,
            min_videos: 5,
        }
    }

    #[test]
    fn retains_row_matching_all_predicates() {
        let rows = vec![row("A", Some("Music"), Some(200.0), Some(15.0), 10)];
        let kept = apply(&rows, &music_criteria());
        assert_eq!(kept, rows);
    }

    #[test]
    fn video_floor_is_inclusive_and_can_empty_the_result() {
        let rows = vec![row("A", Some("Music"), Some(200.0), Some(15.0), 10)];

        let mut c = music_criteria();
        c.min_videos = 10;
        assert_eq!(apply(&rows, &c).len(), 1);

        c.min_videos = 20;
        assert!(apply(&rows, &c).is_empty());
    }

    #[test]
    fn null_category_never_matches_the_selection() {
        let rows = vec![
            row("A", None, Some(100.0), Some(1.0), 50),
            row("B", Some("Music"), Some(100.0), Some(1.0), 50),
        ];
        let kept = apply(&rows, &music_criteria());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].channel_id, "B");
    }

    #[test]
    fn null_growth_never_falls_inside_a_range() {
        let rows = vec![row("A", Some("Music"), None, Some(1.0), 50)];
        assert!(apply(&rows, &music_criteria()).is_empty());
    }

    #[test]
    fn range_bounds_are_inclusive_on_both_ends() {
        let rows = vec![
            row("lo", Some("Music"), Some(0.0), Some(0.0), 5),
            row("hi", Some("Music"), Some(500.0), Some(0.0), 5),
            row("out", Some("Music"), Some(500.1), Some(0.0), 5),
        ];
        let kept = apply(&rows, &music_criteria());
        let ids: Vec<&str> = kept.iter().map(|r| r.channel_id.as_str()).collect();
        assert_eq!(ids, vec!["lo", "hi"]);
    }

    #[test]
    fn inverted_range_yields_empty_not_error() {
        let rows = vec![row("A", Some("Music"), Some(200.0), Some(15.0), 10)];
        let mut c = music_criteria();
        c.view_growth_min = 300.0;
        c.view_growth_max = 100.0;
        assert!(apply(&rows, &c).is_empty());
    }

    #[test]
    fn filtering_is_idempotent_and_order_preserving() {
        let rows = vec![
            row("A", Some("Music"), Some(10.0), Some(1.0), 10),
            row("B", Some("Gaming"), Some(20.0), Some(2.0), 10),
            row("C", Some("Music"), Some(30.0), Some(3.0), 10),
            row("D", Some("Music"), Some(40.0), Some(4.0), 1),
        ];
        let c = music_criteria();
        let once = apply(&rows, &c);
        let twice = apply(&once, &c);
        assert_eq!(once, twice);
        let ids: Vec<&str> = once.iter().map(|r| r.channel_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn all_pass_keeps_every_categorized_row() {
        let rows = vec![
            row("A", Some("Music"), Some(10.0), Some(1.0), 0),
            row("B", Some("Gaming"), Some(-1e12), Some(1e12), 0),
        ];
        let c = FilterCriteria::all_pass(["Music".to_string(), "Gaming".to_string()]);
        assert_eq!(apply(&rows, &c).len(), 2);
    }
}
