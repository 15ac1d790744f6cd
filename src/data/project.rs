use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::model::{EnrichedChannel, Metric, ObservationTable, WeeklyObservation};

// ---------------------------------------------------------------------------
// Read-only projections for the chart views. All of these are pure functions
// of their inputs and tolerate zero rows.
// ---------------------------------------------------------------------------

/// Descending sort then `Some(value)` before `None` and ties keep input
/// order (stable sort), so equal-valued channels render deterministically.
fn compare_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The `n` highest rows by `metric`. Rows with a null metric rank below
/// every numeric row.
pub fn top_n(rows: &[EnrichedChannel], metric: Metric, n: usize) -> Vec<EnrichedChannel> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| compare_desc(metric.value(a), metric.value(b)));
    sorted.truncate(n);
    sorted
}

/// All rows, best first. Backs the filtered-table view.
pub fn sorted_desc(rows: &[EnrichedChannel], metric: Metric) -> Vec<EnrichedChannel> {
    top_n(rows, metric, rows.len())
}

// ---------------------------------------------------------------------------
// Per-category means
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMean {
    pub category: String,
    pub mean: f64,
    pub count: usize,
}

/// Mean of `metric` per category, sorted ascending by mean. Rows with a null
/// category or a null metric are skipped; categories left with no numeric
/// rows are dropped.
pub fn category_means(rows: &[EnrichedChannel], metric: Metric) -> Vec<CategoryMean> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for row in rows {
        let (Some(category), Some(value)) = (row.category.as_deref(), metric.value(row)) else {
            continue;
        };
        let (sum, count) = groups.entry(category).or_default();
        *sum += value;
        *count += 1;
    }

    let mut means: Vec<CategoryMean> = groups
        .into_iter()
        .map(|(category, (sum, count))| CategoryMean {
            category: category.to_string(),
            mean: sum / count as f64,
            count,
        })
        .collect();
    means.sort_by(|a, b| a.mean.total_cmp(&b.mean));
    means
}

// ---------------------------------------------------------------------------
// Pairwise Pearson correlation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub metrics: Vec<Metric>,
    /// Row-major; `values[i][j]` is corr(metrics[i], metrics[j]).
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Pearson correlation over the rows where both metrics are non-null
/// (pairwise-complete, the pandas `DataFrame.corr` convention). NaN when a
/// column has zero variance or fewer than two complete pairs.
fn pearson(rows: &[EnrichedChannel], mx: Metric, my: Metric) -> f64 {
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((mx.value(r)?, my.value(r)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

pub fn correlation_matrix(rows: &[EnrichedChannel], metrics: &[Metric]) -> CorrelationMatrix {
    let values = metrics
        .iter()
        .map(|mx| metrics.iter().map(|my| pearson(rows, *mx, *my)).collect())
        .collect();
    CorrelationMatrix {
        metrics: metrics.to_vec(),
        values,
    }
}

// ---------------------------------------------------------------------------
// Single-channel time slice
// ---------------------------------------------------------------------------

/// All observations for one channel, oldest first. Rows whose timestamp
/// failed to parse are retained and sort last (stable); the chart layer
/// skips them since they have no x coordinate.
pub fn channel_time_series(
    observations: &ObservationTable,
    channel_id: &str,
) -> Vec<WeeklyObservation> {
    let mut rows: Vec<WeeklyObservation> = observations
        .rows
        .iter()
        .filter(|o| o.channel_id == channel_id)
        .cloned()
        .collect();
    rows.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::parse_timestamp;

    fn row(id: &str, category: Option<&str>, view_growth: Option<f64>) -> EnrichedChannel {
        EnrichedChannel {
            channel_id: id.to_string(),
            name: format!("channel {id}"),
            category: category.map(str::to_string),
            subscribers: 1000,
            videos: 10,
            avg_weekly_view_growth: view_growth,
            avg_weekly_sub_growth: view_growth.map(|v| v / 10.0),
        }
    }

    #[test]
    fn top_n_sorts_descending_and_truncates() {
        let rows = vec![
            row("A", Some("Music"), Some(100.0)),
            row("B", Some("Music"), Some(300.0)),
            row("C", Some("Music"), Some(200.0)),
        ];
        let top = top_n(&rows, Metric::ViewGrowth, 2);
        let ids: Vec<&str> = top.iter().map(|r| r.channel_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "C"]);

        // n larger than the input: everything, still sorted
        let all = top_n(&rows, Metric::ViewGrowth, 10);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].channel_id, "B");
    }

    #[test]
    fn top_n_is_stable_among_ties_and_ranks_null_last() {
        let rows = vec![
            row("first", Some("Music"), Some(100.0)),
            row("null", Some("Music"), None),
            row("second", Some("Music"), Some(100.0)),
            row("third", Some("Music"), Some(100.0)),
        ];
        let top = top_n(&rows, Metric::ViewGrowth, 4);
        let ids: Vec<&str> = top.iter().map(|r| r.channel_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third", "null"]);
    }

    #[test]
    fn top_n_of_empty_input_is_empty() {
        assert!(top_n(&[], Metric::ViewGrowth, 10).is_empty());
    }

    #[test]
    fn category_means_averages_and_sorts_ascending() {
        let rows = vec![
            row("A", Some("Music"), Some(100.0)),
            row("B", Some("Music"), Some(300.0)),
            row("C", Some("Gaming"), Some(50.0)),
            row("D", None, Some(1e9)),
            row("E", Some("News"), None),
        ];
        let means = category_means(&rows, Metric::ViewGrowth);
        assert_eq!(means.len(), 2);
        assert_eq!(means[0].category, "Gaming");
        assert!((means[0].mean - 50.0).abs() < 1e-9);
        assert_eq!(means[1].category, "Music");
        assert!((means[1].mean - 200.0).abs() < 1e-9);
        assert_eq!(means[1].count, 2);
    }

    #[test]
    fn correlation_of_proportional_columns_is_one() {
        let rows: Vec<EnrichedChannel> = (1..=5)
            .map(|i| row(&format!("c{i}"), Some("Music"), Some(i as f64 * 100.0)))
            .collect();
        // sub growth is view growth / 10, so the correlation is exactly 1
        let m = correlation_matrix(&rows, &[Metric::ViewGrowth, Metric::SubGrowth]);
        assert!((m.get(0, 1) - 1.0).abs() < 1e-9);
        assert!((m.get(0, 0) - 1.0).abs() < 1e-9);
        assert!((m.get(1, 0) - m.get(0, 1)).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_column_yields_nan() {
        let rows: Vec<EnrichedChannel> = (0..4)
            .map(|i| {
                let mut r = row(&format!("c{i}"), Some("Music"), Some(i as f64));
                r.videos = 7; // constant column
                r
            })
            .collect();
        let m = correlation_matrix(&rows, &[Metric::ViewGrowth, Metric::Videos]);
        assert!(m.get(0, 1).is_nan());
        assert!(m.get(1, 1).is_nan());
    }

    #[test]
    fn correlation_needs_at_least_two_complete_pairs() {
        let rows = vec![row("A", Some("Music"), Some(1.0)), row("B", Some("Music"), None)];
        let m = correlation_matrix(&rows, &[Metric::ViewGrowth, Metric::SubGrowth]);
        assert!(m.get(0, 1).is_nan());
    }

    fn obs(channel: &str, datetime: Option<&str>, views: f64) -> WeeklyObservation {
        WeeklyObservation {
            channel_id: channel.to_string(),
            timestamp: datetime.and_then(parse_timestamp),
            views: Some(views),
            subs: Some(views / 10.0),
            delta_views: None,
            delta_subs: None,
        }
    }

    #[test]
    fn time_series_selects_one_channel_in_timestamp_order() {
        let table = ObservationTable::new(vec![
            obs("A", Some("2017-10-02"), 2.0),
            obs("B", Some("2017-01-01"), 9.0),
            obs("A", Some("2017-09-25"), 1.0),
            obs("A", Some("2017-10-09"), 3.0),
        ]);
        let series = channel_time_series(&table, "A");
        let views: Vec<f64> = series.iter().filter_map(|o| o.views).collect();
        assert_eq!(views, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn unparseable_timestamps_are_retained_and_sort_last() {
        let table = ObservationTable::new(vec![
            obs("A", None, 9.0),
            obs("A", Some("2017-10-02"), 2.0),
            obs("A", None, 8.0),
            obs("A", Some("2017-09-25"), 1.0),
        ]);
        let series = channel_time_series(&table, "A");
        assert_eq!(series.len(), 4);
        let views: Vec<f64> = series.iter().filter_map(|o| o.views).collect();
        // dated rows ascending, then the two undated rows in input order
        assert_eq!(views, vec![1.0, 2.0, 9.0, 8.0]);
    }

    #[test]
    fn time_series_for_unknown_channel_is_empty() {
        let table = ObservationTable::new(vec![obs("A", Some("2017-09-25"), 1.0)]);
        assert!(channel_time_series(&table, "Z").is_empty());
    }
}
