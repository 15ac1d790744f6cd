use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// ChannelRecord – one row of the channel metadata table
// ---------------------------------------------------------------------------

/// Static metadata for one channel. Serde renames follow the source TSV
/// headers; struct fields use the shorter internal names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelRecord {
    pub channel_id: String,
    #[serde(rename = "name_cc")]
    pub name: String,
    /// Category code. An empty cell in the source deserializes to `None`.
    #[serde(rename = "category_cc")]
    pub category: Option<String>,
    #[serde(rename = "subscribers_cc")]
    pub subscribers: u64,
    #[serde(rename = "videos_cc")]
    pub videos: u64,
}

// ---------------------------------------------------------------------------
// WeeklyObservation – one row of the time-series table
// ---------------------------------------------------------------------------

/// One weekly measurement of a channel. The raw `datetime` column is parsed
/// leniently: an unparseable value becomes `None` and the row is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyObservation {
    pub channel_id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub views: Option<f64>,
    pub subs: Option<f64>,
    pub delta_views: Option<f64>,
    pub delta_subs: Option<f64>,
}

/// Wire form of an observation row as it appears in the source files.
/// Converted to [`WeeklyObservation`] by the loader, which is where the
/// timestamp coercion happens.
#[derive(Debug, Clone, Deserialize)]
pub struct RawObservation {
    #[serde(rename = "channel")]
    pub channel_id: String,
    pub datetime: Option<String>,
    pub views: Option<f64>,
    pub subs: Option<f64>,
    pub delta_views: Option<f64>,
    pub delta_subs: Option<f64>,
}

impl RawObservation {
    pub fn into_observation(self) -> WeeklyObservation {
        WeeklyObservation {
            channel_id: self.channel_id,
            timestamp: self.datetime.as_deref().and_then(parse_timestamp),
            views: self.views,
            subs: self.subs,
            delta_views: self.delta_views,
            delta_subs: self.delta_subs,
        }
    }
}

/// Lenient timestamp parser. Accepts `2017-09-25 00:00:00` and bare
/// `2017-09-25`; anything else coerces to `None`.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// GrowthSummary / EnrichedChannel – derived rows
// ---------------------------------------------------------------------------

/// Per-channel mean of the weekly deltas. A mean is `None` when the channel
/// has zero non-null values for that metric.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthSummary {
    pub channel_id: String,
    pub avg_weekly_view_growth: Option<f64>,
    pub avg_weekly_sub_growth: Option<f64>,
}

/// A channel row augmented with its growth summary (inner join result).
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedChannel {
    pub channel_id: String,
    pub name: String,
    pub category: Option<String>,
    pub subscribers: u64,
    pub videos: u64,
    pub avg_weekly_view_growth: Option<f64>,
    pub avg_weekly_sub_growth: Option<f64>,
}

impl EnrichedChannel {
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or("<none>")
    }
}

// ---------------------------------------------------------------------------
// Metric – the numeric display columns
// ---------------------------------------------------------------------------

/// The numeric columns a projection can rank, average, or correlate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    ViewGrowth,
    SubGrowth,
    Subscribers,
    Videos,
}

impl Metric {
    /// All metrics, in the order the correlation view displays them.
    pub const ALL: [Metric; 4] = [
        Metric::ViewGrowth,
        Metric::SubGrowth,
        Metric::Subscribers,
        Metric::Videos,
    ];

    pub fn value(&self, row: &EnrichedChannel) -> Option<f64> {
        match self {
            Metric::ViewGrowth => row.avg_weekly_view_growth,
            Metric::SubGrowth => row.avg_weekly_sub_growth,
            Metric::Subscribers => Some(row.subscribers as f64),
            Metric::Videos => Some(row.videos as f64),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::ViewGrowth => "Avg Weekly View Growth",
            Metric::SubGrowth => "Avg Weekly Sub Growth",
            Metric::Subscribers => "Subscribers",
            Metric::Videos => "Videos",
        }
    }

    /// Short name used on the correlation heatmap axes.
    pub fn short_label(&self) -> &'static str {
        match self {
            Metric::ViewGrowth => "view growth",
            Metric::SubGrowth => "sub growth",
            Metric::Subscribers => "subscribers",
            Metric::Videos => "videos",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Tables – immutable snapshots for one load cycle
// ---------------------------------------------------------------------------

/// The channel metadata table.
#[derive(Debug, Clone, Default)]
pub struct ChannelTable {
    pub rows: Vec<ChannelRecord>,
}

impl ChannelTable {
    pub fn new(rows: Vec<ChannelRecord>) -> Self {
        ChannelTable { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The weekly time-series table.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    pub rows: Vec<WeeklyObservation>,
}

impl ObservationTable {
    pub fn new(rows: Vec<WeeklyObservation>) -> Self {
        ObservationTable { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Both tables of one load cycle. Read-only once constructed; concurrent
/// sessions share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub channels: ChannelTable,
    pub observations: ObservationTable,
}

impl Dataset {
    /// Sorted distinct non-null categories across the channel table.
    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .channels
            .rows
            .iter()
            .filter_map(|c| c.category.as_deref())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_parses_datetime_and_date() {
        assert!(parse_timestamp("2017-09-25 00:00:00").is_some());
        let d = parse_timestamp("2017-09-25").unwrap();
        assert_eq!(d.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn timestamp_coerces_garbage_to_none() {
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("25/09/2017"), None);
    }

    #[test]
    fn raw_observation_keeps_row_when_timestamp_is_bad() {
        let raw = RawObservation {
            channel_id: "UC1".into(),
            datetime: Some("garbage".into()),
            views: Some(10.0),
            subs: Some(5.0),
            delta_views: Some(1.0),
            delta_subs: Some(0.5),
        };
        let obs = raw.into_observation();
        assert_eq!(obs.timestamp, None);
        assert_eq!(obs.delta_views, Some(1.0));
    }

    #[test]
    fn categories_are_sorted_and_deduped() {
        let channel = |id: &str, cat: Option<&str>| ChannelRecord {
            channel_id: id.into(),
            name: id.to_uppercase(),
            category: cat.map(str::to_string),
            subscribers: 1,
            videos: 1,
        };
        let ds = Dataset {
            channels: ChannelTable::new(vec![
                channel("a", Some("Music")),
                channel("b", Some("Gaming")),
                channel("c", None),
                channel("d", Some("Music")),
            ]),
            observations: ObservationTable::default(),
        };
        assert_eq!(ds.categories(), vec!["Gaming".to_string(), "Music".to_string()]);
    }
}
