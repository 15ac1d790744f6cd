use std::collections::{BTreeMap, HashMap};

use super::model::{ChannelTable, EnrichedChannel, GrowthSummary, ObservationTable};

// ---------------------------------------------------------------------------
// Growth aggregation: per-channel mean of the weekly deltas
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MeanAccum {
    sum: f64,
    count: usize,
}

impl MeanAccum {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// `None` when no non-null values were seen. Not zero: a channel with no
    /// usable deltas has an unknown mean, not a flat one.
    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Group observations by channel and average the week-over-week deltas,
/// ignoring null values. Exactly one output row per distinct observed
/// channel, ordered by channel id. Timestamps play no part here; rows whose
/// timestamp failed to parse still contribute their deltas.
pub fn aggregate(observations: &ObservationTable) -> Vec<GrowthSummary> {
    let mut groups: BTreeMap<&str, (MeanAccum, MeanAccum)> = BTreeMap::new();

    for obs in &observations.rows {
        let (views, subs) = groups.entry(&obs.channel_id).or_default();
        views.push(obs.delta_views);
        subs.push(obs.delta_subs);
    }

    groups
        .into_iter()
        .map(|(channel_id, (views, subs))| GrowthSummary {
            channel_id: channel_id.to_string(),
            avg_weekly_view_growth: views.mean(),
            avg_weekly_sub_growth: subs.mean(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Join: channel metadata ⋈ growth summaries
// ---------------------------------------------------------------------------

/// Inner join on exact, case-sensitive channel id. Unmatched rows on either
/// side are dropped silently: a channel with no observations has nothing to
/// display, and a summary without metadata has no name to display it under.
/// Output preserves channel-table order.
pub fn join(channels: &ChannelTable, growth: &[GrowthSummary]) -> Vec<EnrichedChannel> {
    let by_id: HashMap<&str, &GrowthSummary> = growth
        .iter()
        .map(|g| (g.channel_id.as_str(), g))
        .collect();

    channels
        .rows
        .iter()
        .filter_map(|ch| {
            let g = by_id.get(ch.channel_id.as_str())?;
            Some(EnrichedChannel {
                channel_id: ch.channel_id.clone(),
                name: ch.name.clone(),
                category: ch.category.clone(),
                subscribers: ch.subscribers,
                videos: ch.videos,
                avg_weekly_view_growth: g.avg_weekly_view_growth,
                avg_weekly_sub_growth: g.avg_weekly_sub_growth,
            })
        })
        .collect()
}
