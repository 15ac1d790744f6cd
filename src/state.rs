use std::path::PathBuf;
use std::sync::Arc;

use crate::color::CategoryColors;
use crate::data::aggregate::{aggregate, join};
use crate::data::filter::{self, FilterCriteria};
use crate::data::loader::DatasetCache;
use crate::data::model::{Dataset, EnrichedChannel};

// ---------------------------------------------------------------------------
// Chart views
// ---------------------------------------------------------------------------

/// Which view occupies the central panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartView {
    Table,
    TopTen,
    Scatter,
    TimeSeries,
    Correlation,
    CategoryMeans,
}

impl ChartView {
    pub const ALL: [ChartView; 6] = [
        ChartView::Table,
        ChartView::TopTen,
        ChartView::Scatter,
        ChartView::TimeSeries,
        ChartView::Correlation,
        ChartView::CategoryMeans,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ChartView::Table => "Filtered Channels",
            ChartView::TopTen => "Top 10 by View Growth",
            ChartView::Scatter => "View vs Sub Growth",
            ChartView::TimeSeries => "Weekly Growth",
            ChartView::Correlation => "Correlation",
            ChartView::CategoryMeans => "Category Averages",
        }
    }
}

// ---------------------------------------------------------------------------
// Slider bounds derived from the loaded data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct CriteriaBounds {
    pub view_growth: (f64, f64),
    pub sub_growth: (f64, f64),
    pub videos: (u64, u64),
}

impl Default for CriteriaBounds {
    fn default() -> Self {
        CriteriaBounds {
            view_growth: (0.0, 0.0),
            sub_growth: (0.0, 0.0),
            videos: (0, 0),
        }
    }
}

impl CriteriaBounds {
    fn from_rows(rows: &[EnrichedChannel]) -> Self {
        let mut bounds = CriteriaBounds::default();
        let mut first_view = true;
        let mut first_sub = true;
        let mut first_videos = true;

        for row in rows {
            if let Some(v) = row.avg_weekly_view_growth {
                bounds.view_growth = widen(bounds.view_growth, v, &mut first_view);
            }
            if let Some(v) = row.avg_weekly_sub_growth {
                bounds.sub_growth = widen(bounds.sub_growth, v, &mut first_sub);
            }
            let videos = row.videos;
            if first_videos {
                bounds.videos = (videos, videos);
                first_videos = false;
            } else {
                bounds.videos = (bounds.videos.0.min(videos), bounds.videos.1.max(videos));
            }
        }
        bounds
    }
}

fn widen(range: (f64, f64), value: f64, first: &mut bool) -> (f64, f64) {
    if *first {
        *first = false;
        (value, value)
    } else {
        (range.0.min(value), range.1.max(value))
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. Everything downstream of the
/// cached dataset is recomputed from it; no stage keeps hidden state.
pub struct AppState {
    /// Session-owned load cache (explicit invalidation via Reload).
    pub cache: DatasetCache,
    pub channels_path: Option<PathBuf>,
    pub observations_path: Option<PathBuf>,

    /// Cached snapshot of the last successful load (None until then).
    pub dataset: Option<Arc<Dataset>>,

    /// aggregate + join output; recomputed once per load.
    pub enriched: Vec<EnrichedChannel>,

    /// Sorted category universe and the colours assigned to it.
    pub categories: Vec<String>,
    pub category_colors: CategoryColors,

    /// Data-derived slider bounds.
    pub bounds: CriteriaBounds,

    /// Live sidebar predicates.
    pub criteria: FilterCriteria,

    /// Rows passing the current criteria (cached filter output).
    pub filtered: Vec<EnrichedChannel>,

    /// Channel id shown in the time-series view.
    pub selected_channel: Option<String>,

    pub view: ChartView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a load is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            cache: DatasetCache::new(),
            channels_path: None,
            observations_path: None,
            dataset: None,
            enriched: Vec::new(),
            categories: Vec::new(),
            category_colors: CategoryColors::default(),
            bounds: CriteriaBounds::default(),
            criteria: FilterCriteria::default(),
            filtered: Vec::new(),
            selected_channel: None,
            view: ChartView::Table,
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Load (or re-use the cached) dataset once both source paths are known.
    pub fn try_load(&mut self) {
        let (Some(channels), Some(observations)) =
            (self.channels_path.clone(), self.observations_path.clone())
        else {
            return;
        };
        self.loading = true;
        match self.cache.load(&channels, &observations) {
            Ok(dataset) => {
                log::info!(
                    "dataset ready: {} channels / {} observations",
                    dataset.channels.len(),
                    dataset.observations.len()
                );
                self.ingest(dataset);
            }
            Err(e) => {
                log::error!("load failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.loading = false;
            }
        }
    }

    /// Drop the cached snapshot and read the sources again.
    pub fn reload(&mut self) {
        self.cache.invalidate();
        self.try_load();
    }

    /// Ingest a loaded dataset: run aggregate + join, derive the category
    /// universe and slider bounds, and reset the criteria to show everything.
    fn ingest(&mut self, dataset: Arc<Dataset>) {
        self.enriched = join(&dataset.channels, &aggregate(&dataset.observations));
        self.categories = dataset.categories();
        self.category_colors = CategoryColors::new(&self.categories);
        self.bounds = CriteriaBounds::from_rows(&self.enriched);

        self.criteria = FilterCriteria::all_pass(self.categories.iter().cloned());
        self.criteria.view_growth_min = self.bounds.view_growth.0;
        self.criteria.view_growth_max = self.bounds.view_growth.1;
        self.criteria.sub_growth_min = self.bounds.sub_growth.0;
        self.criteria.sub_growth_max = self.bounds.sub_growth.1;
        self.criteria.min_videos = self.bounds.videos.0;

        self.dataset = Some(dataset);
        self.status_message = None;
        self.loading = false;
        self.refilter();
    }

    /// Recompute the filtered set after any criteria change.
    pub fn refilter(&mut self) {
        self.filtered = filter::apply(&self.enriched, &self.criteria);

        // Keep the time-series selection valid for the new filtered set.
        let still_visible = self
            .selected_channel
            .as_ref()
            .is_some_and(|id| self.filtered.iter().any(|r| &r.channel_id == id));
        if !still_visible {
            self.selected_channel = self.filtered.first().map(|r| r.channel_id.clone());
        }
    }

    /// Toggle one category in the filter selection.
    pub fn toggle_category(&mut self, category: &str) {
        if !self.criteria.categories.remove(category) {
            self.criteria.categories.insert(category.to_string());
        }
        self.refilter();
    }

    /// Select every category.
    pub fn select_all_categories(&mut self) {
        self.criteria.categories = self.categories.iter().cloned().collect();
        self.refilter();
    }

    /// Deselect every category.
    pub fn select_no_categories(&mut self) {
        self.criteria.categories.clear();
        self.refilter();
    }
}
