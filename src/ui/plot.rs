use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Ui, vec2};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{correlation_color, correlation_text_color};
use crate::data::model::Metric;
use crate::data::project;
use crate::state::{AppState, ChartView};

const VIEWS_COLOR: Color32 = Color32::from_rgb(0, 128, 128); // teal
const SUBS_COLOR: Color32 = Color32::from_rgb(230, 140, 25); // orange

// ---------------------------------------------------------------------------
// Central panel: view tabs + the active chart
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open the channel and observation tables  (File → Open…)");
        });
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        for view in ChartView::ALL {
            if ui.selectable_label(state.view == view, view.title()).clicked() {
                state.view = view;
            }
        }
    });
    ui.separator();

    match state.view {
        ChartView::Table => filtered_table(ui, state),
        ChartView::TopTen => top_ten_chart(ui, state),
        ChartView::Scatter => scatter_chart(ui, state),
        ChartView::TimeSeries => time_series_chart(ui, state),
        ChartView::Correlation => correlation_heatmap(ui, state),
        ChartView::CategoryMeans => category_means_chart(ui, state),
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "–".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Filtered channel table
// ---------------------------------------------------------------------------

fn filtered_table(ui: &mut Ui, state: &AppState) {
    let rows = project::sorted_desc(&state.filtered, Metric::ViewGrowth);
    if rows.is_empty() {
        ui.label("No channels match the current filters.");
        return;
    }

    use egui_extras::{Column, TableBuilder};
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .column(Column::remainder().at_least(180.0))
        .column(Column::auto().at_least(110.0))
        .column(Column::auto().at_least(140.0))
        .column(Column::auto().at_least(140.0))
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("Channel");
            });
            header.col(|ui| {
                ui.strong("Category");
            });
            header.col(|ui| {
                ui.strong("Avg Weekly View Growth");
            });
            header.col(|ui| {
                ui.strong("Avg Weekly Sub Growth");
            });
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let r = &rows[row.index()];
                row.col(|ui| {
                    ui.label(&r.name);
                });
                row.col(|ui| {
                    let color = state.category_colors.color_for(r.category.as_deref());
                    ui.label(egui::RichText::new(r.category_label()).color(color));
                });
                row.col(|ui| {
                    ui.label(fmt_opt(r.avg_weekly_view_growth));
                });
                row.col(|ui| {
                    ui.label(fmt_opt(r.avg_weekly_sub_growth));
                });
            });
        });
}

// ---------------------------------------------------------------------------
// Horizontal bar charts (top 10, category means)
// ---------------------------------------------------------------------------

/// Shared horizontal bar rendering: entry `i` draws at y = i, labelled via
/// the y-axis formatter.
fn horizontal_bars(ui: &mut Ui, id: &str, x_label: &str, entries: Vec<(String, f64, Color32)>) {
    if entries.is_empty() {
        ui.label("Nothing to chart.");
        return;
    }

    let labels: Vec<String> = entries.iter().map(|(name, _, _)| name.clone()).collect();
    let bars: Vec<Bar> = entries
        .iter()
        .enumerate()
        .map(|(i, (name, value, color))| {
            Bar::new(i as f64, *value)
                .name(name)
                .fill(*color)
                .width(0.6)
        })
        .collect();

    Plot::new(id.to_string())
        .x_axis_label(x_label)
        .y_axis_formatter(move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            let i = mark.value.round();
            if (mark.value - i).abs() < 0.25 && i >= 0.0 && (i as usize) < labels.len() {
                labels[i as usize].clone()
            } else {
                String::new()
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
        });
}

fn top_ten_chart(ui: &mut Ui, state: &AppState) {
    let top = project::top_n(&state.filtered, Metric::ViewGrowth, 10);
    // Reverse so the strongest grower sits at the top of the chart.
    let entries: Vec<(String, f64, Color32)> = top
        .iter()
        .rev()
        .map(|r| {
            (
                r.name.clone(),
                r.avg_weekly_view_growth.unwrap_or(0.0),
                state.category_colors.color_for(r.category.as_deref()),
            )
        })
        .collect();
    horizontal_bars(ui, "top_ten", Metric::ViewGrowth.label(), entries);
}

fn category_means_chart(ui: &mut Ui, state: &AppState) {
    // Category averages cover the full enriched set, not the filtered one.
    let means = project::category_means(&state.enriched, Metric::ViewGrowth);
    let entries: Vec<(String, f64, Color32)> = means
        .iter()
        .map(|m| {
            (
                m.category.clone(),
                m.mean,
                state.category_colors.color_for(Some(m.category.as_str())),
            )
        })
        .collect();
    horizontal_bars(
        ui,
        "category_means",
        Metric::ViewGrowth.label(),
        entries,
    );
}

// ---------------------------------------------------------------------------
// Scatter: view growth vs sub growth, colored by category, sized by videos
// ---------------------------------------------------------------------------

fn scatter_chart(ui: &mut Ui, state: &AppState) {
    let rows = &state.filtered;
    let (videos_lo, videos_hi) = state.bounds.videos;
    let span = (videos_hi.saturating_sub(videos_lo)).max(1) as f64;

    Plot::new("growth_scatter")
        .legend(Legend::default())
        .x_axis_label(Metric::ViewGrowth.label())
        .y_axis_label(Metric::SubGrowth.label())
        .show(ui, |plot_ui| {
            for row in rows {
                let (Some(x), Some(y)) = (row.avg_weekly_view_growth, row.avg_weekly_sub_growth)
                else {
                    continue;
                };
                let t = (row.videos.saturating_sub(videos_lo)) as f64 / span;
                let radius = 2.5 + 7.5 * t as f32;

                let points: PlotPoints = vec![[x, y]].into();
                plot_ui.points(
                    Points::new(points)
                        // legend groups elements by name, one entry per category
                        .name(row.category_label())
                        .color(state.category_colors.color_for(row.category.as_deref()))
                        .radius(radius),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Single-channel time series
// ---------------------------------------------------------------------------

fn time_series_chart(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    let Some(channel_id) = &state.selected_channel else {
        ui.label("Pick a channel in the sidebar to plot its weekly growth.");
        return;
    };

    let series = project::channel_time_series(&dataset.observations, channel_id);
    let channel_name = state
        .filtered
        .iter()
        .find(|r| &r.channel_id == channel_id)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| channel_id.clone());

    let mut views = Vec::new();
    let mut subs = Vec::new();
    for obs in &series {
        // Undated rows are kept by the projection but have no x coordinate.
        let Some(ts) = obs.timestamp else { continue };
        let x = ts.and_utc().timestamp() as f64;
        if let Some(v) = obs.views {
            views.push([x, v]);
        }
        if let Some(s) = obs.subs {
            subs.push([x, s]);
        }
    }

    ui.label(format!("Weekly views and subs for {channel_name}"));
    Plot::new("channel_time_series")
        .legend(Legend::default())
        .x_axis_label("Week")
        .y_axis_label("Count")
        .x_axis_formatter(|mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            chrono::DateTime::from_timestamp(mark.value as i64, 0)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(views))
                    .name("Views")
                    .color(VIEWS_COLOR)
                    .width(1.5),
            );
            plot_ui.line(
                Line::new(PlotPoints::from(subs))
                    .name("Subscribers")
                    .color(SUBS_COLOR)
                    .width(1.5),
            );
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

fn correlation_heatmap(ui: &mut Ui, state: &AppState) {
    // Correlations cover the full enriched set, unaffected by filters.
    let matrix = project::correlation_matrix(&state.enriched, &Metric::ALL);
    let n = matrix.len();
    if n == 0 || state.enriched.is_empty() {
        ui.label("Nothing to correlate.");
        return;
    }

    ui.label("Pearson correlation of growth metrics (all channels)");
    ui.add_space(8.0);

    let cell = 84.0_f32;
    let label_w = 110.0_f32;
    let label_h = 24.0_f32;
    let size = vec2(label_w + cell * n as f32, label_h + cell * n as f32);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min + vec2(label_w, label_h);

    for (j, metric) in matrix.metrics.iter().enumerate() {
        painter.text(
            origin + vec2(j as f32 * cell + cell / 2.0, -6.0),
            Align2::CENTER_BOTTOM,
            metric.short_label(),
            FontId::proportional(12.0),
            ui.visuals().text_color(),
        );
    }

    for (i, metric) in matrix.metrics.iter().enumerate() {
        painter.text(
            origin + vec2(-6.0, i as f32 * cell + cell / 2.0),
            Align2::RIGHT_CENTER,
            metric.short_label(),
            FontId::proportional(12.0),
            ui.visuals().text_color(),
        );

        for j in 0..n {
            let r = matrix.get(i, j);
            let rect = Rect::from_min_size(
                origin + vec2(j as f32 * cell, i as f32 * cell),
                vec2(cell - 2.0, cell - 2.0),
            );
            painter.rect_filled(rect, egui::CornerRadius::same(2), correlation_color(r));
            let label = if r.is_nan() {
                "n/a".to_string()
            } else {
                format!("{r:.2}")
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                label,
                FontId::proportional(13.0),
                correlation_text_color(r),
            );
        }
    }
}
