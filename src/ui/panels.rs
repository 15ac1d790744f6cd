use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        ui.label("File → Open both tables to begin.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let categories = state.categories.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Category selection ----
            let n_selected = state.criteria.categories.len();
            let n_total = categories.len();
            let header_text = format!("Categories  ({n_selected}/{n_total})");

            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("categories")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_categories();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_categories();
                        }
                    });

                    for category in &categories {
                        let selected = state.criteria.categories.contains(category);
                        let color = state.category_colors.color_for(Some(category.as_str()));
                        let text = RichText::new(category).color(color);

                        let mut checked = selected;
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_category(category);
                        }
                    }
                });

            ui.separator();

            // ---- Growth ranges ----
            ui.strong("View growth range");
            let (view_lo, view_hi) = state.bounds.view_growth;
            ui.add(
                egui::Slider::new(&mut state.criteria.view_growth_min, view_lo..=view_hi)
                    .text("min"),
            );
            ui.add(
                egui::Slider::new(&mut state.criteria.view_growth_max, view_lo..=view_hi)
                    .text("max"),
            );

            ui.add_space(4.0);
            ui.strong("Subscriber growth range");
            let (sub_lo, sub_hi) = state.bounds.sub_growth;
            ui.add(
                egui::Slider::new(&mut state.criteria.sub_growth_min, sub_lo..=sub_hi)
                    .text("min"),
            );
            ui.add(
                egui::Slider::new(&mut state.criteria.sub_growth_max, sub_lo..=sub_hi)
                    .text("max"),
            );

            ui.add_space(4.0);
            ui.strong("Minimum video count");
            let (videos_lo, videos_hi) = state.bounds.videos;
            ui.add(egui::Slider::new(
                &mut state.criteria.min_videos,
                videos_lo..=videos_hi,
            ));

            ui.separator();

            // ---- Time-series channel picker ----
            ui.strong("Time-series channel");
            let current_name = state
                .filtered
                .iter()
                .find(|r| Some(&r.channel_id) == state.selected_channel.as_ref())
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "<none>".to_string());

            egui::ComboBox::from_id_salt("time_series_channel")
                .selected_text(current_name)
                .show_ui(ui, |ui: &mut Ui| {
                    let choices: Vec<(String, String)> = state
                        .filtered
                        .iter()
                        .map(|r| (r.channel_id.clone(), r.name.clone()))
                        .collect();
                    for (id, name) in choices {
                        let is_selected = state.selected_channel.as_deref() == Some(id.as_str());
                        if ui.selectable_label(is_selected, name).clicked() {
                            state.selected_channel = Some(id);
                        }
                    }
                });
        });

    // Recompute the filtered set after any widget changes.
    state.refilter();
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open channel table…").clicked() {
                pick_table(state, TableKind::Channels);
                ui.close_menu();
            }
            if ui.button("Open observation table…").clicked() {
                pick_table(state, TableKind::Observations);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} channels, {} observations, {} matching",
                ds.channels.len(),
                ds.observations.len(),
                state.filtered.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

enum TableKind {
    Channels,
    Observations,
}

fn pick_table(state: &mut AppState, kind: TableKind) {
    let title = match kind {
        TableKind::Channels => "Open channel table",
        TableKind::Observations => "Open observation table",
    };
    let file = rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Tables", &["tsv", "gz", "csv", "json", "parquet", "pq"])
        .add_filter("Gzipped TSV", &["gz"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match kind {
            TableKind::Channels => state.channels_path = Some(path),
            TableKind::Observations => state.observations_path = Some(path),
        }
        state.try_load();
    }
}
