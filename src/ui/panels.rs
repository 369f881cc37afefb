use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use verification_void::data::loader::load_file;
use verification_void::data::model::{CategoricalField, NumericField};

use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – plot controls and filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    if state.dashboard.is_none() {
        ui.heading("Filters");
        ui.separator();
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if state.page == Page::Correlations {
                plot_controls(ui, state);
                ui.separator();
            }

            ui.heading("Data Filters");
            if ui.small_button("Reset all").clicked() {
                state.reset_filters();
            }
            ui.separator();

            categorical_filters(ui, state);
            ui.separator();
            numeric_filters(ui, state);
        });
}

fn plot_controls(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Plot Controls");

    let current_x = state
        .query
        .x_axis
        .parse::<NumericField>()
        .unwrap_or(state.config.default_x);
    let current_y = state
        .query
        .y_axis
        .parse::<NumericField>()
        .unwrap_or(state.config.default_y);

    let mut x = current_x;
    let mut y = current_y;
    ui.label("Select X-Axis:");
    axis_combo(ui, "x_axis", &mut x);
    ui.label("Select Y-Axis:");
    axis_combo(ui, "y_axis", &mut y);
    if (x, y) != (current_x, current_y) {
        state.set_axes(x, y);
    }

    ui.label("Color By:");
    let current_group = state
        .query
        .color_by
        .as_deref()
        .and_then(|name| name.parse::<CategoricalField>().ok());
    let mut group = current_group;
    egui::ComboBox::from_id_salt("color_by")
        .selected_text(current_group.map_or("None", CategoricalField::title))
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut group, None, "None");
            for field in CategoricalField::ALL {
                ui.selectable_value(&mut group, Some(field), field.title());
            }
        });
    if group != current_group {
        state.set_color_by(group);
    }
}

fn axis_combo(ui: &mut Ui, id: &str, field: &mut NumericField) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(field.title())
        .show_ui(ui, |ui: &mut Ui| {
            for candidate in NumericField::ALL {
                ui.selectable_value(field, candidate, candidate.title());
            }
        });
}

fn categorical_filters(ui: &mut Ui, state: &mut AppState) {
    // Clone what we need so we can mutate state inside the loop.
    let columns = state.options.categorical.clone();

    for (field, values) in &columns {
        let n_selected = values
            .iter()
            .filter(|v| state.is_selected(*field, v))
            .count();
        let header_text = if n_selected == 0 {
            format!("{}  (all)", field.title())
        } else {
            format!("{}  ({n_selected}/{})", field.title(), values.len())
        };

        egui::CollapsingHeader::new(RichText::new(header_text).strong())
            .id_salt(field.as_str())
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                if ui.small_button("Clear").clicked() {
                    state.clear_selection(*field);
                }
                for value in values {
                    let mut checked = state.is_selected(*field, value);
                    if ui.checkbox(&mut checked, value.as_str()).changed() {
                        state.toggle_selection(*field, value);
                    }
                }
            });
    }
}

fn numeric_filters(ui: &mut Ui, state: &mut AppState) {
    for field in NumericField::ALL {
        let (Some((min, max)), Some([lo, hi])) = (state.extent(field), state.range(field)) else {
            continue;
        };
        let filtered = state.query.ranges.contains_key(field.as_str());
        let speed = ((max - min) / 200.0).max(1.0);

        ui.horizontal(|ui: &mut Ui| {
            let title = RichText::new(field.title());
            ui.label(if filtered { title.color(Color32::LIGHT_BLUE) } else { title });
            if filtered && ui.small_button("Reset").clicked() {
                state.reset_range(field);
            }
        });

        let (mut new_lo, mut new_hi) = (lo, hi);
        ui.horizontal(|ui: &mut Ui| {
            ui.add(egui::DragValue::new(&mut new_lo).range(min..=max).speed(speed));
            ui.label("to");
            ui.add(egui::DragValue::new(&mut new_hi).range(min..=max).speed(speed));
        });
        if (new_lo, new_hi) != (lo, hi) {
            state.set_range(field, new_lo, new_hi);
        }
        ui.add_space(4.0);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.view.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export view…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for page in Page::ALL {
            if ui.selectable_label(state.page == page, page.name()).clicked() {
                state.page = page;
            }
        }

        ui.separator();

        if let Some(view) = &state.view {
            ui.label(format!(
                "{} videos loaded, {} match",
                view.total_rows, view.matched_rows
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open video dataset")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        open_path(state, &path);
    }
}

/// Load `path` into the dashboard, reporting failures in the status bar.
pub fn open_path(state: &mut AppState, path: &Path) {
    match load_file(path) {
        Ok(table) => state.set_table(table),
        Err(e) => {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn export_dialog(state: &mut AppState) {
    let Some(view) = &state.view else {
        return;
    };
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export derived data")
        .add_filter("JSON", &["json"])
        .set_file_name("dashboard.json")
        .save_file()
    else {
        return;
    };

    let result: Result<()> = serde_json::to_string_pretty(&view.to_json())
        .context("serializing view")
        .and_then(|text| {
            std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))
        });
    match result {
        Ok(()) => log::info!("Exported view to {}", path.display()),
        Err(e) => {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
