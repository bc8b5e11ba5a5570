use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::model::Gender;
use crate::data::trend::TrendMeasure;
use crate::state::{AppState, Selection};

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left control panel and apply any change to the selection.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selection");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    let changed = ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| controls(ui, state))
        .inner;

    // Recompute the whole view once per change.
    if let Some(selection) = changed {
        log::debug!("selection changed: {selection:?}");
        state.apply(selection);
    }
}

/// Draw every control and return the new selection if one was changed.
fn controls(ui: &mut Ui, state: &AppState) -> Option<Selection> {
    let (Some(dataset), Some(view)) = (&state.dataset, &state.view) else {
        return None;
    };
    let current = &state.selection;
    let mut next = None;

    // ---- Mall ----
    ui.strong("Mall");
    let mall = view.mall.clone().unwrap_or_default();
    egui::ComboBox::from_id_salt("mall")
        .selected_text(&mall)
        .show_ui(ui, |ui: &mut Ui| {
            for m in &dataset.malls {
                if ui.selectable_label(mall == *m, m).clicked() && mall != *m {
                    next = Some(current.with_mall(m.clone()));
                }
            }
        });
    ui.add_space(6.0);

    // ---- Audience group ----
    ui.strong("Gender");
    egui::ComboBox::from_id_salt("gender")
        .selected_text(view.gender.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for g in Gender::ALL {
                if ui.selectable_label(view.gender == g, g.to_string()).clicked()
                    && view.gender != g
                {
                    next = Some(current.with_gender(g));
                }
            }
        });

    ui.strong("Age bin");
    let bin_text = view.age_bin.map(|b| b.to_string()).unwrap_or_default();
    egui::ComboBox::from_id_salt("age_bin")
        .selected_text(bin_text)
        .show_ui(ui, |ui: &mut Ui| {
            for bin in &view.age_bins {
                let selected = view.age_bin == Some(*bin);
                if ui.selectable_label(selected, bin.to_string()).clicked() && !selected {
                    next = Some(current.with_age_bin(*bin));
                }
            }
        });
    ui.separator();

    // ---- Trend ----
    ui.heading("Trend");

    if let Some((start, end)) = view.date_range {
        let (mut start_edit, mut end_edit) = (start, end);
        ui.horizontal(|ui: &mut Ui| {
            ui.label("From");
            ui.add(DatePickerButton::new(&mut start_edit).id_salt("trend_start"));
        });
        ui.horizontal(|ui: &mut Ui| {
            ui.label("To");
            ui.add(DatePickerButton::new(&mut end_edit).id_salt("trend_end"));
        });
        if (start_edit, end_edit) != (start, end) {
            next = Some(current.with_date_range(start_edit, end_edit));
        }
        if let Some((lo, hi)) = view.date_bounds {
            ui.small(format!("Purchases span {lo} – {hi}"));
            if ui.small_button("Reset range").clicked() {
                next = Some(current.with_date_range(lo, hi));
            }
        }
        ui.small("Choose a range covering at least two months.");
    }
    ui.add_space(6.0);

    ui.strong("Categories");
    for row in &view.category_rows {
        let mut checked = view.trend_categories.contains(&row.category);
        if ui.checkbox(&mut checked, &row.category).changed() {
            // Keep the chart's column order aligned with the category list.
            let categories = view
                .category_rows
                .iter()
                .map(|r| &r.category)
                .filter(|c| {
                    if *c == &row.category {
                        checked
                    } else {
                        view.trend_categories.contains(c)
                    }
                })
                .cloned()
                .collect();
            next = Some(current.with_categories(categories));
        }
    }
    ui.add_space(6.0);

    ui.strong("Which trend should be displayed?");
    let mut measure = view.measure;
    for m in [TrendMeasure::PurchaseCount, TrendMeasure::Profit] {
        ui.radio_value(&mut measure, m, m.label());
    }
    if measure != view.measure {
        next = Some(current.with_measure(measure));
    }

    next
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
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} transactions loaded across {} malls",
                ds.len(),
                ds.malls.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open transactions")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
