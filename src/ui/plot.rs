use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, LineStyle, Plot, PlotPoints, VLine};

use crate::color::{gender_color, gender_light_color, CategoryColors};
use crate::data::model::Gender;
use crate::data::trend::MonthYear;
use crate::state::{AppState, DashboardView, TrendView};

const CHART_HEIGHT: f32 = 260.0;
const BAR_WIDTH: f64 = 0.4;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the three dashboard sections in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let view = match &state.view {
        Some(view) => view,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a transactions file to begin  (File → Open…)");
            });
            return;
        }
    };

    audience_section(ui, view);
    ui.separator();
    category_section(ui, view);
    ui.separator();
    trend_section(ui, view, &state.category_colors);
}

/// Axis formatter that prints `labels[i]` at integer positions only.
fn label_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Audience: count per gender × age bin
// ---------------------------------------------------------------------------

fn audience_section(ui: &mut Ui, view: &DashboardView) {
    let mall = view.mall.as_deref().unwrap_or("");
    ui.heading(format!("What is the largest audience group in '{mall}'?"));
    ui.small(format!("{} purchases recorded in this mall", view.mall_size));

    let labels: Vec<String> = view.age_bins.iter().map(|b| b.to_string()).collect();
    Plot::new("audience_plot")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Age Bins")
        .y_axis_label("Count")
        .x_axis_formatter(label_formatter(labels))
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            for (offset, gender) in [(-0.2, Gender::Male), (0.2, Gender::Female)] {
                let bars: Vec<Bar> = view
                    .age_bins
                    .iter()
                    .enumerate()
                    .map(|(i, bin)| {
                        let count = view
                            .group_counts
                            .iter()
                            .find(|g| g.gender == gender && g.bin == *bin)
                            .map_or(0, |g| g.count);
                        Bar::new(i as f64 + offset, count as f64)
                            .width(BAR_WIDTH)
                            .name(bin.to_string())
                    })
                    .collect();
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(gender.to_string())
                        .color(gender_color(gender)),
                );
            }
        });

    match &view.largest_group {
        Some(g) => ui.label(format!(
            "The largest audience group is {} of age {}. The group size is {}.",
            g.gender, g.bin, g.count
        )),
        None => ui.label("No purchases recorded for this mall."),
    };
    ui.label(format!(
        "The chosen group is of size: {} ({} items bought)",
        view.group_size, view.group_units
    ));
}

// ---------------------------------------------------------------------------
// Categories: purchases and profit for the chosen group
// ---------------------------------------------------------------------------

fn category_section(ui: &mut Ui, view: &DashboardView) {
    let mall = view.mall.as_deref().unwrap_or("");
    let bin = view.age_bin.map(|b| b.to_string()).unwrap_or_default();
    ui.heading(format!(
        "What are the favorite category and the most profitable one for {}s of age {bin} in '{mall}'?",
        view.gender
    ));

    let labels: Vec<String> = view
        .category_rows
        .iter()
        .map(|r| r.category.clone())
        .collect();
    Plot::new("category_plot")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Category")
        .y_axis_label("Frequency / Profit (k)")
        .x_axis_formatter(label_formatter(labels))
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            let purchases: Vec<Bar> = view
                .category_rows
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    Bar::new(i as f64 - 0.2, r.purchase_count as f64)
                        .width(BAR_WIDTH)
                        .name(&r.category)
                })
                .collect();
            let profit: Vec<Bar> = view
                .category_rows
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    Bar::new(i as f64 + 0.2, r.total_profit)
                        .width(BAR_WIDTH)
                        .name(&r.category)
                })
                .collect();

            plot_ui.bar_chart(
                BarChart::new(purchases)
                    .name("# purchases")
                    .color(gender_color(view.gender)),
            );
            plot_ui.bar_chart(
                BarChart::new(profit)
                    .name("Total profit (k$)")
                    .color(gender_light_color(view.gender)),
            );
        });

    let rank_len = view.top_by_count.len().max(view.top_by_profit.len());
    for i in 0..rank_len {
        let visited = view.top_by_count.get(i).map_or("–", String::as_str);
        let profitable = view.top_by_profit.get(i).map_or("–", String::as_str);
        ui.horizontal(|ui: &mut Ui| {
            ui.label(RichText::new(format!("{}) Top visited category:", i + 1)).strong());
            ui.label(visited);
            ui.label(RichText::new("Most profitable:").strong());
            ui.label(profitable);
        });
    }
}

// ---------------------------------------------------------------------------
// Trend: month × category lines with calendar gridlines
// ---------------------------------------------------------------------------

fn trend_section(ui: &mut Ui, view: &DashboardView, colors: &CategoryColors) {
    let mall = view.mall.as_deref().unwrap_or("");
    let bin = view.age_bin.map(|b| b.to_string()).unwrap_or_default();
    ui.heading(format!(
        "Trendlines over time per category for {}s of age {bin} in '{mall}'",
        view.gender
    ));

    if let Some(msg) = &view.validation {
        ui.label(RichText::new(msg).color(Color32::RED));
        return;
    }
    let Some(trend) = &view.trend else {
        ui.label("No purchases for this group.");
        return;
    };
    if trend.pivot.is_empty() {
        ui.label("No purchases of the selected categories in this date range.");
        return;
    }

    trend_plot(ui, view, trend, colors);
}

fn trend_plot(ui: &mut Ui, view: &DashboardView, trend: &TrendView, colors: &CategoryColors) {
    let pivot = &trend.pivot;
    let labels: Vec<String> = pivot.months.iter().map(MonthYear::to_string).collect();

    Plot::new("trend_plot")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Month - Year")
        .y_axis_label(view.measure.label())
        .x_axis_formatter(label_formatter(labels))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (cat_idx, category) in pivot.categories.iter().enumerate() {
                let points: PlotPoints = pivot
                    .series(cat_idx)
                    .into_iter()
                    .enumerate()
                    .map(|(m, v)| [m as f64, v])
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .name(category)
                        .color(colors.color_for(category))
                        .width(1.5),
                );
            }

            let month_x = |date| {
                pivot
                    .month_index(MonthYear::from_date(date))
                    .map(|i| i as f64)
            };
            for x in trend.gridlines.quarter_starts.iter().filter_map(|d| month_x(*d)) {
                plot_ui.vline(
                    VLine::new(x)
                        .color(Color32::GRAY)
                        .width(1.0)
                        .style(LineStyle::dashed_loose()),
                );
            }
            for x in trend.gridlines.year_starts.iter().filter_map(|d| month_x(*d)) {
                plot_ui.vline(VLine::new(x).color(Color32::GRAY).width(1.0));
            }
        });
}
