use std::path::Path;

use chrono::NaiveDate;

use crate::color::CategoryColors;
use crate::config::DashboardConfig;
use crate::data::aggregate::{
    aggregate_by_category, compute_age_bins, group_count, largest_group, top_n, AgeBin,
    CategoryMeasure, CategoryRow, GroupCount,
};
use crate::data::filter::{
    date_bounds, filter_by_categories, filter_by_date_range, filter_by_gender_age, filter_by_mall,
};
use crate::data::model::{Gender, TransactionDataset};
use crate::data::trend::{
    compute_gridline_dates, pivot_by_month, Gridlines, MonthYear, PivotTable, TrendMeasure,
};

// ---------------------------------------------------------------------------
// Selection – what the analyst picked
// ---------------------------------------------------------------------------

/// The analyst's current choices. Never mutated in place: every control
/// change builds a new `Selection`, and choices that depend on a coarser one
/// (the age bin depends on the mall, the date range on the audience group)
/// are cleared so they fall back to their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// `None` means the first mall of the dataset.
    pub mall: Option<String>,
    pub gender: Gender,
    /// `None`, or a bin that no longer exists, means the first bin.
    pub age_bin: Option<AgeBin>,
    /// `None` means the audience group's full date span.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// `None` means the most purchased categories.
    pub categories: Option<Vec<String>>,
    pub measure: TrendMeasure,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            mall: None,
            gender: Gender::Male,
            age_bin: None,
            date_range: None,
            categories: None,
            measure: TrendMeasure::default(),
        }
    }
}

impl Selection {
    pub fn with_mall(&self, mall: impl Into<String>) -> Self {
        Self {
            mall: Some(mall.into()),
            gender: self.gender,
            measure: self.measure,
            ..Self::default()
        }
    }

    pub fn with_gender(&self, gender: Gender) -> Self {
        Self {
            gender,
            date_range: None,
            categories: None,
            ..self.clone()
        }
    }

    pub fn with_age_bin(&self, bin: AgeBin) -> Self {
        Self {
            age_bin: Some(bin),
            date_range: None,
            categories: None,
            ..self.clone()
        }
    }

    pub fn with_date_range(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            date_range: Some((start, end)),
            ..self.clone()
        }
    }

    pub fn with_categories(&self, categories: Vec<String>) -> Self {
        Self {
            categories: Some(categories),
            ..self.clone()
        }
    }

    pub fn with_measure(&self, measure: TrendMeasure) -> Self {
        Self {
            measure,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// DashboardView – everything the charts draw, derived from a Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TrendView {
    pub pivot: PivotTable,
    pub gridlines: Gridlines,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub mall: Option<String>,
    pub mall_size: usize,
    pub age_bins: Vec<AgeBin>,
    pub group_counts: Vec<GroupCount>,
    pub largest_group: Option<GroupCount>,

    pub gender: Gender,
    pub age_bin: Option<AgeBin>,
    pub group_size: usize,
    /// Items bought by the group (sum of quantities).
    pub group_units: u64,
    pub category_rows: Vec<CategoryRow>,
    pub top_by_count: Vec<String>,
    pub top_by_profit: Vec<String>,

    /// First and last invoice date of the audience group.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub trend_categories: Vec<String>,
    pub measure: TrendMeasure,
    pub trend: Option<TrendView>,
    /// Shown instead of the trend chart when the selection is invalid.
    pub validation: Option<String>,
}

impl DashboardView {
    /// Run the whole pipeline for `selection`, top to bottom.
    pub fn compute(
        dataset: &TransactionDataset,
        selection: &Selection,
        config: &DashboardConfig,
    ) -> Self {
        let mall = selection
            .mall
            .clone()
            .or_else(|| dataset.malls.first().cloned());

        let mall_rows = match &mall {
            Some(m) => filter_by_mall(&dataset.transactions, m),
            None => Vec::new(),
        };
        let age_bins = compute_age_bins(&mall_rows, config.age_bin_width);
        let group_counts = group_count(&mall_rows, &age_bins);
        let largest = largest_group(&group_counts).copied();

        let age_bin = selection
            .age_bin
            .filter(|b| age_bins.contains(b))
            .or_else(|| age_bins.first().copied());
        let group = match &age_bin {
            Some(bin) => filter_by_gender_age(&mall_rows, selection.gender, bin),
            None => Vec::new(),
        };

        let category_rows = aggregate_by_category(&group);
        let names = |rows: Vec<&CategoryRow>| -> Vec<String> {
            rows.into_iter().map(|r| r.category.clone()).collect()
        };
        let top_by_count = names(top_n(
            &category_rows,
            CategoryMeasure::PurchaseCount,
            config.top_n,
        ));
        let top_by_profit = names(top_n(
            &category_rows,
            CategoryMeasure::TotalProfit,
            config.top_n,
        ));

        let bounds = date_bounds(&group);
        let date_range = selection.date_range.or(bounds);
        let trend_categories = selection.categories.clone().unwrap_or_else(|| {
            names(top_n(
                &category_rows,
                CategoryMeasure::PurchaseCount,
                config.default_trend_categories,
            ))
        });

        let mut trend = None;
        let mut validation = None;
        if let Some((start, end)) = date_range {
            match filter_by_date_range(&group, start, end) {
                Ok(ranged) => {
                    let ranged = filter_by_categories(&ranged, &trend_categories);
                    let pivot = pivot_by_month(&ranged, &trend_categories, selection.measure)
                        .with_month_span(MonthYear::from_date(start), MonthYear::from_date(end));
                    trend = Some(TrendView {
                        pivot,
                        gridlines: compute_gridline_dates(start, end),
                    });
                }
                Err(e) => {
                    log::debug!("trend not computed: {e}");
                    validation = Some(format!("Invalid date range: {e}"));
                }
            }
        }

        DashboardView {
            mall,
            mall_size: mall_rows.len(),
            age_bins,
            group_counts,
            largest_group: largest,
            gender: selection.gender,
            age_bin,
            group_size: group.len(),
            group_units: group.iter().map(|t| u64::from(t.quantity)).sum(),
            category_rows,
            top_by_count,
            top_by_profit,
            date_bounds: bounds,
            date_range,
            trend_categories,
            measure: selection.measure,
            trend,
            validation,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<TransactionDataset>,

    pub config: DashboardConfig,

    /// Current control values.
    pub selection: Selection,

    /// Pipeline output for `selection` (cached until the next change).
    pub view: Option<DashboardView>,

    /// Line colour per category of the loaded dataset.
    pub category_colors: CategoryColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            dataset: None,
            config,
            selection: Selection::default(),
            view: None,
            category_colors: CategoryColors::new(&[]),
            status_message: None,
        }
    }

    /// Ingest a newly loaded dataset and reset the selection.
    pub fn set_dataset(&mut self, dataset: TransactionDataset) {
        self.status_message = (dataset.skipped_rows > 0)
            .then(|| format!("{} malformed row(s) skipped", dataset.skipped_rows));
        if dataset.is_empty() {
            log::warn!("dataset contains no usable rows");
        }
        self.category_colors = CategoryColors::new(&dataset.categories);
        self.dataset = Some(dataset);
        self.apply(Selection::default());
    }

    /// Load a dataset from disk. On failure the current dataset is kept and
    /// the error is shown in the status bar.
    pub fn load_path(&mut self, path: &Path) {
        match crate::data::loader::load_file(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} transactions across {} malls from {}",
                    dataset.len(),
                    dataset.malls.len(),
                    path.display()
                );
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Replace the selection and recompute the view from scratch.
    pub fn apply(&mut self, selection: Selection) {
        self.view = self
            .dataset
            .as_ref()
            .map(|ds| DashboardView::compute(ds, &selection, &self.config));
        self.selection = selection;
    }
}
