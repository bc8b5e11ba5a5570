use std::fmt;

use chrono::{Datelike, NaiveDate};

use super::model::Transaction;

// ---------------------------------------------------------------------------
// MonthYear – calendar month bucket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

impl MonthYear {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// The following calendar month.
    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ---------------------------------------------------------------------------
// Month × category pivot
// ---------------------------------------------------------------------------

/// Measure plotted on the trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendMeasure {
    #[default]
    PurchaseCount,
    /// Sum of prices, in thousands.
    Profit,
}

impl TrendMeasure {
    pub fn label(self) -> &'static str {
        match self {
            TrendMeasure::PurchaseCount => "# Purchases",
            TrendMeasure::Profit => "Profit (k)",
        }
    }

    fn value(self, t: &Transaction) -> f64 {
        match self {
            TrendMeasure::PurchaseCount => 1.0,
            TrendMeasure::Profit => t.price / 1000.0,
        }
    }
}

/// Dense `month × category` table. Every cell is present; combinations with
/// no transactions hold `0.0`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PivotTable {
    /// Contiguous months, ascending.
    pub months: Vec<MonthYear>,
    pub categories: Vec<String>,
    /// `cells[month_idx][category_idx]`.
    pub cells: Vec<Vec<f64>>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn value(&self, month_idx: usize, category_idx: usize) -> f64 {
        self.cells
            .get(month_idx)
            .and_then(|row| row.get(category_idx))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn month_index(&self, month: MonthYear) -> Option<usize> {
        self.months.binary_search(&month).ok()
    }

    /// The column for one category, one value per month.
    pub fn series(&self, category_idx: usize) -> Vec<f64> {
        (0..self.months.len())
            .map(|m| self.value(m, category_idx))
            .collect()
    }

    /// Sum over all cells.
    pub fn total(&self) -> f64 {
        self.cells.iter().flatten().sum()
    }

    /// Widen the month axis to include `first..=last`, zero-filling the new
    /// rows. An empty table stays empty.
    pub fn with_month_span(self, first: MonthYear, last: MonthYear) -> PivotTable {
        let (Some(&data_first), Some(&data_last)) = (self.months.first(), self.months.last())
        else {
            return self;
        };
        let first = first.min(data_first);
        let last = last.max(data_last);

        let months = month_range(first, last);
        let mut cells = vec![vec![0.0; self.categories.len()]; months.len()];
        for (month, row) in self.months.iter().zip(self.cells) {
            if let Ok(m) = months.binary_search(month) {
                cells[m] = row;
            }
        }
        PivotTable {
            months,
            categories: self.categories,
            cells,
        }
    }
}

/// Every month from `first` to `last`, inclusive.
fn month_range(first: MonthYear, last: MonthYear) -> Vec<MonthYear> {
    let mut months = vec![first];
    while let Some(&m) = months.last() {
        if m >= last {
            break;
        }
        months.push(m.next());
    }
    months
}

/// Pivot `subset` into a month × category table of `measure`.
///
/// Rows cover every month from the earliest to the latest one present so the
/// trend lines have no gaps; columns follow `categories` in order.
/// Transactions in other categories are ignored.
pub fn pivot_by_month(
    subset: &[&Transaction],
    categories: &[String],
    measure: TrendMeasure,
) -> PivotTable {
    let relevant: Vec<(usize, &Transaction)> = subset
        .iter()
        .filter_map(|t| {
            categories
                .iter()
                .position(|c| *c == t.category)
                .map(|idx| (idx, *t))
        })
        .collect();

    let first = relevant
        .iter()
        .map(|(_, t)| MonthYear::from_date(t.invoice_date))
        .min();
    let last = relevant
        .iter()
        .map(|(_, t)| MonthYear::from_date(t.invoice_date))
        .max();
    let (Some(first), Some(last)) = (first, last) else {
        return PivotTable {
            categories: categories.to_vec(),
            ..PivotTable::default()
        };
    };

    let months = month_range(first, last);
    let mut table = PivotTable {
        cells: vec![vec![0.0; categories.len()]; months.len()],
        months,
        categories: categories.to_vec(),
    };
    for (cat_idx, t) in relevant {
        if let Some(m) = table.month_index(MonthYear::from_date(t.invoice_date)) {
            table.cells[m][cat_idx] += measure.value(t);
        }
    }
    table
}

// ---------------------------------------------------------------------------
// Calendar gridlines for the trend chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Gridlines {
    /// Jan 1, Apr 1, Jul 1 and Oct 1 dates within the range.
    pub quarter_starts: Vec<NaiveDate>,
    /// Jan 1 dates within the range.
    pub year_starts: Vec<NaiveDate>,
}

/// Quarter and year start dates falling inside `[start, end]`.
pub fn compute_gridline_dates(start: NaiveDate, end: NaiveDate) -> Gridlines {
    let mut lines = Gridlines::default();
    if end < start {
        return lines;
    }

    let last = MonthYear::from_date(end);
    let mut month = MonthYear::from_date(start);
    while month <= last {
        if let Some(day) = month.first_day().filter(|d| *d >= start && *d <= end) {
            if matches!(month.month, 1 | 4 | 7 | 10) {
                lines.quarter_starts.push(day);
            }
            if month.month == 1 {
                lines.year_starts.push(day);
            }
        }
        month = month.next();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::filter_by_date_range;
    use crate::data::model::tests::tx;
    use crate::data::model::Gender;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn group() -> Vec<Transaction> {
        vec![
            tx("K", Gender::Male, 30, "Books", 100.0, (2022, 1, 5)),
            tx("K", Gender::Male, 30, "Books", 300.0, (2022, 1, 20)),
            tx("K", Gender::Male, 30, "Shoes", 1200.0, (2022, 4, 2)),
            tx("K", Gender::Male, 30, "Toys", 50.0, (2022, 2, 2)),
            tx("K", Gender::Male, 30, "Shoes", 600.0, (2023, 1, 9)),
        ]
    }

    #[test]
    fn month_year_formats_and_rolls_over() {
        let dec = MonthYear::new(2022, 12);
        assert_eq!(dec.to_string(), "2022-12");
        assert_eq!(dec.next(), MonthYear::new(2023, 1));
        assert_eq!(MonthYear::from_date(date(2021, 3, 31)).to_string(), "2021-03");
    }

    #[test]
    fn pivot_is_dense_and_zero_filled() {
        let rows = group();
        let refs: Vec<&Transaction> = rows.iter().collect();
        let cats = vec!["Books".to_string(), "Shoes".to_string()];
        let table = pivot_by_month(&refs, &cats, TrendMeasure::PurchaseCount);

        // 2022-01 ..= 2023-01, Toys ignored.
        assert_eq!(table.months.len(), 13);
        assert_eq!(table.months[0], MonthYear::new(2022, 1));
        assert_eq!(table.months[12], MonthYear::new(2023, 1));
        assert!(table.cells.iter().all(|row| row.len() == 2));
        assert_eq!(table.value(0, 0), 2.0);
        assert_eq!(table.value(1, 0), 0.0);
        assert_eq!(table.value(3, 1), 1.0);
        assert_eq!(table.series(1).iter().sum::<f64>(), 2.0);
    }

    #[test]
    fn profit_pivot_totals_match_filtered_subset() {
        let rows = group();
        let refs: Vec<&Transaction> = rows.iter().collect();
        let ranged = filter_by_date_range(&refs, date(2022, 1, 10), date(2022, 12, 31)).unwrap();
        let cats = vec!["Books".to_string(), "Shoes".to_string(), "Toys".to_string()];

        let profit = pivot_by_month(&ranged, &cats, TrendMeasure::Profit);
        let expected: f64 = ranged.iter().map(|t| t.price / 1000.0).sum();
        assert!((profit.total() - expected).abs() < 1e-9);

        let count = pivot_by_month(&ranged, &cats, TrendMeasure::PurchaseCount);
        assert_eq!(count.total(), ranged.len() as f64);
    }

    #[test]
    fn month_span_pads_both_ends_with_zero_rows() {
        let rows = group();
        let refs: Vec<&Transaction> = rows.iter().collect();
        let cats = vec!["Books".to_string(), "Shoes".to_string()];
        let ranged = filter_by_date_range(&refs, date(2021, 11, 1), date(2022, 6, 30)).unwrap();
        let table = pivot_by_month(&ranged, &cats, TrendMeasure::PurchaseCount)
            .with_month_span(MonthYear::new(2021, 11), MonthYear::new(2022, 6));

        // 2021-11 ..= 2022-06
        assert_eq!(table.months.len(), 8);
        assert_eq!(table.months[0], MonthYear::new(2021, 11));
        assert_eq!(table.months[7], MonthYear::new(2022, 6));
        assert_eq!(table.series(0), vec![0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(table.value(5, 1), 1.0);
        assert_eq!(table.total(), 3.0);
        for quarter in compute_gridline_dates(date(2021, 11, 1), date(2022, 6, 30)).quarter_starts {
            assert!(table.month_index(MonthYear::from_date(quarter)).is_some());
        }
    }

    #[test]
    fn month_span_never_drops_data_months_or_fills_empty_tables() {
        let rows = group();
        let refs: Vec<&Transaction> = rows.iter().collect();
        let cats = vec!["Books".to_string(), "Shoes".to_string()];
        let table = pivot_by_month(&refs, &cats, TrendMeasure::PurchaseCount);
        let narrowed = table
            .clone()
            .with_month_span(MonthYear::new(2022, 3), MonthYear::new(2022, 3));
        assert_eq!(narrowed, table);

        let empty = pivot_by_month(&[], &cats, TrendMeasure::Profit)
            .with_month_span(MonthYear::new(2022, 1), MonthYear::new(2022, 12));
        assert!(empty.is_empty());
    }

    #[test]
    fn empty_subset_pivots_to_empty_table() {
        let cats = vec!["Books".to_string()];
        let table = pivot_by_month(&[], &cats, TrendMeasure::Profit);
        assert!(table.is_empty());
        assert_eq!(table.categories, cats);
        assert_eq!(table.total(), 0.0);
    }

    #[test]
    fn gridlines_are_calendar_aligned() {
        let lines = compute_gridline_dates(date(2021, 2, 15), date(2022, 7, 1));
        assert_eq!(
            lines.quarter_starts,
            vec![
                date(2021, 4, 1),
                date(2021, 7, 1),
                date(2021, 10, 1),
                date(2022, 1, 1),
                date(2022, 4, 1),
                date(2022, 7, 1),
            ]
        );
        assert_eq!(lines.year_starts, vec![date(2022, 1, 1)]);
    }

    #[test]
    fn gridlines_include_start_boundary_and_skip_reversed_ranges() {
        let lines = compute_gridline_dates(date(2023, 1, 1), date(2023, 1, 31));
        assert_eq!(lines.quarter_starts, vec![date(2023, 1, 1)]);
        assert_eq!(lines.year_starts, vec![date(2023, 1, 1)]);
        assert_eq!(
            compute_gridline_dates(date(2023, 5, 1), date(2023, 1, 1)),
            Gridlines::default()
        );
    }
}
