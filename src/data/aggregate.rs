use std::collections::BTreeMap;
use std::fmt;

use super::model::{Gender, Transaction};

/// Default width of an age bin, in years.
pub const DEFAULT_AGE_BIN_WIDTH: u32 = 5;

// ---------------------------------------------------------------------------
// Age bins
// ---------------------------------------------------------------------------

/// An age interval `[lo, hi)`, or `[lo, hi]` for the last bin of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgeBin {
    pub lo: u32,
    pub hi: u32,
    /// Whether `hi` itself belongs to the bin.
    pub closed: bool,
}

impl AgeBin {
    pub fn new(lo: u32, hi: u32, closed: bool) -> Self {
        Self { lo, hi, closed }
    }

    pub fn contains(&self, age: u32) -> bool {
        age >= self.lo && (age < self.hi || (self.closed && age == self.hi))
    }
}

impl fmt::Display for AgeBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let close = if self.closed { ']' } else { ')' };
        write!(f, "[{},{}{close}", self.lo, self.hi)
    }
}

/// Partition the observed age range of `subset` into bins of `width` years.
///
/// Bins start at the youngest age; the final bin is closed at the oldest age
/// so every age in `[min, max]` falls in exactly one bin. A range narrower
/// than `width` yields a single bin `[min, max]`, an empty subset no bins.
pub fn compute_age_bins(subset: &[&Transaction], width: u32) -> Vec<AgeBin> {
    let Some(min) = subset.iter().map(|t| t.age).min() else {
        return Vec::new();
    };
    let max = subset.iter().map(|t| t.age).max().unwrap_or(min);

    if width == 0 {
        return vec![AgeBin::new(min, max, true)];
    }

    let mut bins = Vec::new();
    let mut lo = min;
    while let Some(hi) = lo.checked_add(width).filter(|&hi| hi <= max) {
        bins.push(AgeBin::new(lo, hi, false));
        lo = hi;
    }
    bins.push(AgeBin::new(lo, max, true));
    bins
}

/// Index of the bin holding `age`.
pub fn bin_index(bins: &[AgeBin], age: u32) -> Option<usize> {
    bins.iter().position(|b| b.contains(age))
}

// ---------------------------------------------------------------------------
// Audience groups (gender × age bin)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupCount {
    pub gender: Gender,
    pub bin: AgeBin,
    pub count: usize,
}

/// Count transactions per `(gender, age bin)` combination present in
/// `subset`, ordered by gender and then by bin.
pub fn group_count(subset: &[&Transaction], bins: &[AgeBin]) -> Vec<GroupCount> {
    let mut counts: BTreeMap<(Gender, usize), usize> = BTreeMap::new();
    for t in subset {
        match bin_index(bins, t.age) {
            Some(idx) => *counts.entry((t.gender, idx)).or_default() += 1,
            None => log::debug!("age {} outside computed bins, not grouped", t.age),
        }
    }

    counts
        .into_iter()
        .map(|((gender, idx), count)| GroupCount {
            gender,
            bin: bins[idx],
            count,
        })
        .collect()
}

/// The group with the highest count. Ties go to the first group in key order.
pub fn largest_group(rows: &[GroupCount]) -> Option<&GroupCount> {
    rows.iter().fold(None, |best: Option<&GroupCount>, row| match best {
        Some(b) if b.count >= row.count => Some(b),
        _ => Some(row),
    })
}

// ---------------------------------------------------------------------------
// Category popularity / profitability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub category: String,
    pub purchase_count: usize,
    /// Sum of prices, in thousands.
    pub total_profit: f64,
}

/// Which measure of a [`CategoryRow`] to rank by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryMeasure {
    PurchaseCount,
    TotalProfit,
}

impl CategoryMeasure {
    pub fn value(self, row: &CategoryRow) -> f64 {
        match self {
            CategoryMeasure::PurchaseCount => row.purchase_count as f64,
            CategoryMeasure::TotalProfit => row.total_profit,
        }
    }
}

/// Purchase count and profit (k) per category, ordered by category name.
pub fn aggregate_by_category(group: &[&Transaction]) -> Vec<CategoryRow> {
    let mut acc: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for t in group {
        let entry = acc.entry(t.category.as_str()).or_default();
        entry.0 += 1;
        entry.1 += t.price;
    }

    acc.into_iter()
        .map(|(category, (purchase_count, price_sum))| CategoryRow {
            category: category.to_string(),
            purchase_count,
            total_profit: price_sum / 1000.0,
        })
        .collect()
}

/// The `n` rows with the largest `field`, descending. The sort is stable, so
/// ties keep their input (category-name) order.
pub fn top_n(rows: &[CategoryRow], field: CategoryMeasure, n: usize) -> Vec<&CategoryRow> {
    let mut ranked: Vec<&CategoryRow> = rows.iter().collect();
    ranked.sort_by(|a, b| field.value(b).total_cmp(&field.value(a)));
    ranked.truncate(n);
    ranked
}
