use chrono::NaiveDate;

use super::aggregate::AgeBin;
use super::error::PipelineError;
use super::model::{Gender, Transaction};

// ---------------------------------------------------------------------------
// Row filters
//
// Every filter borrows from the immutable dataset and returns the matching
// rows in their original order.
// ---------------------------------------------------------------------------

/// Transactions made in `mall` (exact match). An unknown mall yields an
/// empty subset.
pub fn filter_by_mall<'a>(records: &'a [Transaction], mall: &str) -> Vec<&'a Transaction> {
    records.iter().filter(|t| t.mall == mall).collect()
}

/// Transactions of the audience group `gender` × `bin`.
pub fn filter_by_gender_age<'a>(
    subset: &[&'a Transaction],
    gender: Gender,
    bin: &AgeBin,
) -> Vec<&'a Transaction> {
    subset
        .iter()
        .copied()
        .filter(|t| t.gender == gender && bin.contains(t.age))
        .collect()
}

/// Transactions whose invoice date lies in `[start, end]`.
pub fn filter_by_date_range<'a>(
    group: &[&'a Transaction],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<&'a Transaction>, PipelineError> {
    if end < start {
        return Err(PipelineError::EmptyRange { start, end });
    }
    Ok(group
        .iter()
        .copied()
        .filter(|t| t.invoice_date >= start && t.invoice_date <= end)
        .collect())
}

/// Transactions whose category is one of `categories`.
pub fn filter_by_categories<'a>(
    subset: &[&'a Transaction],
    categories: &[String],
) -> Vec<&'a Transaction> {
    subset
        .iter()
        .copied()
        .filter(|t| categories.iter().any(|c| *c == t.category))
        .collect()
}

/// Earliest and latest invoice dates in `subset`, if any.
pub fn date_bounds(subset: &[&Transaction]) -> Option<(NaiveDate, NaiveDate)> {
    let min = subset.iter().map(|t| t.invoice_date).min()?;
    let max = subset.iter().map(|t| t.invoice_date).max()?;
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::tx;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn records() -> Vec<Transaction> {
        vec![
            tx("Kanyon", Gender::Female, 23, "Books", 100.0, (2022, 1, 10)),
            tx("Kanyon", Gender::Male, 35, "Shoes", 600.0, (2022, 2, 1)),
            tx("Forum", Gender::Female, 24, "Toys", 50.0, (2022, 3, 15)),
            tx("Kanyon", Gender::Female, 26, "Toys", 80.0, (2022, 3, 31)),
        ]
    }

    #[test]
    fn mall_filter_is_exact_and_keeps_order() {
        let rows = records();
        let kanyon = filter_by_mall(&rows, "Kanyon");
        assert_eq!(kanyon.len(), 3);
        assert_eq!(kanyon[0].category, "Books");
        assert_eq!(kanyon[2].category, "Toys");
        assert!(filter_by_mall(&rows, "kanyon").is_empty());
        assert!(filter_by_mall(&rows, "Nowhere").is_empty());
    }

    #[test]
    fn gender_age_filter_matches_both() {
        let rows = records();
        let kanyon = filter_by_mall(&rows, "Kanyon");
        let bin = AgeBin::new(23, 28, false);
        let group = filter_by_gender_age(&kanyon, Gender::Female, &bin);
        assert_eq!(group.len(), 2);
        assert!(filter_by_gender_age(&kanyon, Gender::Male, &bin).is_empty());
    }

    #[test]
    fn date_range_is_inclusive() {
        let rows = records();
        let all: Vec<&Transaction> = rows.iter().collect();
        let hit = filter_by_date_range(&all, date(2022, 2, 1), date(2022, 3, 15)).unwrap();
        assert_eq!(hit.len(), 2);
        let single = filter_by_date_range(&all, date(2022, 3, 31), date(2022, 3, 31)).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn reversed_date_range_is_rejected() {
        let rows = records();
        let all: Vec<&Transaction> = rows.iter().collect();
        let err = filter_by_date_range(&all, date(2022, 3, 1), date(2022, 2, 1)).unwrap_err();
        assert_eq!(
            err,
            PipelineError::EmptyRange {
                start: date(2022, 3, 1),
                end: date(2022, 2, 1)
            }
        );
    }

    #[test]
    fn category_filter_and_bounds() {
        let rows = records();
        let all: Vec<&Transaction> = rows.iter().collect();
        let toys = filter_by_categories(&all, &["Toys".to_string()]);
        assert_eq!(toys.len(), 2);
        assert_eq!(date_bounds(&toys), Some((date(2022, 3, 15), date(2022, 3, 31))));
        assert_eq!(date_bounds(&[]), None);
    }
}
