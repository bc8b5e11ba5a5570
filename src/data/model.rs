use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Gender
// ---------------------------------------------------------------------------

/// Customer gender as recorded on the invoice.
///
/// Ordering is alphabetical so grouped output matches the order a sorted
/// group-by produces (`Female` before `Male`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Female => write!(f, "Female"),
            Gender::Male => write!(f, "Male"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown gender '{0}'")]
pub struct UnknownGender(pub String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "female" | "f" => Ok(Gender::Female),
            "male" | "m" => Ok(Gender::Male),
            _ => Err(UnknownGender(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction – one row of the source file
// ---------------------------------------------------------------------------

/// A single purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub invoice_no: String,
    pub customer_id: String,
    pub gender: Gender,
    pub age: u32,
    pub category: String,
    pub quantity: u32,
    /// Invoice amount in the dataset's currency unit.
    pub price: f64,
    pub payment_method: String,
    pub invoice_date: NaiveDate,
    pub mall: String,
}

// ---------------------------------------------------------------------------
// TransactionDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset. Built once at load time and never mutated;
/// every pipeline stage borrows from it.
#[derive(Debug, Clone, Default)]
pub struct TransactionDataset {
    /// All transactions (rows) that parsed cleanly.
    pub transactions: Vec<Transaction>,
    /// Sorted unique mall names.
    pub malls: Vec<String>,
    /// Sorted unique category names.
    pub categories: Vec<String>,
    /// Rows dropped during loading because a field could not be parsed.
    pub skipped_rows: usize,
}

impl TransactionDataset {
    /// Build the mall / category indices from the loaded rows.
    pub fn from_transactions(transactions: Vec<Transaction>, skipped_rows: usize) -> Self {
        let malls: BTreeSet<&str> = transactions.iter().map(|t| t.mall.as_str()).collect();
        let categories: BTreeSet<&str> =
            transactions.iter().map(|t| t.category.as_str()).collect();

        let malls = malls.into_iter().map(str::to_string).collect();
        let categories = categories.into_iter().map(str::to_string).collect();

        TransactionDataset {
            transactions,
            malls,
            categories,
            skipped_rows,
        }
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Compact constructor used by the pipeline tests across the crate.
    pub(crate) fn tx(
        mall: &str,
        gender: Gender,
        age: u32,
        category: &str,
        price: f64,
        date: (i32, u32, u32),
    ) -> Transaction {
        Transaction {
            invoice_no: format!("I{age}{}", date.2),
            customer_id: "C100".to_string(),
            gender,
            age,
            category: category.to_string(),
            quantity: 1,
            price,
            payment_method: "Cash".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            mall: mall.to_string(),
        }
    }

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("Female".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!(" male ".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!("M".parse::<Gender>(), Ok(Gender::Male));
        assert!("other".parse::<Gender>().is_err());
    }

    #[test]
    fn female_sorts_before_male() {
        assert!(Gender::Female < Gender::Male);
    }

    #[test]
    fn dataset_indexes_sorted_unique_malls_and_categories() {
        let ds = TransactionDataset::from_transactions(
            vec![
                tx("Kanyon", Gender::Male, 30, "Shoes", 600.0, (2022, 1, 5)),
                tx("Forum", Gender::Female, 41, "Books", 15.0, (2022, 2, 5)),
                tx("Kanyon", Gender::Female, 25, "Books", 30.0, (2022, 3, 5)),
            ],
            2,
        );
        assert_eq!(ds.malls, vec!["Forum", "Kanyon"]);
        assert_eq!(ds.categories, vec!["Books", "Shoes"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.skipped_rows, 2);
        assert!(!ds.is_empty());
    }
}
