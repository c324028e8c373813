//! Basket construction: raw transaction records to a boolean basket-by-item matrix

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use ndarray::Array2;
use serde::Serialize;
use tracing::debug;

use crate::error::{CoreResult, RecommendError};

/// Separator used for both `item_category` and basket identifiers
pub const KEY_SEPARATOR: char = '_';

/// A single purchased service, as supplied by the ingestion layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub user_id: String,
    pub item_id: String,
    pub category_id: String,
    pub timestamp: NaiveDateTime,
}

impl TransactionRecord {
    pub fn new(
        user_id: impl Into<String>,
        item_id: impl Into<String>,
        category_id: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            category_id: category_id.into(),
            timestamp,
        }
    }

    /// Composite key `itemId_categoryId`; the same item id means different
    /// services under different categories.
    pub fn item_category(&self) -> String {
        format!("{}{}{}", self.item_id, KEY_SEPARATOR, self.category_id)
    }

    /// Calendar month of the transaction, formatted `YYYY-MM`
    pub fn year_month(&self) -> String {
        self.timestamp.format("%Y-%m").to_string()
    }

    /// Basket key `userId_YYYY-MM`
    pub fn basket_id(&self) -> String {
        format!("{}{}{}", self.user_id, KEY_SEPARATOR, self.year_month())
    }

    fn validate(&self, row: usize) -> CoreResult<()> {
        if self.user_id.trim().is_empty() {
            return Err(RecommendError::invalid_record(row, "missing user id"));
        }
        if self.item_id.trim().is_empty() {
            return Err(RecommendError::invalid_record(row, "missing item id"));
        }
        if self.category_id.trim().is_empty() {
            return Err(RecommendError::invalid_record(row, "missing category id"));
        }
        Ok(())
    }
}

/// Boolean basket-by-item matrix.
///
/// Rows are basket ids and columns are item_category keys, both sorted
/// lexicographically. The column order is fixed for the lifetime of the
/// matrix, so column indices are stable between mining and rule generation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionMatrix {
    basket_ids: Vec<String>,
    items: Vec<String>,
    cells: Array2<bool>,
}

impl TransactionMatrix {
    /// Materialize a matrix from explicit basket contents.
    ///
    /// Duplicate items within a basket collapse to a single presence flag, and
    /// repeated basket ids merge into one row.
    pub fn from_baskets<I, B, S>(baskets: I) -> Self
    where
        I: IntoIterator<Item = (B, Vec<S>)>,
        B: Into<String>,
        S: Into<String>,
    {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (basket_id, items) in baskets {
            grouped
                .entry(basket_id.into())
                .or_default()
                .extend(items.into_iter().map(Into::<String>::into));
        }
        Self::from_grouped(grouped)
    }

    fn from_grouped(grouped: BTreeMap<String, BTreeSet<String>>) -> Self {
        let items: Vec<String> = grouped
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut cells = Array2::from_elem((grouped.len(), items.len()), false);
        for (row, basket_items) in grouped.values().enumerate() {
            for item in basket_items {
                // Universe is built from these same values.
                if let Ok(col) = items.binary_search(item) {
                    cells[[row, col]] = true;
                }
            }
        }

        Self {
            basket_ids: grouped.into_keys().collect(),
            items,
            cells,
        }
    }

    pub fn n_baskets(&self) -> usize {
        self.basket_ids.len()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basket_ids.is_empty()
    }

    pub fn basket_ids(&self) -> &[String] {
        &self.basket_ids
    }

    /// Column universe in matrix order
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn cells(&self) -> &Array2<bool> {
        &self.cells
    }

    pub fn column_index(&self, item: &str) -> Option<usize> {
        self.items
            .binary_search_by(|probe| probe.as_str().cmp(item))
            .ok()
    }

    pub fn contains(&self, basket_id: &str, item: &str) -> bool {
        let row = self
            .basket_ids
            .binary_search_by(|probe| probe.as_str().cmp(basket_id));
        match (row, self.column_index(item)) {
            (Ok(row), Some(col)) => self.cells[[row, col]],
            _ => false,
        }
    }

    /// Number of baskets containing every listed column
    pub fn count_containing(&self, columns: &[usize]) -> usize {
        self.cells
            .outer_iter()
            .filter(|row| columns.iter().all(|&col| row[col]))
            .count()
    }

    /// Number of baskets containing each item, in column order
    pub fn item_counts(&self) -> Vec<usize> {
        self.cells
            .columns()
            .into_iter()
            .map(|column| column.iter().filter(|&&present| present).count())
            .collect()
    }

    /// Number of distinct items in each basket, in row order
    pub fn basket_sizes(&self) -> Vec<usize> {
        self.cells
            .outer_iter()
            .map(|row| row.iter().filter(|&&present| present).count())
            .collect()
    }
}

/// Group transaction records into monthly per-user baskets.
///
/// Output has one row per distinct `userId_YYYY-MM` and one column per
/// distinct item_category observed anywhere in the input. Empty input yields
/// an empty matrix.
pub fn build_baskets(records: &[TransactionRecord]) -> CoreResult<TransactionMatrix> {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (row, record) in records.iter().enumerate() {
        record.validate(row)?;
        grouped
            .entry(record.basket_id())
            .or_default()
            .insert(record.item_category());
    }

    let matrix = TransactionMatrix::from_grouped(grouped);
    debug!(
        records = records.len(),
        baskets = matrix.n_baskets(),
        items = matrix.n_items(),
        "built transaction matrix"
    );

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    fn sample_records() -> Vec<TransactionRecord> {
        vec![
            TransactionRecord::new("7256", "9", "4", at(2017, 8, 6)),
            TransactionRecord::new("7256", "46", "4", at(2017, 8, 20)),
            TransactionRecord::new("7256", "9", "4", at(2017, 10, 1)),
            TransactionRecord::new("7256", "38", "4", at(2017, 10, 12)),
            TransactionRecord::new("7256", "38", "4", at(2017, 10, 13)),
            TransactionRecord::new("2", "9", "7", at(2017, 8, 2)),
        ]
    }

    #[test]
    fn test_record_keys() {
        let record = TransactionRecord::new("7256", "9", "4", at(2017, 8, 6));
        assert_eq!(record.item_category(), "9_4");
        assert_eq!(record.year_month(), "2017-08");
        assert_eq!(record.basket_id(), "7256_2017-08");
    }

    #[test]
    fn test_build_baskets() {
        let matrix = build_baskets(&sample_records()).unwrap();

        assert_eq!(
            matrix.basket_ids(),
            &["2_2017-08", "7256_2017-08", "7256_2017-10"]
        );
        assert_eq!(matrix.items(), &["38_4", "46_4", "9_4", "9_7"]);
        assert_eq!(matrix.cells().shape(), &[3, 4]);

        assert!(matrix.contains("7256_2017-08", "9_4"));
        assert!(matrix.contains("7256_2017-08", "46_4"));
        assert!(!matrix.contains("7256_2017-08", "38_4"));
        assert!(matrix.contains("2_2017-08", "9_7"));
        assert!(!matrix.contains("2_2017-08", "9_4"));
    }

    #[test]
    fn test_presence_not_count() {
        let matrix = build_baskets(&sample_records()).unwrap();
        // 38_4 was bought twice in October but is a single presence flag.
        assert_eq!(matrix.basket_sizes(), vec![1, 2, 2]);
        assert_eq!(matrix.item_counts(), vec![1, 1, 2, 1]);
    }

    #[test]
    fn test_empty_input() {
        let matrix = build_baskets(&[]).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.n_items(), 0);
        assert_eq!(matrix.cells().shape(), &[0, 0]);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut records = sample_records();
        records[2].category_id = "  ".to_string();

        let err = build_baskets(&records).unwrap_err();
        assert_eq!(err, RecommendError::invalid_record(2, "missing category id"));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let records = sample_records();
        let mut reversed = records.clone();
        reversed.reverse();

        assert_eq!(
            build_baskets(&records).unwrap(),
            build_baskets(&reversed).unwrap()
        );
    }

    #[test]
    fn test_count_containing() {
        let matrix = TransactionMatrix::from_baskets(vec![
            ("b1", vec!["9_4", "46_4"]),
            ("b2", vec!["9_4", "38_4"]),
        ]);
        let nine = matrix.column_index("9_4").unwrap();
        let forty_six = matrix.column_index("46_4").unwrap();

        assert_eq!(matrix.count_containing(&[nine]), 2);
        assert_eq!(matrix.count_containing(&[nine, forty_six]), 1);
        assert_eq!(matrix.count_containing(&[]), 2);
        assert_eq!(matrix.column_index("1_1"), None);
    }
}
