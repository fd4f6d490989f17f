// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::bucketize::Bucket;
use super::period::PeriodKey;

/// Sums amounts without panicking; saturates at `Decimal::MAX`.
pub fn sum_amounts<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, a| acc.saturating_add(a))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub key: PeriodKey,
    pub order: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    pub series: Vec<SeriesPoint>,
    pub categories: Vec<CategoryTotal>,
}

impl Aggregation {
    pub fn grand_total(&self) -> Decimal {
        sum_amounts(self.series.iter().map(|p| p.total))
    }

    pub fn category_total(&self) -> Decimal {
        sum_amounts(self.categories.iter().map(|c| c.total))
    }

    /// Category totals and period totals must account for the same money.
    pub fn is_conserved(&self) -> bool {
        self.grand_total() == self.category_total()
    }
}

/// Sums each bucket and groups the whole bucket set by category.
///
/// Categories come back largest first, ties by name.
pub fn aggregate(buckets: &[Bucket]) -> Aggregation {
    let mut series: Vec<SeriesPoint> = buckets
        .iter()
        .map(|b| SeriesPoint {
            key: b.key,
            order: b.order,
            start: b.start,
            end: b.end,
            total: sum_amounts(b.records.iter().map(|r| r.amount)),
            count: b.records.len(),
        })
        .collect();
    series.sort_by_key(|p| p.order);

    let mut by_category: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    for record in buckets.iter().flat_map(|b| b.records.iter()) {
        let entry = by_category
            .entry(record.category_name())
            .or_insert((Decimal::ZERO, 0));
        entry.0 = entry.0.saturating_add(record.amount);
        entry.1 += 1;
    }
    let mut categories: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
        })
        .collect();
    // stable: BTreeMap already yields names ascending
    categories.sort_by(|a, b| b.total.cmp(&a.total));

    tracing::debug!(
        periods = series.len(),
        categories = categories.len(),
        "aggregated buckets"
    );

    Aggregation { series, categories }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bucketize::bucketize;
    use crate::engine::period::{DateRange, Granularity};
    use crate::models::{ExpenseRecord, UNCATEGORIZED};
    use std::str::FromStr;

    fn rec(id: &str, amount: &str, category: Option<&str>, date: &str) -> ExpenseRecord {
        ExpenseRecord::new(id, Decimal::from_str(amount).unwrap(), category, date)
    }

    fn january() -> DateRange {
        DateRange::new("2024-01-01".parse().unwrap(), "2024-01-31".parse().unwrap()).unwrap()
    }

    #[test]
    fn empty_input_is_empty_output() {
        let agg = aggregate(&[]);
        assert!(agg.series.is_empty());
        assert!(agg.categories.is_empty());
        assert!(agg.is_conserved());
    }

    #[test]
    fn cents_do_not_drift() {
        let records: Vec<ExpenseRecord> = (0..10)
            .map(|i| rec(&i.to_string(), "0.10", Some("Coffee"), "2024-01-10"))
            .collect();
        let b = bucketize(&records, Granularity::Month, january()).unwrap();
        let agg = aggregate(&b.buckets);
        assert_eq!(agg.grand_total(), Decimal::ONE);
        assert_eq!(agg.categories[0].total, Decimal::ONE);
        assert!(agg.is_conserved());
    }

    #[test]
    fn missing_and_blank_categories_fold_together() {
        let records = vec![
            rec("1", "3", None, "2024-01-02"),
            rec("2", "4", Some("  "), "2024-01-03"),
            rec("3", "7", Some("Rent"), "2024-01-04"),
        ];
        let b = bucketize(&records, Granularity::Week, january()).unwrap();
        let agg = aggregate(&b.buckets);
        assert_eq!(agg.categories.len(), 2);
        // tie on 7 broken by name
        assert_eq!(agg.categories[0].category, "Rent");
        assert_eq!(agg.categories[1].category, UNCATEGORIZED);
        assert_eq!(agg.categories[1].count, 2);
    }

    #[test]
    fn ties_rank_by_name() {
        let records = vec![
            rec("1", "5", Some("Zoo"), "2024-01-02"),
            rec("2", "5", Some("Art"), "2024-01-03"),
            rec("3", "9", Some("Mid"), "2024-01-04"),
        ];
        let b = bucketize(&records, Granularity::Month, january()).unwrap();
        let names: Vec<String> = aggregate(&b.buckets)
            .categories
            .into_iter()
            .map(|c| c.category)
            .collect();
        assert_eq!(names, vec!["Mid", "Art", "Zoo"]);
    }

    #[test]
    fn series_is_sorted_even_if_buckets_are_not() {
        let records = vec![rec("1", "1", None, "2024-01-02")];
        let mut buckets = bucketize(&records, Granularity::Week, january())
            .unwrap()
            .buckets;
        buckets.reverse();
        let agg = aggregate(&buckets);
        assert!(agg.series.windows(2).all(|w| w[0].order < w[1].order));
    }
}
