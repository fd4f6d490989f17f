// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use spendlens::engine::{
    aggregate, analyze, bucketize, compare, AnalysisOptions, Baseline, DateRange, Direction,
    EngineError, Granularity, Insight, PercentChange,
};
use spendlens::models::ExpenseRecord;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn range(a: &str, b: &str) -> DateRange {
    DateRange::new(d(a), d(b)).unwrap()
}

fn sample() -> Vec<ExpenseRecord> {
    vec![
        ExpenseRecord::new("1", Decimal::from(100), Some("Food"), "2024-01-05"),
        ExpenseRecord::new("2", Decimal::from(50), Some("Food"), "2024-02-10"),
        ExpenseRecord::new("3", Decimal::from(25), Some("Transport"), "2024-02-15"),
    ]
}

#[test]
fn monthly_buckets_categories_and_trend() {
    let out = bucketize(&sample(), Granularity::Month, range("2024-01-01", "2024-02-29")).unwrap();
    let keys: Vec<String> = out.buckets.iter().map(|b| b.key.to_string()).collect();
    let totals: Vec<Decimal> = out.buckets.iter().map(|b| b.total).collect();
    assert_eq!(keys, vec!["2024-01", "2024-02"]);
    assert_eq!(totals, vec![Decimal::from(100), Decimal::from(75)]);
    assert_eq!(out.skipped, 0);

    let agg = aggregate(&out.buckets);
    let cats: Vec<(&str, Decimal)> = agg
        .categories
        .iter()
        .map(|c| (c.category.as_str(), c.total))
        .collect();
    assert_eq!(
        cats,
        vec![("Food", Decimal::from(150)), ("Transport", Decimal::from(25))]
    );

    let delta = compare(&agg.series[1], &Baseline::period(&agg.series[0]));
    assert_eq!(delta.percent_change, PercentChange::Finite(Decimal::from(-25)));
    assert_eq!(delta.direction, Direction::Decrease);
}

#[test]
fn empty_range_has_one_empty_bucket_and_no_insights() {
    let opts = AnalysisOptions::new(Granularity::Month, range("2024-03-01", "2024-03-31"));
    let a = analyze(&sample(), &opts).unwrap();
    assert_eq!(a.buckets.len(), 1);
    assert_eq!(a.buckets[0].key.to_string(), "2024-03");
    assert_eq!(a.buckets[0].total, Decimal::ZERO);
    assert!(a.insights.is_empty());
}

#[test]
fn full_pipeline_insights_for_sample() {
    let opts = AnalysisOptions::new(Granularity::Month, range("2024-01-01", "2024-02-29"));
    let a = analyze(&sample(), &opts).unwrap();

    match &a.insights[0] {
        Insight::TopCategory {
            rank,
            category,
            share,
            ..
        } => {
            assert_eq!(*rank, 1);
            assert_eq!(category, "Food");
            assert_eq!(*share, Decimal::new(8571, 2));
        }
        other => panic!("expected top category, got {:?}", other),
    }
    assert!(a.insights.iter().any(|i| matches!(
        i,
        Insight::ConcentrationRatio { share, .. } if *share == Decimal::ONE_HUNDRED
    )));
    assert!(a.insights.iter().any(|i| matches!(
        i,
        Insight::TrendComparison { delta } if delta.direction == Direction::Decrease
    )));
    assert!(a.insights.iter().any(|i| matches!(
        i,
        Insight::PeakPeriod { period, .. } if period.to_string() == "2024-01"
    )));
}

#[test]
fn series_is_contiguous_across_gaps() {
    let records = vec![
        ExpenseRecord::new("1", Decimal::from(10), Some("Food"), "2024-01-02"),
        ExpenseRecord::new("2", Decimal::from(10), Some("Food"), "2024-01-20"),
    ];
    for g in [Granularity::Day, Granularity::Week, Granularity::Month] {
        let out = bucketize(&records, g, range("2024-01-01", "2024-03-31")).unwrap();
        for pair in out.buckets.windows(2) {
            assert_eq!(pair[1].order, pair[0].order + 1, "{:?}", g);
            assert!(pair[1].start > pair[0].end);
        }
    }
}

#[test]
fn weeks_follow_iso_years() {
    let records = vec![ExpenseRecord::new("1", Decimal::ONE, None, "2024-12-30")];
    let out = bucketize(&records, Granularity::Week, range("2024-12-30", "2024-12-31")).unwrap();
    assert_eq!(out.buckets.len(), 1);
    assert_eq!(out.buckets[0].key.to_string(), "2025-W01");
    assert_eq!(out.buckets[0].start, d("2024-12-30"));
}

#[test]
fn totals_are_conserved_and_order_independent() {
    let mut records = sample();
    records.push(ExpenseRecord::new("4", Decimal::new(1999, 2), None, "2024-01-31"));
    records.push(ExpenseRecord::new("5", Decimal::new(1, 2), Some("Food"), "2024-02-29"));
    let opts = AnalysisOptions::new(Granularity::Week, range("2024-01-01", "2024-02-29"));

    let forward = analyze(&records, &opts).unwrap();
    records.reverse();
    let reversed = analyze(&records, &opts).unwrap();

    assert!(forward.aggregation.is_conserved());
    assert_eq!(forward.aggregation.grand_total(), Decimal::new(19500, 2));
    assert_eq!(forward.buckets, reversed.buckets);
    assert_eq!(forward.aggregation, reversed.aggregation);
}

#[test]
fn repeated_runs_serialize_identically() {
    let opts = AnalysisOptions::new(Granularity::Day, range("2024-01-01", "2024-02-29"));
    let a = serde_json::to_string(&analyze(&sample(), &opts).unwrap()).unwrap();
    let b = serde_json::to_string(&analyze(&sample(), &opts).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn invalid_records_are_counted_not_fatal() {
    let records = vec![
        ExpenseRecord::new("1", Decimal::from(10), Some("Food"), "2024-01-02"),
        ExpenseRecord::new("2", Decimal::from(-3), Some("Food"), "2024-01-03"),
        ExpenseRecord::new("3", Decimal::from(3), Some("Food"), "not a date"),
    ];
    let out = bucketize(&records, Granularity::Month, range("2024-01-01", "2024-01-31")).unwrap();
    assert_eq!(out.skipped, 2);
    assert_eq!(out.buckets[0].total, Decimal::from(10));
    assert!(out
        .rejected
        .iter()
        .all(|e| matches!(e, EngineError::InvalidRecord { .. })));
}

#[test]
fn reversed_range_is_rejected() {
    let bad = DateRange {
        start: d("2024-02-01"),
        end: d("2024-01-01"),
    };
    let err = bucketize(&sample(), Granularity::Month, bad).unwrap_err();
    assert!(matches!(err, EngineError::InvalidRange { .. }));
}

#[test]
fn huge_amounts_do_not_panic_the_pipeline() {
    let huge = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
    let records = vec![
        ExpenseRecord::new("1", huge, Some("Food"), "2024-01-05"),
        ExpenseRecord::new("2", huge, Some("Food"), "2024-01-20"),
    ];
    let opts = AnalysisOptions::new(Granularity::Month, range("2024-01-01", "2024-01-31"));
    let a = analyze(&records, &opts).unwrap();
    assert_eq!(a.skipped, 1);
    assert_eq!(a.aggregation.grand_total(), huge);
    assert!(a.aggregation.is_conserved());
}

#[test]
fn same_id_same_day_records_are_order_independent() {
    let records = vec![
        ExpenseRecord::new("dup", Decimal::from(9), Some("Food"), "2024-01-05"),
        ExpenseRecord::new("dup", Decimal::from(9), Some("Rent"), "2024-01-05"),
        ExpenseRecord::new("dup", Decimal::from(2), Some("Food"), "2024-01-05"),
    ];
    let opts = AnalysisOptions::new(Granularity::Day, range("2024-01-01", "2024-01-07"));
    let forward = serde_json::to_string(&analyze(&records, &opts).unwrap().buckets).unwrap();
    let mut reversed = records.clone();
    reversed.reverse();
    let backward = serde_json::to_string(&analyze(&reversed, &opts).unwrap().buckets).unwrap();
    assert_eq!(forward, backward);
}
