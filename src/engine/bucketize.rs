// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::error::EngineError;
use super::period::{parse_record_date, CalendarPeriod, DateRange, Granularity, PeriodKey};
use crate::models::ExpenseRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub key: PeriodKey,
    pub order: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total: Decimal,
    pub records: Vec<ExpenseRecord>,
}

impl Bucket {
    pub fn empty(period: &CalendarPeriod) -> Self {
        Self {
            key: period.key(),
            order: period.order(),
            start: period.start(),
            end: period.end(),
            total: Decimal::ZERO,
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bucketized {
    pub buckets: Vec<Bucket>,
    /// Number of records excluded as invalid.
    pub skipped: usize,
    pub rejected: Vec<EngineError>,
}

/// Validates a record and returns its calendar day.
pub fn record_day(record: &ExpenseRecord) -> Result<NaiveDate, EngineError> {
    let invalid = |reason: String| EngineError::InvalidRecord {
        id: record.id.clone(),
        reason,
    };
    if record.amount < Decimal::ZERO {
        return Err(invalid(format!("negative amount {}", record.amount)));
    }
    parse_record_date(&record.date).map_err(invalid)
}

/// Groups records into one bucket per period of `range`, oldest first.
///
/// Periods without records still get an (empty) bucket. Records outside the
/// range are ignored; invalid records are skipped and reported in the result.
pub fn bucketize(
    records: &[ExpenseRecord],
    granularity: Granularity,
    range: DateRange,
) -> Result<Bucketized, EngineError> {
    range.validate()?;

    let periods = range.periods(granularity);
    let first_order = periods.first().map(|p| p.order()).unwrap_or_default();
    let mut slots: Vec<Vec<(NaiveDate, &ExpenseRecord)>> = vec![Vec::new(); periods.len()];
    let mut rejected = Vec::new();
    let mut outside = 0usize;

    for record in records {
        let day = match record_day(record) {
            Ok(day) => day,
            Err(e) => {
                tracing::warn!("skipping record: {e}");
                rejected.push(e);
                continue;
            }
        };
        if !range.contains(day) {
            outside += 1;
            continue;
        }
        let order = CalendarPeriod::containing(day, granularity).order();
        let slot = usize::try_from(order - first_order)
            .ok()
            .and_then(|i| slots.get_mut(i));
        if let Some(slot) = slot {
            slot.push((day, record));
        }
    }

    // Periods run oldest first and each slot is sorted on the full record, so
    // the running total (and any record it rejects) is independent of input
    // order. Every later sum is bounded by it.
    let mut running = Decimal::ZERO;
    let mut buckets: Vec<Bucket> = Vec::with_capacity(periods.len());
    for (period, mut slot) in periods.iter().zip(slots) {
        slot.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.id.cmp(&b.1.id))
                .then_with(|| a.1.amount.cmp(&b.1.amount))
                .then_with(|| a.1.category.cmp(&b.1.category))
                .then_with(|| a.1.description.cmp(&b.1.description))
                .then_with(|| a.1.date.cmp(&b.1.date))
        });
        let mut bucket = Bucket::empty(period);
        for (_, record) in slot {
            match running.checked_add(record.amount) {
                Some(next) => {
                    running = next;
                    bucket.total += record.amount;
                    bucket.records.push(record.clone());
                }
                None => {
                    let e = EngineError::InvalidRecord {
                        id: record.id.clone(),
                        reason: "amount overflows period total".to_string(),
                    };
                    tracing::warn!("skipping record: {e}");
                    rejected.push(e);
                }
            }
        }
        buckets.push(bucket);
    }

    tracing::debug!(
        granularity = %granularity,
        buckets = buckets.len(),
        skipped = rejected.len(),
        outside,
        "bucketized records"
    );

    Ok(Bucketized {
        buckets,
        skipped: rejected.len(),
        rejected,
    })
}
