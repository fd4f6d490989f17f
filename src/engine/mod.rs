// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The aggregation and insight engine.
//!
//! Four pure stages run in order: [`bucketize`] → [`aggregate`] →
//! [`compare`] / [`trend_deltas`] → [`generate_insights`]. None of them keep
//! state between calls; [`analyze`] chains them for the common case.

pub mod aggregate;
pub mod bucketize;
pub mod error;
pub mod insights;
pub mod period;
pub mod trend;

use serde::{Deserialize, Serialize};

use crate::models::ExpenseRecord;

pub use aggregate::{aggregate, Aggregation, CategoryTotal, SeriesPoint};
pub use bucketize::{bucketize, Bucket, Bucketized};
pub use error::EngineError;
pub use insights::{generate_insights, Insight, InsightOptions};
pub use period::{DateRange, Granularity, PeriodKey, TimeRange};
pub use trend::{
    compare, trend_deltas, Baseline, ComparisonBasis, Direction, PercentChange, TrendDelta,
    TrendOptions,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub granularity: Granularity,
    pub range: DateRange,
    pub trend: TrendOptions,
    pub insights: InsightOptions,
}

impl AnalysisOptions {
    pub fn new(granularity: Granularity, range: DateRange) -> Self {
        Self {
            granularity,
            range,
            trend: TrendOptions::default(),
            insights: InsightOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub granularity: Granularity,
    pub range: DateRange,
    pub buckets: Vec<Bucket>,
    pub skipped: usize,
    pub rejected: Vec<EngineError>,
    pub aggregation: Aggregation,
    pub deltas: Vec<TrendDelta>,
    pub insights: Vec<Insight>,
}

/// Runs the full pipeline over an in-memory record list.
pub fn analyze(
    records: &[ExpenseRecord],
    options: &AnalysisOptions,
) -> Result<Analysis, EngineError> {
    let Bucketized {
        buckets,
        skipped,
        rejected,
    } = bucketize(records, options.granularity, options.range)?;
    let aggregation = aggregate(&buckets);
    let deltas = trend_deltas(&aggregation.series, &options.trend);
    let insights = generate_insights(
        &aggregation.series,
        &aggregation.categories,
        &deltas,
        &options.insights,
    );

    if !aggregation.is_conserved() {
        tracing::error!(
            series = %aggregation.grand_total(),
            categories = %aggregation.category_total(),
            "category and period totals disagree"
        );
    }

    Ok(Analysis {
        granularity: options.granularity,
        range: options.range,
        buckets,
        skipped,
        rejected,
        aggregation,
        deltas,
        insights,
    })
}
