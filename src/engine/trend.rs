// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Period-over-period comparison.
//!
//! Every comparison goes through [`compare`]; what changes between
//! "previous month", "same month last year" and "3-month average" is only the
//! [`Baseline`] handed to it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::{sum_amounts, SeriesPoint};
use super::bucketize::Bucket;
use super::period::PeriodKey;

/// Anything with a period key and a total can be compared.
pub trait PeriodTotal {
    fn key(&self) -> PeriodKey;
    fn total(&self) -> Decimal;
}

impl PeriodTotal for Bucket {
    fn key(&self) -> PeriodKey {
        self.key
    }
    fn total(&self) -> Decimal {
        self.total
    }
}

impl PeriodTotal for SeriesPoint {
    fn key(&self) -> PeriodKey {
        self.key
    }
    fn total(&self) -> Decimal {
        self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComparisonBasis {
    PreviousPeriod,
    PeriodsAgo { periods: usize },
    RollingAverage { window: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Baseline {
    pub basis: ComparisonBasis,
    pub total: Decimal,
    /// The period the baseline was taken from, if it is a single period.
    pub period: Option<PeriodKey>,
}

impl Baseline {
    /// A single period used as the baseline.
    pub fn period(p: &impl PeriodTotal) -> Self {
        Self {
            basis: ComparisonBasis::PreviousPeriod,
            total: p.total(),
            period: Some(p.key()),
        }
    }

    /// The point `periods` steps before `index`, e.g. 12 for year-over-year on
    /// monthly buckets.
    pub fn periods_ago<P: PeriodTotal>(series: &[P], index: usize, periods: usize) -> Option<Self> {
        if periods == 0 {
            return None;
        }
        let p = series.get(index.checked_sub(periods)?)?;
        let basis = if periods == 1 {
            ComparisonBasis::PreviousPeriod
        } else {
            ComparisonBasis::PeriodsAgo { periods }
        };
        Some(Self {
            basis,
            total: p.total(),
            period: Some(p.key()),
        })
    }

    /// Mean of the given points. `None` for an empty window.
    pub fn rolling_average<P: PeriodTotal>(window: &[P]) -> Option<Self> {
        if window.is_empty() {
            return None;
        }
        let sum = sum_amounts(window.iter().map(|p| p.total()));
        let mean = sum.checked_div(Decimal::from(window.len()))?;
        Some(Self {
            basis: ComparisonBasis::RollingAverage {
                window: window.len(),
            },
            total: mean,
            period: None,
        })
    }

    /// Mean of the `window` points immediately before `index`. Requires a full
    /// window.
    pub fn trailing_average<P: PeriodTotal>(series: &[P], index: usize, window: usize) -> Option<Self> {
        if window == 0 || index > series.len() {
            return None;
        }
        let from = index.checked_sub(window)?;
        Self::rolling_average(&series[from..index])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PercentChange {
    Finite(Decimal),
    /// Growth from a zero baseline.
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendDelta {
    pub period: PeriodKey,
    pub basis: ComparisonBasis,
    pub baseline_period: Option<PeriodKey>,
    pub current: Decimal,
    pub previous: Decimal,
    pub percent_change: PercentChange,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendOptions {
    pub rolling_window: usize,
    pub seasonal_lag: Option<usize>,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            rolling_window: 3,
            seasonal_lag: None,
        }
    }
}

/// `(current - previous) / previous * 100`, rounded to two places.
///
/// A zero baseline yields `Finite(0)` when current is zero too, and
/// `Undefined` otherwise.
pub fn percent_change(current: Decimal, previous: Decimal) -> PercentChange {
    if previous.is_zero() {
        return if current.is_zero() {
            PercentChange::Finite(Decimal::ZERO)
        } else {
            PercentChange::Undefined
        };
    }
    (current - previous)
        .checked_div(previous)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| PercentChange::Finite(pct.round_dp(2).normalize()))
        .unwrap_or(PercentChange::Undefined)
}

pub fn compare(current: &impl PeriodTotal, previous: &Baseline) -> TrendDelta {
    let percent_change = percent_change(current.total(), previous.total);
    let direction = match percent_change {
        PercentChange::Undefined => Direction::Increase,
        PercentChange::Finite(v) if v > Decimal::ZERO => Direction::Increase,
        PercentChange::Finite(v) if v < Decimal::ZERO => Direction::Decrease,
        PercentChange::Finite(_) => Direction::Flat,
    };
    TrendDelta {
        period: current.key(),
        basis: previous.basis,
        baseline_period: previous.period,
        current: current.total(),
        previous: previous.total,
        percent_change,
        direction,
    }
}

/// The standard comparisons for the latest point of a series: previous
/// period, trailing average and, when configured, the seasonal lag.
/// Comparisons without enough history are left out.
pub fn trend_deltas(series: &[SeriesPoint], options: &TrendOptions) -> Vec<TrendDelta> {
    let Some(last) = series.len().checked_sub(1) else {
        return Vec::new();
    };
    let current = &series[last];

    let mut baselines = Vec::new();
    baselines.extend(Baseline::periods_ago(series, last, 1));
    baselines.extend(Baseline::trailing_average(series, last, options.rolling_window));
    if let Some(lag) = options.seasonal_lag.filter(|lag| *lag > 1) {
        baselines.extend(Baseline::periods_ago(series, last, lag));
    }

    baselines.iter().map(|b| compare(current, b)).collect()
}
