// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::aggregate::{sum_amounts, CategoryTotal, SeriesPoint};
use super::period::PeriodKey;
use super::trend::TrendDelta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightOptions {
    pub top_n: usize,
    /// How many leading categories the concentration ratio covers.
    pub concentration_top: usize,
}

impl Default for InsightOptions {
    fn default() -> Self {
        Self {
            top_n: 3,
            concentration_top: 2,
        }
    }
}

/// A structured observation. Wording is left to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Insight {
    TopCategory {
        rank: usize,
        category: String,
        total: Decimal,
        share: Decimal,
    },
    ConcentrationRatio {
        categories: Vec<String>,
        total: Decimal,
        share: Decimal,
    },
    TrendComparison {
        delta: TrendDelta,
    },
    PeakPeriod {
        period: PeriodKey,
        start: NaiveDate,
        end: NaiveDate,
        total: Decimal,
    },
}

/// Percentage of `whole` held by `part`, two places. Callers guarantee a
/// positive `whole`.
fn share(part: Decimal, whole: Decimal) -> Option<Decimal> {
    part.checked_div(whole)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(2).normalize())
}

pub fn generate_insights(
    series: &[SeriesPoint],
    categories: &[CategoryTotal],
    deltas: &[TrendDelta],
    options: &InsightOptions,
) -> Vec<Insight> {
    let mut out = Vec::new();

    let mut ranked: Vec<&CategoryTotal> = categories
        .iter()
        .filter(|c| c.total > Decimal::ZERO)
        .collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    let spend = sum_amounts(ranked.iter().map(|c| c.total));

    if spend > Decimal::ZERO {
        for (i, c) in ranked.iter().take(options.top_n).enumerate() {
            if let Some(share) = share(c.total, spend) {
                out.push(Insight::TopCategory {
                    rank: i + 1,
                    category: c.category.clone(),
                    total: c.total,
                    share,
                });
            }
        }

        if options.concentration_top > 0 {
            let top: Vec<&CategoryTotal> =
                ranked.iter().take(options.concentration_top).copied().collect();
            let total = sum_amounts(top.iter().map(|c| c.total));
            if let Some(share) = share(total, spend) {
                out.push(Insight::ConcentrationRatio {
                    categories: top.iter().map(|c| c.category.clone()).collect(),
                    total,
                    share,
                });
            }
        }
    }

    for delta in deltas {
        if delta.current.is_zero() && delta.previous.is_zero() {
            continue;
        }
        out.push(Insight::TrendComparison {
            delta: delta.clone(),
        });
    }

    let peak = series
        .iter()
        .max_by(|a, b| a.total.cmp(&b.total).then_with(|| b.order.cmp(&a.order)));
    if let Some(peak) = peak.filter(|p| p.total > Decimal::ZERO) {
        out.push(Insight::PeakPeriod {
            period: peak.key,
            start: peak.start,
            end: peak.end,
            total: peak.total,
        });
    }

    tracing::debug!(insights = out.len(), "generated insights");
    out
}
