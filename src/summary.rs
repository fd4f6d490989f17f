// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The backend's `/analytics/summary` shape, computed locally, and a
//! reconciliation against what the server reports.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::{Aggregation, Analysis, Granularity};
use crate::models::UNCATEGORIZED;
use crate::source::decimal_from_json;

/// Differences up to one cent are rounding, not disagreement.
const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    #[serde(alias = "month", alias = "week", alias = "date")]
    pub period: String,
    #[serde(deserialize_with = "decimal_from_json")]
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRules {
    pub review_threshold: Decimal,
    pub category_limit: usize,
}

impl Default for SuggestionRules {
    fn default() -> Self {
        Self {
            review_threshold: Decimal::from(1000),
            category_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Suggestion {
    ReviewSpending {
        total: Decimal,
        threshold: Decimal,
    },
    ConsolidateCategories {
        count: usize,
        limit: usize,
    },
    #[serde(rename_all = "camelCase")]
    DominantCategory {
        category: String,
        total: Decimal,
        runner_up: String,
        runner_up_total: Decimal,
    },
}

pub fn suggestions(aggregation: &Aggregation, rules: &SuggestionRules) -> Vec<Suggestion> {
    let mut out = Vec::new();
    let total = aggregation.grand_total();
    if total > rules.review_threshold {
        out.push(Suggestion::ReviewSpending {
            total,
            threshold: rules.review_threshold,
        });
    }
    let count = aggregation.categories.len();
    if count > rules.category_limit {
        out.push(Suggestion::ConsolidateCategories {
            count,
            limit: rules.category_limit,
        });
    }
    // categories are already ranked largest first
    if let [top, second, ..] = aggregation.categories.as_slice() {
        if second.total.checked_mul(Decimal::TWO).is_some_and(|twice| top.total > twice) {
            out.push(Suggestion::DominantCategory {
                category: top.category.clone(),
                total: top.total,
                runner_up: second.category.clone(),
                runner_up_total: second.total,
            });
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Bucket size behind the trend; decides which server trend is comparable.
    #[serde(skip)]
    pub granularity: Granularity,
    pub total_expenses: Decimal,
    pub category_breakdown: Vec<CategoryBreakdown>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub monthly_trend: Vec<TrendPoint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weekly_trends: Vec<TrendPoint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub daily_trend: Vec<TrendPoint>,
    pub optimization_suggestions: Vec<Suggestion>,
}

impl Summary {
    pub fn from_analysis(analysis: &Analysis, rules: &SuggestionRules) -> Self {
        let agg = &analysis.aggregation;
        let trend: Vec<TrendPoint> = agg
            .series
            .iter()
            .map(|p| TrendPoint {
                period: p.key.to_string(),
                total: p.total,
            })
            .collect();
        let (mut monthly_trend, mut weekly_trends, mut daily_trend) =
            (Vec::new(), Vec::new(), Vec::new());
        match analysis.granularity {
            Granularity::Month => monthly_trend = trend,
            Granularity::Week => weekly_trends = trend,
            Granularity::Day => daily_trend = trend,
        }
        Self {
            granularity: analysis.granularity,
            total_expenses: agg.grand_total(),
            category_breakdown: agg
                .categories
                .iter()
                .map(|c| CategoryBreakdown {
                    category: c.category.clone(),
                    total: c.total,
                })
                .collect(),
            monthly_trend,
            weekly_trends,
            daily_trend,
            optimization_suggestions: suggestions(agg, rules),
        }
    }

    pub fn trend(&self) -> &[TrendPoint] {
        [&self.monthly_trend, &self.weekly_trends, &self.daily_trend]
            .into_iter()
            .find(|t| !t.is_empty())
            .map(|t| t.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCategory {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(deserialize_with = "decimal_from_json")]
    pub total: Decimal,
}

/// What the server reports. Suggestions are free text there and are not
/// compared.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSummary {
    #[serde(deserialize_with = "decimal_from_json")]
    pub total_expenses: Decimal,
    #[serde(default)]
    pub category_breakdown: Vec<RemoteCategory>,
    #[serde(default)]
    pub monthly_trend: Vec<TrendPoint>,
    #[serde(default)]
    pub weekly_trends: Vec<TrendPoint>,
    #[serde(default)]
    pub optimization_suggestions: Vec<serde_json::Value>,
}

impl RemoteSummary {
    /// The server trend bucketed like `granularity`. The server has no daily
    /// trend.
    fn trend_for(&self, granularity: Granularity) -> &[TrendPoint] {
        match granularity {
            Granularity::Month => &self.monthly_trend,
            Granularity::Week => &self.weekly_trends,
            Granularity::Day => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Discrepancy {
    TotalMismatch {
        local: Decimal,
        remote: Decimal,
    },
    CategoryMismatch {
        category: String,
        local: Decimal,
        remote: Decimal,
    },
    CategoryMissingLocally {
        category: String,
        remote: Decimal,
    },
    CategoryMissingRemotely {
        category: String,
        local: Decimal,
    },
    TrendMismatch {
        period: String,
        local: Decimal,
        remote: Option<Decimal>,
    },
}

impl Discrepancy {
    /// (kind, detail) for table output.
    pub fn describe(&self) -> (String, String) {
        match self {
            Discrepancy::TotalMismatch { local, remote } => (
                "total_mismatch".into(),
                format!("local {:.2} vs server {:.2}", local, remote),
            ),
            Discrepancy::CategoryMismatch {
                category,
                local,
                remote,
            } => (
                "category_mismatch".into(),
                format!("{}: local {:.2} vs server {:.2}", category, local, remote),
            ),
            Discrepancy::CategoryMissingLocally { category, remote } => (
                "category_missing_locally".into(),
                format!("{}: server {:.2}", category, remote),
            ),
            Discrepancy::CategoryMissingRemotely { category, local } => (
                "category_missing_remotely".into(),
                format!("{}: local {:.2}", category, local),
            ),
            Discrepancy::TrendMismatch {
                period,
                local,
                remote,
            } => (
                "trend_mismatch".into(),
                match remote {
                    Some(r) => format!("{}: local {:.2} vs server {:.2}", period, local, r),
                    None => format!("{}: local {:.2}, absent on server", period, local),
                },
            ),
        }
    }
}

fn differs(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() > TOLERANCE
}

/// Compares a locally computed summary with the server's.
///
/// Trends are compared only when the server reports one at the local
/// granularity. Server trend points outside the local periods are ignored,
/// since the server may cover a wider window than the records fetched.
pub fn reconcile(local: &Summary, remote: &RemoteSummary) -> Vec<Discrepancy> {
    let mut out = Vec::new();

    if differs(local.total_expenses, remote.total_expenses) {
        out.push(Discrepancy::TotalMismatch {
            local: local.total_expenses,
            remote: remote.total_expenses,
        });
    }

    let remote_cats: Vec<(String, Decimal)> = remote
        .category_breakdown
        .iter()
        .map(|c| {
            let name = c
                .category
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNCATEGORIZED);
            (name.to_string(), c.total)
        })
        .collect();

    for c in &local.category_breakdown {
        match remote_cats.iter().find(|(name, _)| *name == c.category) {
            Some((_, r)) if differs(c.total, *r) => out.push(Discrepancy::CategoryMismatch {
                category: c.category.clone(),
                local: c.total,
                remote: *r,
            }),
            Some(_) => {}
            None => out.push(Discrepancy::CategoryMissingRemotely {
                category: c.category.clone(),
                local: c.total,
            }),
        }
    }
    for (name, total) in &remote_cats {
        if !local.category_breakdown.iter().any(|c| c.category == *name) {
            out.push(Discrepancy::CategoryMissingLocally {
                category: name.clone(),
                remote: *total,
            });
        }
    }

    let remote_trend = remote.trend_for(local.granularity);
    if remote_trend.is_empty() {
        tracing::debug!(
            granularity = %local.granularity,
            "server has no comparable trend, skipping trend check"
        );
    } else {
        for p in local.trend() {
            let remote_total = remote_trend
                .iter()
                .find(|r| r.period == p.period)
                .map(|r| r.total);
            let mismatch = match remote_total {
                Some(r) => differs(p.total, r),
                None => !p.total.is_zero(),
            };
            if mismatch {
                out.push(Discrepancy::TrendMismatch {
                    period: p.period.clone(),
                    local: p.total,
                    remote: remote_total,
                });
            }
        }
    }

    for d in &out {
        let (kind, detail) = d.describe();
        tracing::warn!("{}: {}", kind, detail);
    }
    out
}
