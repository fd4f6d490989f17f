// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use serde::Serialize;

/// Errors surfaced by the engine.
///
/// Only [`EngineError::InvalidRange`] fails a whole call. Invalid records are
/// collected alongside the result and never abort bucketing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineError {
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid record '{id}': {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("unknown granularity '{value}', expected day|week|month")]
    UnknownGranularity { value: String },

    #[error("unknown time range '{value}', expected week|month|year")]
    UnknownTimeRange { value: String },
}
