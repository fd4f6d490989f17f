// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category label for records that carry none.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub amount: Decimal,
    pub category: Option<String>,
    pub date: String, // as delivered by the source; parsed when bucketed
    pub description: Option<String>,
}

impl ExpenseRecord {
    pub fn new(
        id: impl Into<String>,
        amount: Decimal,
        category: Option<&str>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            category: category.map(|c| c.to_string()),
            date: date.into(),
            description: None,
        }
    }

    /// The grouping label, with blank or missing categories folded into
    /// [`UNCATEGORIZED`].
    pub fn category_name(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => UNCATEGORIZED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}
