// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Where expense records come from: the REST backend or exported files.
//!
//! Amounts are converted to `Decimal` from their JSON/CSV text, never through
//! `f64`. Records whose amount cannot be read are dropped here and reported in
//! [`Loaded::dropped`]; date problems are left for the bucketizer to count.

use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::engine::TimeRange;
use crate::models::{Category, ExpenseRecord};
use crate::summary::RemoteSummary;
use crate::utils::http_client;

/// An expense as the backend sends it. Every field is optional so one bad row
/// cannot fail a whole payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExpense {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub category_id: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct Loaded {
    pub records: Vec<ExpenseRecord>,
    pub dropped: Vec<String>,
}

pub fn decimal_from_value(v: &Value) -> Option<Decimal> {
    let text = match v {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// serde helper for decimal fields that may arrive as numbers or strings.
pub fn decimal_from_json<'de, D>(d: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(d)?;
    decimal_from_value(&v)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal {}", v)))
}

fn id_text(v: &Option<Value>, fallback: usize) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("#{}", fallback),
    }
}

/// Scalar JSON as text; null, arrays and objects give `None`.
fn scalar_text(v: &Option<Value>) -> Option<String> {
    match v {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

fn category_id(v: &Option<Value>) -> Option<i64> {
    match v {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn category_text(raw: &RawExpense, categories: &HashMap<i64, String>) -> Option<String> {
    match &raw.category {
        Some(Value::String(s)) => return Some(s.clone()),
        Some(Value::Object(o)) => {
            if let Some(Value::String(name)) = o.get("name") {
                return Some(name.clone());
            }
        }
        _ => {}
    }
    category_id(&raw.category_id).and_then(|id| categories.get(&id).cloned())
}

/// Converts backend rows into engine records. `categories` resolves rows
/// that carry only a `category_id`.
pub fn decode_expenses(raw: Vec<RawExpense>, categories: &HashMap<i64, String>) -> Loaded {
    let mut out = Loaded::default();
    for (i, r) in raw.into_iter().enumerate() {
        let id = id_text(&r.id, i + 1);
        let amount = match r.amount.as_ref().and_then(decimal_from_value) {
            Some(a) => a,
            None => {
                let reason = format!("record '{}': missing or unreadable amount", id);
                tracing::warn!("{}", reason);
                out.dropped.push(reason);
                continue;
            }
        };
        let category = category_text(&r, categories);
        out.records.push(ExpenseRecord {
            id,
            amount,
            category,
            date: scalar_text(&r.date).unwrap_or_default(),
            description: scalar_text(&r.description),
        });
    }
    out
}

fn category_map(categories: &[Category]) -> HashMap<i64, String> {
    categories.iter().map(|c| (c.id, c.name.clone())).collect()
}

/// Decodes either a bare expense array or an export document
/// `{"expenses": [...], "categories": [...]}`.
pub fn decode_json(text: &str) -> Result<Loaded> {
    let v: Value = serde_json::from_str(text).context("Parse JSON expenses")?;
    match v {
        Value::Array(_) => {
            let raw: Vec<RawExpense> = serde_json::from_value(v)?;
            Ok(decode_expenses(raw, &HashMap::new()))
        }
        Value::Object(mut o) => {
            let raw: Vec<RawExpense> = match o.remove("expenses") {
                Some(e) => serde_json::from_value(e).context("Parse 'expenses' array")?,
                None => return Err(anyhow!("JSON object has no 'expenses' array")),
            };
            let cats: Vec<Category> = match o.remove("categories") {
                Some(c) => serde_json::from_value(c).context("Parse 'categories' array")?,
                None => Vec::new(),
            };
            Ok(decode_expenses(raw, &category_map(&cats)))
        }
        _ => Err(anyhow!("Expected a JSON array or an export object")),
    }
}

pub fn load_json(path: &Path) -> Result<Loaded> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Open JSON {}", path.display()))?;
    decode_json(&text).with_context(|| format!("Load {}", path.display()))
}

/// Loads a CSV with a header row. `date` and `amount` columns are required;
/// `id`, `category` and `description` are optional.
pub fn load_csv(path: &Path) -> Result<Loaded> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let date_col = col("date").context("CSV is missing a 'date' column")?;
    let amount_col = col("amount").context("CSV is missing an 'amount' column")?;
    let id_col = col("id");
    let category_col = col("category");
    let description_col = col("description");

    let mut raw = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let field = |c: Option<usize>| {
            c.and_then(|c| rec.get(c))
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };
        raw.push(RawExpense {
            id: field(id_col).map(Value::String),
            amount: field(Some(amount_col)).map(Value::String),
            category: field(category_col).map(Value::String),
            category_id: None,
            description: field(description_col).map(Value::String),
            date: field(Some(date_col)).map(Value::String),
        });
    }
    Ok(decode_expenses(raw, &HashMap::new()))
}

pub fn load_file(path: &Path) -> Result<Loaded> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    let loaded = match ext.as_deref() {
        Some("csv") => load_csv(path)?,
        Some("json") => load_json(path)?,
        _ => {
            return Err(anyhow!(
                "Unsupported file '{}' (use .csv or .json)",
                path.display()
            ))
        }
    };
    tracing::info!(
        records = loaded.records.len(),
        dropped = loaded.dropped.len(),
        "loaded {}",
        path.display()
    );
    Ok(loaded)
}

/// Blocking client for the expense backend.
pub struct ApiClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client: http_client()?,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn expenses(&self, limit: usize) -> Result<Vec<RawExpense>> {
        let url = self.url(&format!("/expenses/?limit={}", limit));
        let resp = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("GET {}", url))?
            .error_for_status()?;
        let raw: Vec<RawExpense> = resp.json().with_context(|| format!("Decode {}", url))?;
        Ok(raw)
    }

    pub fn categories(&self) -> Result<Vec<Category>> {
        let url = self.url("/categories/");
        let resp = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("GET {}", url))?
            .error_for_status()?;
        let cats: Vec<Category> = resp.json().with_context(|| format!("Decode {}", url))?;
        Ok(cats)
    }

    pub fn summary(&self, range: TimeRange) -> Result<RemoteSummary> {
        let url = self.url(&format!("/analytics/summary?time_range={}", range.as_str()));
        let resp = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("GET {}", url))?
            .error_for_status()?;
        let s: RemoteSummary = resp.json().with_context(|| format!("Decode {}", url))?;
        Ok(s)
    }

    /// Fetches expenses, resolving category ids through `/categories/` only
    /// when some row needs it.
    pub fn load(&self, limit: usize) -> Result<Loaded> {
        let raw = self.expenses(limit)?;
        let needs_names = raw
            .iter()
            .any(|r| r.category.is_none() && category_id(&r.category_id).is_some());
        let names = if needs_names {
            category_map(&self.categories()?)
        } else {
            HashMap::new()
        };
        let loaded = decode_expenses(raw, &names);
        tracing::info!(
            records = loaded.records.len(),
            dropped = loaded.dropped.len(),
            "fetched expenses from {}",
            self.base_url
        );
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_amounts_keep_their_decimal_text() {
        let loaded = decode_json(r#"[{"id": 1, "amount": 0.1, "date": "2024-01-01"}]"#).unwrap();
        assert_eq!(loaded.records[0].amount, Decimal::new(1, 1));
        assert_eq!(loaded.records[0].id, "1");
    }

    #[test]
    fn unreadable_amounts_are_dropped() {
        let loaded = decode_json(
            r#"[{"id": 1, "amount": "abc", "date": "2024-01-01"},
                {"id": 2, "date": "2024-01-01"},
                {"id": 3, "amount": "12.50", "date": "2024-01-01"}]"#,
        )
        .unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.dropped.len(), 2);
    }

    #[test]
    fn export_document_resolves_category_ids() {
        let loaded = decode_json(
            r#"{"expenses": [
                    {"id": 1, "amount": 5, "date": "2024-01-01", "category_id": 7},
                    {"id": 2, "amount": 5, "date": "2024-01-01", "category": {"id": 8, "name": "Rent"}},
                    {"id": 3, "amount": 5, "date": "2024-01-01", "category_id": 99}
                ],
                "categories": [{"id": 7, "name": "Food"}]}"#,
        )
        .unwrap();
        let cats: Vec<&str> = loaded.records.iter().map(|r| r.category_name()).collect();
        assert_eq!(cats, vec!["Food", "Rent", "Uncategorized"]);
    }

    #[test]
    fn api_urls_are_joined_cleanly() {
        let c = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(c.url("/categories/"), "http://localhost:8000/categories/");
    }

    #[test]
    fn loosely_typed_fields_do_not_fail_the_payload() {
        let loaded = decode_json(
            r#"{"expenses": [
                    {"id": 1, "amount": 5, "date": 20240101, "category_id": "7", "description": 42},
                    {"id": 2, "amount": 5, "date": "2024-01-02", "category_id": [1], "description": null}
                ],
                "categories": [{"id": 7, "name": "Food"}]}"#,
        )
        .unwrap();
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(loaded.records[0].date, "20240101");
        assert_eq!(loaded.records[0].category_name(), "Food");
        assert_eq!(loaded.records[0].description.as_deref(), Some("42"));
        assert_eq!(loaded.records[1].category_name(), "Uncategorized");
        assert_eq!(loaded.records[1].description, None);
    }
}
