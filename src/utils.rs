// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;

use crate::engine::{ComparisonBasis, PercentChange};

const UA: &str = concat!("spendlens/", env!("CARGO_PKG_VERSION"));

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
}

pub fn fmt_percent(p: &PercentChange) -> String {
    match p {
        PercentChange::Finite(v) => format!("{:+.2}%", v),
        PercentChange::Undefined => "new".to_string(),
    }
}

pub fn fmt_basis(b: &ComparisonBasis) -> String {
    match b {
        ComparisonBasis::PreviousPeriod => "previous period".to_string(),
        ComparisonBasis::PeriodsAgo { periods } => format!("{} periods ago", periods),
        ComparisonBasis::RollingAverage { window } => format!("{}-period average", window),
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_formatting() {
        assert_eq!(fmt_percent(&PercentChange::Finite(Decimal::from(-25))), "-25.00%");
        assert_eq!(fmt_percent(&PercentChange::Finite(Decimal::new(1234, 2))), "+12.34%");
        assert_eq!(fmt_percent(&PercentChange::Undefined), "new");
    }

    #[test]
    fn money_formatting_pads_cents() {
        assert_eq!(fmt_money(&Decimal::from(5), "USD"), "USD 5.00");
        assert!(parse_decimal("abc").is_err());
        assert!(parse_date("2024-13-01").is_err());
    }
}
