// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{anyhow, Result};
use serde_json::json;
use std::path::Path;

use super::Context;
use crate::models::ExpenseRecord;

pub fn handle(ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub
        .get_one::<String>("format")
        .map(|s| s.to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    let out = sub
        .get_one::<String>("out")
        .ok_or_else(|| anyhow!("--out is required"))?;

    let loaded = ctx.load_records()?;
    let n = export_records(&loaded.records, &fmt, Path::new(out))?;
    println!("Exported {} expenses to {}", n, out);
    Ok(())
}

/// Writes records as CSV or JSON, in the shape the file loaders read back.
pub fn export_records(records: &[ExpenseRecord], fmt: &str, out: &Path) -> Result<usize> {
    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "date", "amount", "category", "description"])?;
            for r in records {
                wtr.write_record([
                    r.id.as_str(),
                    r.date.as_str(),
                    &r.amount.to_string(),
                    r.category.as_deref().unwrap_or_default(),
                    r.description.as_deref().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = records
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id, "date": r.date, "amount": r.amount.to_string(),
                        "category": r.category, "description": r.description
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => return Err(anyhow!("Unknown format: {} (use csv|json)", other)),
    }
    Ok(records.len())
}
