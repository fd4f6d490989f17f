// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;
use std::collections::HashMap;

use super::{analysis_options, today, Context};
use crate::engine::aggregate::sum_amounts;
use crate::engine::{analyze, Analysis};
use crate::source::Loaded;
use crate::utils::pretty_table;

/// Lists input problems and broken invariants as `[issue, detail]` rows.
pub fn diagnose(loaded: &Loaded, analysis: &Analysis) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    // 1) Rows the loader could not read
    for reason in &loaded.dropped {
        rows.push(vec!["unreadable_record".into(), reason.clone()]);
    }

    // 2) Rows the bucketizer rejected
    for err in &analysis.rejected {
        rows.push(vec!["invalid_record".into(), err.to_string()]);
    }

    // 3) Duplicate ids
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for r in &loaded.records {
        *seen.entry(r.id.as_str()).or_default() += 1;
    }
    let mut dups: Vec<_> = seen.into_iter().filter(|(_, n)| *n > 1).collect();
    dups.sort();
    for (id, n) in dups {
        rows.push(vec!["duplicate_id".into(), format!("'{}' appears {} times", id, n)]);
    }

    // 4) Series must be contiguous and each bucket must sum its records
    for pair in analysis.buckets.windows(2) {
        if pair[1].order != pair[0].order + 1 {
            rows.push(vec![
                "series_gap".into(),
                format!("{} -> {}", pair[0].key, pair[1].key),
            ]);
        }
    }
    for b in &analysis.buckets {
        let sum = sum_amounts(b.records.iter().map(|r| r.amount));
        if sum != b.total {
            rows.push(vec![
                "bucket_total_mismatch".into(),
                format!("{}: total {} but records sum to {}", b.key, b.total, sum),
            ]);
        }
    }

    // 5) Conservation between the two views
    let agg = &analysis.aggregation;
    if !agg.is_conserved() {
        rows.push(vec![
            "totals_mismatch".into(),
            format!(
                "periods sum to {} but categories sum to {}",
                agg.grand_total(),
                agg.category_total()
            ),
        ]);
    }
    rows
}

pub fn handle(ctx: &Context, sub: &ArgMatches) -> Result<()> {
    let opts = analysis_options(ctx, sub, today())?;
    let loaded = ctx.load_records()?;
    let analysis = analyze(&loaded.records, &opts)?;
    let rows = diagnose(&loaded, &analysis);

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
