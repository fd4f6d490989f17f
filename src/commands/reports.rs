// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{anyhow, Context as _, Result};
use chrono::NaiveDate;
use clap::ArgMatches;
use rust_decimal::Decimal;
use serde_json::json;

use super::{analysis_options, resolve_window, today, Context};
use crate::engine::{analyze, Analysis, Insight};
use crate::summary::{reconcile, Summary};
use crate::utils::{fmt_basis, fmt_money, fmt_percent, maybe_print_json, pretty_table};

pub fn handle(ctx: &Context, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("series", sub)) => series(ctx, sub)?,
        Some(("categories", sub)) => categories(ctx, sub)?,
        Some(("trend", sub)) => trend(ctx, sub)?,
        Some(("insights", sub)) => insights(ctx, sub)?,
        Some(("summary", sub)) => summary(ctx, sub)?,
        _ => {}
    }
    Ok(())
}

/// Loads records and runs the pipeline for the window described by `sub`.
pub fn run_analysis(ctx: &Context, sub: &ArgMatches, today: NaiveDate) -> Result<Analysis> {
    let opts = analysis_options(ctx, sub, today)?;
    let loaded = ctx.load_records()?;
    let analysis = analyze(&loaded.records, &opts)?;
    let skipped = analysis.skipped + loaded.dropped.len();
    if skipped > 0 {
        eprintln!("note: {} record(s) skipped; run `spendlens doctor` for details", skipped);
    }
    Ok(analysis)
}

fn series(ctx: &Context, sub: &ArgMatches) -> Result<()> {
    let analysis = run_analysis(ctx, sub, today())?;
    let series = &analysis.aggregation.series;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), series)? {
        let ccy = &ctx.settings.currency;
        let rows = series
            .iter()
            .map(|p| {
                vec![
                    p.key.to_string(),
                    p.start.to_string(),
                    p.end.to_string(),
                    p.count.to_string(),
                    fmt_money(&p.total, ccy),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Period", "From", "To", "Records", "Total"], rows)
        );
    }
    Ok(())
}

fn categories(ctx: &Context, sub: &ArgMatches) -> Result<()> {
    let analysis = run_analysis(ctx, sub, today())?;
    let agg = &analysis.aggregation;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &agg.categories)? {
        let spend = agg.category_total();
        let ccy = &ctx.settings.currency;
        let rows = agg
            .categories
            .iter()
            .map(|c| {
                let share = if spend.is_zero() {
                    "-".to_string()
                } else {
                    format!("{:.1}%", c.total / spend * Decimal::ONE_HUNDRED)
                };
                vec![
                    c.category.clone(),
                    c.count.to_string(),
                    fmt_money(&c.total, ccy),
                    share,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Records", "Total", "Share"], rows)
        );
    }
    Ok(())
}

fn trend(ctx: &Context, sub: &ArgMatches) -> Result<()> {
    let analysis = run_analysis(ctx, sub, today())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &analysis.deltas)? {
        if analysis.deltas.is_empty() {
            println!("Not enough periods to compare.");
            return Ok(());
        }
        let ccy = &ctx.settings.currency;
        let rows = analysis
            .deltas
            .iter()
            .map(|d| {
                vec![
                    fmt_basis(&d.basis),
                    d.period.to_string(),
                    d.baseline_period
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    fmt_money(&d.current, ccy),
                    fmt_money(&d.previous, ccy),
                    fmt_percent(&d.percent_change),
                    format!("{:?}", d.direction).to_lowercase(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Basis", "Period", "Baseline", "Current", "Previous", "Change", "Direction"],
                rows
            )
        );
    }
    Ok(())
}

pub fn insight_row(insight: &Insight, ccy: &str) -> Vec<String> {
    match insight {
        Insight::TopCategory {
            rank,
            category,
            total,
            share,
        } => vec![
            "top_category".into(),
            format!("#{} {}: {} ({}%)", rank, category, fmt_money(total, ccy), share),
        ],
        Insight::ConcentrationRatio {
            categories, share, ..
        } => vec![
            "concentration".into(),
            format!("{} hold {}% of spending", categories.join(" + "), share),
        ],
        Insight::TrendComparison { delta } => vec![
            "trend".into(),
            format!(
                "{} vs {}: {} ({})",
                delta.period,
                fmt_basis(&delta.basis),
                fmt_percent(&delta.percent_change),
                format!("{:?}", delta.direction).to_lowercase()
            ),
        ],
        Insight::PeakPeriod { period, total, .. } => vec![
            "peak_period".into(),
            format!("{}: {}", period, fmt_money(total, ccy)),
        ],
    }
}

fn insights(ctx: &Context, sub: &ArgMatches) -> Result<()> {
    let analysis = run_analysis(ctx, sub, today())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &analysis.insights)? {
        if analysis.insights.is_empty() {
            println!("No insights for this window.");
            return Ok(());
        }
        let rows = analysis
            .insights
            .iter()
            .map(|i| insight_row(i, &ctx.settings.currency))
            .collect();
        println!("{}", pretty_table(&["Insight", "Detail"], rows));
    }
    Ok(())
}

fn summary(ctx: &Context, sub: &ArgMatches) -> Result<()> {
    let today = today();
    let analysis = run_analysis(ctx, sub, today)?;
    let local = Summary::from_analysis(&analysis, &ctx.settings.suggestion_rules());

    let discrepancies = if sub.get_flag("reconcile") {
        // The server only summarizes its own presets.
        let (_, _, preset) = resolve_window(sub, today)?;
        let preset = preset.ok_or_else(|| anyhow!("--reconcile needs a --range window"))?;
        let remote = ctx
            .api()?
            .summary(preset)
            .context("Fetch server summary for reconciliation")?;
        Some(reconcile(&local, &remote))
    } else {
        None
    };

    let out = json!({ "summary": local, "discrepancies": discrepancies });
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &out)? {
        return Ok(());
    }

    let ccy = &ctx.settings.currency;
    println!("Total: {}", fmt_money(&local.total_expenses, ccy));
    let cat_rows = local
        .category_breakdown
        .iter()
        .map(|c| vec![c.category.clone(), fmt_money(&c.total, ccy)])
        .collect();
    println!("{}", pretty_table(&["Category", "Total"], cat_rows));
    let trend_rows = local
        .trend()
        .iter()
        .map(|p| vec![p.period.clone(), fmt_money(&p.total, ccy)])
        .collect();
    println!("{}", pretty_table(&["Period", "Total"], trend_rows));
    for s in &local.optimization_suggestions {
        println!("suggestion: {}", serde_json::to_string(s)?);
    }
    if let Some(ds) = discrepancies {
        if ds.is_empty() {
            println!("✅ server summary agrees");
        } else {
            let rows = ds
                .iter()
                .map(|d| {
                    let (k, v) = d.describe();
                    vec![k, v]
                })
                .collect();
            println!("{}", pretty_table(&["Discrepancy", "Detail"], rows));
        }
    }
    Ok(())
}
