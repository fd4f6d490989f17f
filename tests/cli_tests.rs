// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde_json::Value;
use spendlens::commands::{self, doctor, exporter, reports, Context};
use spendlens::config::Settings;
use spendlens::source::{load_csv, load_file};
use spendlens::{cli, summary::Summary};
use std::path::Path;
use tempfile::tempdir;

const CSV: &str = "\
id,date,amount,category,description
1,2024-01-05,100,Food,groceries
2,2024-02-10,50.00,Food,
3,2024-02-15,25,Transport,bus pass
4,2024-02-20,oops,Food,
";

fn write_csv(dir: &Path) -> String {
    let path = dir.join("expenses.csv");
    std::fs::write(&path, CSV).unwrap();
    path.to_string_lossy().to_string()
}

fn context(args: &[&str]) -> (Context, clap::ArgMatches) {
    let matches = cli::build_cli().get_matches_from(args.iter().copied());
    let ctx = Context::from_matches(&matches).unwrap();
    (ctx, matches)
}

#[test]
fn csv_loader_reads_header_columns() {
    let dir = tempdir().unwrap();
    let loaded = load_csv(Path::new(&write_csv(dir.path()))).unwrap();
    assert_eq!(loaded.records.len(), 3);
    assert_eq!(loaded.dropped.len(), 1);
    assert_eq!(loaded.records[1].amount, Decimal::from(50));
    assert_eq!(loaded.records[2].description.as_deref(), Some("bus pass"));
}

#[test]
fn export_json_reloads_to_same_records() {
    let dir = tempdir().unwrap();
    let csv = write_csv(dir.path());
    let out = dir.path().join("out.json");
    let out_str = out.to_string_lossy().to_string();
    let cfg = dir.path().join("settings.json");
    let cfg_str = cfg.to_string_lossy().to_string();

    let (ctx, matches) = context(&[
        "spendlens", "--config", &cfg_str, "--file", &csv, "export", "--format", "json", "--out",
        &out_str,
    ]);
    if let Some(("export", sub)) = matches.subcommand() {
        exporter::handle(&ctx, sub).unwrap();
    } else {
        panic!("export subcommand not parsed");
    }

    let v: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(v.as_array().unwrap().len(), 3);
    assert_eq!(v[0]["amount"], "100");

    let original = load_file(Path::new(&csv)).unwrap();
    let reloaded = load_file(&out).unwrap();
    assert_eq!(original.records, reloaded.records);
}

#[test]
fn unknown_export_format_is_an_error() {
    let dir = tempdir().unwrap();
    let err = exporter::export_records(&[], "xml", &dir.path().join("x.xml")).unwrap_err();
    assert!(err.to_string().contains("Unknown format"));
}

#[test]
fn report_window_from_flags() {
    let dir = tempdir().unwrap();
    let csv = write_csv(dir.path());
    let cfg = dir.path().join("settings.json");
    let cfg_str = cfg.to_string_lossy().to_string();

    let (ctx, matches) = context(&[
        "spendlens", "--config", &cfg_str, "--file", &csv, "report", "summary", "--from",
        "2024-01-01", "--to", "2024-02-29", "--json",
    ]);
    let report = match matches.subcommand() {
        Some(("report", r)) => r,
        _ => panic!("report subcommand not parsed"),
    };
    let sub = match report.subcommand() {
        Some(("summary", s)) => s,
        _ => panic!("summary subcommand not parsed"),
    };

    let today = chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let analysis = reports::run_analysis(&ctx, sub, today).unwrap();
    assert_eq!(analysis.buckets.len(), 2);

    let summary = Summary::from_analysis(&analysis, &ctx.settings.suggestion_rules());
    assert_eq!(summary.total_expenses, Decimal::from(175));
    assert_eq!(summary.category_breakdown[0].category, "Food");

    let loaded = ctx.load_records().unwrap();
    let issues = doctor::diagnose(&loaded, &analysis);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0][0], "unreadable_record");
}

#[test]
fn range_preset_picks_natural_granularity() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("settings.json");
    let cfg_str = cfg.to_string_lossy().to_string();
    let (_, matches) = context(&[
        "spendlens", "--config", &cfg_str, "report", "series", "--range", "year", "--as-of",
        "2024-06-15",
    ]);
    let sub = matches
        .subcommand_matches("report")
        .and_then(|r| r.subcommand_matches("series"))
        .unwrap();
    let today = chrono::NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let (g, range, preset) = commands::resolve_window(sub, today).unwrap();
    assert_eq!(g.as_str(), "month");
    assert_eq!(preset.map(|p| p.as_str()), Some("year"));
    assert_eq!(range.end, chrono::NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    assert_eq!(range.start, chrono::NaiveDate::from_ymd_opt(2023, 6, 16).unwrap());
}

#[test]
fn config_set_persists_to_file() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("nested").join("settings.json");
    let cfg_str = cfg.to_string_lossy().to_string();

    let (ctx, matches) = context(&["spendlens", "--config", &cfg_str, "config", "set", "top_n", "5"]);
    if let Some(("config", sub)) = matches.subcommand() {
        commands::settings::handle(&ctx, sub).unwrap();
    }
    let saved = Settings::load_from(&cfg).unwrap();
    assert_eq!(saved.top_n, 5);
    assert_eq!(saved.rolling_window, Settings::default().rolling_window);

    let (ctx, matches) = context(&["spendlens", "--config", &cfg_str, "config", "set", "bogus", "1"]);
    let sub = matches.subcommand_matches("config").unwrap();
    assert!(commands::settings::handle(&ctx, sub).is_err());
}

#[test]
fn config_commands_survive_a_corrupt_settings_file() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("settings.json");
    let cfg_str = cfg.to_string_lossy().to_string();
    std::fs::write(&cfg, "{ not json").unwrap();

    let matches = cli::build_cli()
        .get_matches_from(["spendlens", "--config", cfg_str.as_str(), "report", "series"]);
    assert!(Context::from_matches(&matches).is_err());

    let matches = cli::build_cli().get_matches_from([
        "spendlens",
        "--config",
        cfg_str.as_str(),
        "config",
        "set",
        "top_n",
        "4",
    ]);
    let ctx = Context::from_matches_lenient(&matches).unwrap();
    assert_eq!(ctx.settings.top_n, Settings::default().top_n);
    commands::settings::handle(&ctx, matches.subcommand_matches("config").unwrap()).unwrap();

    let repaired = Settings::load_from(&cfg).unwrap();
    assert_eq!(repaired.top_n, 4);
}

#[test]
fn reconcile_only_accepts_preset_windows() {
    let res = cli::build_cli().try_get_matches_from([
        "spendlens", "report", "summary", "--reconcile", "--from", "2024-01-01", "--to",
        "2024-01-31",
    ]);
    assert!(res.is_err());
    let res = cli::build_cli().try_get_matches_from([
        "spendlens", "report", "summary", "--reconcile", "--range", "week",
    ]);
    assert!(res.is_ok());
}
