// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn output_args() -> [Arg; 2] {
    [
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON instead of a table"),
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON document per line"),
    ]
}

fn window_args() -> [Arg; 5] {
    [
        Arg::new("granularity")
            .long("granularity")
            .short('g')
            .value_parser(["day", "week", "month"])
            .help("Bucket size (defaults to month, or to the range's natural size)"),
        Arg::new("from")
            .long("from")
            .requires("to")
            .help("First day of the window, YYYY-MM-DD"),
        Arg::new("to")
            .long("to")
            .requires("from")
            .help("Last day of the window, YYYY-MM-DD"),
        Arg::new("range")
            .long("range")
            .value_parser(["week", "month", "year"])
            .conflicts_with_all(["from", "to"])
            .help("Preset window ending on --as-of [default: month]"),
        Arg::new("as-of")
            .long("as-of")
            .conflicts_with_all(["from", "to"])
            .help("Anchor day for --range, YYYY-MM-DD [default: today]"),
    ]
}

pub fn build_cli() -> Command {
    Command::new("spendlens")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Expense bucketing, trends and insights")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging on stderr"),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .short('f')
                .global(true)
                .help("Read expenses from a .csv or .json file instead of the backend"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Settings file to use instead of the platform default"),
        )
        .subcommand(
            Command::new("report")
                .about("Aggregate expenses and print results")
                .subcommand(
                    Command::new("series")
                        .about("Totals per period")
                        .args(window_args())
                        .args(output_args()),
                )
                .subcommand(
                    Command::new("categories")
                        .about("Totals per category")
                        .args(window_args())
                        .args(output_args()),
                )
                .subcommand(
                    Command::new("trend")
                        .about("Compare the latest period against its baselines")
                        .args(window_args())
                        .args(output_args())
                        .arg(
                            Arg::new("window")
                                .long("window")
                                .value_parser(value_parser!(usize))
                                .help("Periods in the rolling average"),
                        )
                        .arg(
                            Arg::new("lag")
                                .long("lag")
                                .value_parser(value_parser!(usize))
                                .help("Also compare with the period this many steps back"),
                        ),
                )
                .subcommand(
                    Command::new("insights")
                        .about("Structured observations about the window")
                        .args(window_args())
                        .args(output_args())
                        .arg(
                            Arg::new("top")
                                .long("top")
                                .value_parser(value_parser!(usize))
                                .help("Number of top categories"),
                        ),
                )
                .subcommand(
                    Command::new("summary")
                        .about("The analytics summary computed locally")
                        .args(window_args())
                        .args(output_args())
                        .arg(
                            Arg::new("reconcile")
                                .long("reconcile")
                                .action(ArgAction::SetTrue)
                                .conflicts_with_all(["from", "to"])
                                .help("Compare with the backend's /analytics/summary (preset windows only)"),
                        ),
                ),
        )
        .subcommand(
            Command::new("doctor")
                .about("Check input quality and engine invariants")
                .args(window_args()),
        )
        .subcommand(
            Command::new("export")
                .about("Write the loaded expenses to a file")
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("csv")
                        .help("csv|json"),
                )
                .arg(Arg::new("out").long("out").required(true)),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change settings")
                .subcommand(Command::new("show"))
                .subcommand(Command::new("path"))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
}
