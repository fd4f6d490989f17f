// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;

use super::Context;
use crate::config::Settings;
use crate::utils::pretty_table;

pub fn handle(ctx: &Context, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let rows = ctx
                .settings
                .entries()
                .into_iter()
                .map(|(k, v)| vec![k.to_string(), v])
                .collect();
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        Some(("path", _)) => println!("{}", ctx.settings_path.display()),
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").map(String::as_str).unwrap_or("");
            let value = sub.get_one::<String>("value").map(String::as_str).unwrap_or("");
            // Env overrides stay out of the file; a corrupt file is replaced.
            let mut s = Settings::load_from(&ctx.settings_path).unwrap_or_else(|e| {
                tracing::warn!("{:#}; starting from defaults", e);
                Settings::default()
            });
            s.set(key, value)?;
            s.save_to(&ctx.settings_path)?;
            println!("Set {} in {}", key, ctx.settings_path.display());
        }
        _ => {}
    }
    Ok(())
}
