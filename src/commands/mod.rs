// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod doctor;
pub mod exporter;
pub mod reports;
pub mod settings;

use anyhow::Result;
use chrono::NaiveDate;
use clap::ArgMatches;
use std::path::PathBuf;

use crate::config::{config_path, Settings};
use crate::engine::{AnalysisOptions, DateRange, Granularity, TimeRange};
use crate::source::{load_file, ApiClient, Loaded};
use crate::utils::parse_date;

/// What every command needs: settings and where records come from.
pub struct Context {
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub file: Option<PathBuf>,
}

impl Context {
    pub fn from_matches(m: &ArgMatches) -> Result<Self> {
        let settings_path = Self::settings_path(m)?;
        let settings = Settings::load(&settings_path)?;
        Ok(Self::build(m, settings, settings_path))
    }

    /// Like [`Context::from_matches`], but an unreadable settings file falls
    /// back to defaults so `config` can still inspect and repair it.
    pub fn from_matches_lenient(m: &ArgMatches) -> Result<Self> {
        let settings_path = Self::settings_path(m)?;
        let settings = Settings::load_or_default(&settings_path);
        Ok(Self::build(m, settings, settings_path))
    }

    fn settings_path(m: &ArgMatches) -> Result<PathBuf> {
        match m.get_one::<String>("config") {
            Some(p) => Ok(PathBuf::from(p.trim())),
            None => config_path(),
        }
    }

    fn build(m: &ArgMatches, settings: Settings, settings_path: PathBuf) -> Self {
        Self {
            settings,
            settings_path,
            file: m.get_one::<String>("file").map(|f| PathBuf::from(f.trim())),
        }
    }

    pub fn api(&self) -> Result<ApiClient> {
        ApiClient::new(&self.settings.api_url)
    }

    pub fn load_records(&self) -> Result<Loaded> {
        match &self.file {
            Some(path) => load_file(path),
            None => self.api()?.load(self.settings.fetch_limit),
        }
    }
}

/// Resolves the window flags into a granularity and date range.
///
/// Explicit `--from/--to` win; otherwise `--range` (default month) ending on
/// `--as-of` (default `today`). The preset is returned so callers can ask the
/// backend for the matching summary.
pub fn resolve_window(
    sub: &ArgMatches,
    today: NaiveDate,
) -> Result<(Granularity, DateRange, Option<TimeRange>)> {
    let granularity = match sub.get_one::<String>("granularity") {
        Some(g) => Some(g.parse::<Granularity>()?),
        None => None,
    };

    if let (Some(from), Some(to)) = (
        sub.get_one::<String>("from"),
        sub.get_one::<String>("to"),
    ) {
        let range = DateRange::new(parse_date(from)?, parse_date(to)?)?;
        return Ok((granularity.unwrap_or(Granularity::Month), range, None));
    }

    let preset = match sub.get_one::<String>("range") {
        Some(r) => r.parse::<TimeRange>()?,
        None => TimeRange::Month,
    };
    let as_of = match sub.get_one::<String>("as-of") {
        Some(d) => parse_date(d)?,
        None => today,
    };
    Ok((
        granularity.unwrap_or_else(|| preset.granularity()),
        preset.window(as_of),
        Some(preset),
    ))
}

pub fn analysis_options(ctx: &Context, sub: &ArgMatches, today: NaiveDate) -> Result<AnalysisOptions> {
    let (granularity, range, _) = resolve_window(sub, today)?;
    let mut opts = AnalysisOptions {
        granularity,
        range,
        trend: ctx.settings.trend_options(),
        insights: ctx.settings.insight_options(),
    };
    // Per-command overrides; not every subcommand defines these.
    if let Some(w) = sub.try_get_one::<usize>("window").ok().flatten() {
        opts.trend.rolling_window = *w;
    }
    if let Some(l) = sub.try_get_one::<usize>("lag").ok().flatten() {
        opts.trend.seasonal_lag = Some(*l);
    }
    if let Some(t) = sub.try_get_one::<usize>("top").ok().flatten() {
        opts.insights.top_n = *t;
    }
    Ok(opts)
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
