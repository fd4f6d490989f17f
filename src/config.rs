// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{InsightOptions, TrendOptions};
use crate::summary::SuggestionRules;
use crate::utils::parse_decimal;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.spendlens", "Spendlens", "spendlens"));

pub const API_URL_ENV: &str = "SPENDLENS_API_URL";

pub fn config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific config dir")?;
    Ok(proj.config_dir().join("settings.json"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub fetch_limit: usize,
    pub rolling_window: usize,
    pub top_n: usize,
    pub concentration_top: usize,
    pub seasonal_lag: Option<usize>,
    pub currency: String,
    pub review_threshold: Decimal,
    pub category_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            fetch_limit: 1000,
            rolling_window: 3,
            top_n: 3,
            concentration_top: 2,
            seasonal_lag: None,
            currency: "USD".to_string(),
            review_threshold: Decimal::from(1000),
            category_limit: 5,
        }
    }
}

impl Settings {
    pub const KEYS: [&'static str; 9] = [
        "api_url",
        "fetch_limit",
        "rolling_window",
        "top_n",
        "concentration_top",
        "seasonal_lag",
        "currency",
        "review_threshold",
        "category_limit",
    ];

    /// Reads settings from `path`; a missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Read settings at {}", path.display()))?;
        let s: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("Parse settings at {}", path.display()))?;
        Ok(s)
    }

    /// Settings file plus environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut s = Self::load_from(path)?;
        s.apply_env();
        Ok(s)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_url = url.trim().to_string();
            }
        }
    }

    /// [`Settings::load`], falling back to defaults (plus environment
    /// overrides) when the file cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("{:#}; using default settings", e);
            let mut s = Self::default();
            s.apply_env();
            s
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config dir")?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Write settings at {}", path.display()))?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let count = |v: &str| -> Result<usize> {
            v.parse::<usize>()
                .with_context(|| format!("Invalid value '{}' for {}, expected a whole number", v, key))
        };
        match key {
            "api_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(anyhow!("api_url must start with http:// or https://"));
                }
                self.api_url = value.trim_end_matches('/').to_string();
            }
            "fetch_limit" => self.fetch_limit = count(value)?,
            "rolling_window" => self.rolling_window = count(value)?,
            "top_n" => self.top_n = count(value)?,
            "concentration_top" => self.concentration_top = count(value)?,
            "seasonal_lag" => {
                self.seasonal_lag = match value {
                    "" | "none" | "off" => None,
                    v => Some(count(v)?),
                }
            }
            "currency" => self.currency = value.to_uppercase(),
            "review_threshold" => self.review_threshold = parse_decimal(value)?,
            "category_limit" => self.category_limit = count(value)?,
            other => {
                return Err(anyhow!(
                    "Unknown setting '{}' (known: {})",
                    other,
                    Self::KEYS.join(", ")
                ))
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("api_url", self.api_url.clone()),
            ("fetch_limit", self.fetch_limit.to_string()),
            ("rolling_window", self.rolling_window.to_string()),
            ("top_n", self.top_n.to_string()),
            ("concentration_top", self.concentration_top.to_string()),
            (
                "seasonal_lag",
                self.seasonal_lag
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
            ("currency", self.currency.clone()),
            ("review_threshold", self.review_threshold.to_string()),
            ("category_limit", self.category_limit.to_string()),
        ]
    }

    pub fn trend_options(&self) -> TrendOptions {
        TrendOptions {
            rolling_window: self.rolling_window,
            seasonal_lag: self.seasonal_lag,
        }
    }

    pub fn insight_options(&self) -> InsightOptions {
        InsightOptions {
            top_n: self.top_n,
            concentration_top: self.concentration_top,
        }
    }

    pub fn suggestion_rules(&self) -> SuggestionRules {
        SuggestionRules {
            review_threshold: self.review_threshold,
            category_limit: self.category_limit,
        }
    }
}
