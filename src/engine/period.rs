// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Calendar periods: granularities, canonical keys and inclusive date ranges.
//!
//! Weeks are ISO weeks starting Monday everywhere in the crate.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use super::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            other => Err(EngineError::UnknownGranularity {
                value: other.to_string(),
            }),
        }
    }
}

/// Canonical identifier of a calendar period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PeriodKey {
    Day { date: NaiveDate },
    /// `year` is the ISO week-numbering year, which differs from the calendar
    /// year for a few days around new year.
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Day { date } => write!(f, "{}", date.format("%Y-%m-%d")),
            PeriodKey::Week { year, week } => write!(f, "{:04}-W{:02}", year, week),
            PeriodKey::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
        }
    }
}

/// A single day, ISO week or month, identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarPeriod {
    granularity: Granularity,
    start: NaiveDate,
}

impl CalendarPeriod {
    pub fn containing(date: NaiveDate, granularity: Granularity) -> Self {
        let start = match granularity {
            Granularity::Day => date,
            Granularity::Week => date.week(Weekday::Mon).first_day(),
            Granularity::Month => date - Days::new(u64::from(date.day0())),
        };
        Self { granularity, start }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the period, saturating at the calendar's upper bound.
    pub fn end(&self) -> NaiveDate {
        match self.granularity {
            Granularity::Day => self.start,
            Granularity::Week => self
                .start
                .checked_add_days(Days::new(6))
                .unwrap_or(NaiveDate::MAX),
            Granularity::Month => self
                .start
                .checked_add_months(Months::new(1))
                .and_then(|d| d.pred_opt())
                .unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn key(&self) -> PeriodKey {
        match self.granularity {
            Granularity::Day => PeriodKey::Day { date: self.start },
            Granularity::Week => {
                let iso = self.start.iso_week();
                PeriodKey::Week {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
            Granularity::Month => PeriodKey::Month {
                year: self.start.year(),
                month: self.start.month(),
            },
        }
    }

    /// Chronological rank. Consecutive periods of the same granularity differ
    /// by exactly one, across year boundaries included.
    pub fn order(&self) -> i64 {
        match self.granularity {
            Granularity::Day => i64::from(self.start.num_days_from_ce()),
            // 0001-01-01 is a Monday with num_days_from_ce() == 1.
            Granularity::Week => (i64::from(self.start.num_days_from_ce()) - 1).div_euclid(7),
            Granularity::Month => {
                i64::from(self.start.year()) * 12 + i64::from(self.start.month0())
            }
        }
    }

    pub fn next(&self) -> Option<Self> {
        let start = match self.granularity {
            Granularity::Day => self.start.succ_opt(),
            Granularity::Week => self.start.checked_add_days(Days::new(7)),
            Granularity::Month => self.start.checked_add_months(Months::new(1)),
        }?;
        Some(Self {
            granularity: self.granularity,
            start,
        })
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, EngineError> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.start > self.end {
            return Err(EngineError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every period intersecting the range, oldest first. Empty when the range
    /// is inverted.
    pub fn periods(&self, granularity: Granularity) -> Vec<CalendarPeriod> {
        let mut out = Vec::new();
        if self.start > self.end {
            return out;
        }
        let last = CalendarPeriod::containing(self.end, granularity);
        let mut cur = Some(CalendarPeriod::containing(self.start, granularity));
        while let Some(p) = cur {
            if p.start() > last.start() {
                break;
            }
            out.push(p);
            cur = p.next();
        }
        out
    }
}

/// The backend's `time_range` presets, resolved against an explicit anchor
/// day so the engine never reads the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
        }
    }

    /// The inclusive window ending on `as_of`.
    pub fn window(&self, as_of: NaiveDate) -> DateRange {
        let start = match self {
            TimeRange::Week => as_of.checked_sub_days(Days::new(6)),
            TimeRange::Month => as_of
                .checked_sub_months(Months::new(1))
                .and_then(|d| d.succ_opt()),
            TimeRange::Year => as_of
                .checked_sub_months(Months::new(12))
                .and_then(|d| d.succ_opt()),
        }
        .unwrap_or(NaiveDate::MIN);
        DateRange { start, end: as_of }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            TimeRange::Week => Granularity::Day,
            TimeRange::Month => Granularity::Week,
            TimeRange::Year => Granularity::Month,
        }
    }
}

impl FromStr for TimeRange {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "year" => Ok(TimeRange::Year),
            other => Err(EngineError::UnknownTimeRange {
                value: other.to_string(),
            }),
        }
    }
}

/// Parses a record date. Plain `YYYY-MM-DD` and ISO date-times are accepted;
/// only the calendar day is kept.
pub fn parse_record_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("date is empty".to_string());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format!("unparseable date '{}'", s))
}
