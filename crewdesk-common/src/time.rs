//! Date utilities: payday countdown and call-stats sync windows
//!
//! Payday is fixed to the 25th of each month. Sync windows use fixed day
//! counts per interval (a "month" is 30 days, a "year" 365), not calendar
//! months.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Day of month on which workers are paid
pub const PAYDAY_DAY_OF_MONTH: u32 = 25;

/// Current UTC date
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Next payday on or after `today`
///
/// On the 25th itself the payday is today; from the 26th onward it rolls to
/// the 25th of the following month (December rolls into January).
pub fn next_payday(today: NaiveDate) -> NaiveDate {
    let (year, month) = if today.day() > PAYDAY_DAY_OF_MONTH {
        if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        }
    } else {
        (today.year(), today.month())
    };

    // Every month has a 25th
    NaiveDate::from_ymd_opt(year, month, PAYDAY_DAY_OF_MONTH).unwrap_or(today)
}

/// Whole days from `today` until the next payday (0 on payday)
pub fn days_until_payday(today: NaiveDate) -> i64 {
    (next_payday(today) - today).num_days()
}

/// Symbolic time window for call-stats sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatsInterval {
    #[serde(rename = "week")]
    Week,
    #[default]
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "2months")]
    TwoMonths,
    #[serde(rename = "4months")]
    FourMonths,
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "year")]
    Year,
}

impl StatsInterval {
    /// Parse interval from its query-string form
    ///
    /// Accepts `week`, `month`, `2months`, `4months`, `6months`, `year`
    /// (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "week" => Some(StatsInterval::Week),
            "month" => Some(StatsInterval::Month),
            "2months" => Some(StatsInterval::TwoMonths),
            "4months" => Some(StatsInterval::FourMonths),
            "6months" => Some(StatsInterval::SixMonths),
            "year" => Some(StatsInterval::Year),
            _ => None,
        }
    }

    /// Query-string form
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsInterval::Week => "week",
            StatsInterval::Month => "month",
            StatsInterval::TwoMonths => "2months",
            StatsInterval::FourMonths => "4months",
            StatsInterval::SixMonths => "6months",
            StatsInterval::Year => "year",
        }
    }

    /// Fixed window length in days
    pub fn days(&self) -> i64 {
        match self {
            StatsInterval::Week => 7,
            StatsInterval::Month => 30,
            StatsInterval::TwoMonths => 60,
            StatsInterval::FourMonths => 120,
            StatsInterval::SixMonths => 180,
            StatsInterval::Year => 365,
        }
    }

    /// Concrete window ending on `today` (inclusive)
    pub fn date_range(&self, today: NaiveDate) -> DateRange {
        DateRange {
            from: today - Duration::days(self.days()),
            to: today,
        }
    }

    pub fn all_variants() -> &'static [StatsInterval] {
        &[
            StatsInterval::Week,
            StatsInterval::Month,
            StatsInterval::TwoMonths,
            StatsInterval::FourMonths,
            StatsInterval::SixMonths,
            StatsInterval::Year,
        ]
    }
}

impl std::fmt::Display for StatsInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive date window `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}
