//! Daily/weekly reset boundaries
//!
//! Daily boundary: next local midnight. Weekly boundary: next Sunday 00:00
//! local time. Countdowns are display-only; whether progress actually rolls
//! over is decided by [`ResetPolicy`].

use chrono::{Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DefinitionKind;

/// Period key used when records never roll over
pub const PERMANENT_PERIOD: &str = "permanent";

/// What happens to progress records at a reset boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Boundaries only drive the countdown; records live forever
    #[default]
    DisplayOnly,
    /// Each day (missions) / week (quests) gets fresh records.
    /// Records from earlier periods are kept untouched.
    Rollover,
}

/// Source of "now" for the tracker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// Wall clock (local time for boundaries)
    #[default]
    System,
    /// Frozen time, interpreted as both local and UTC
    Fixed(NaiveDateTime),
}

impl Clock {
    /// Current local date-time
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Self::System => Local::now().naive_local(),
            Self::Fixed(at) => *at,
        }
    }

    /// Current Unix timestamp in milliseconds
    pub fn now_ms(&self) -> i64 {
        match self {
            Self::System => Utc::now().timestamp_millis(),
            Self::Fixed(at) => at.and_utc().timestamp_millis(),
        }
    }
}

/// Countdown snapshot for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetCountdown {
    /// "H:MM:SS" until the next daily reset
    pub daily: String,
    /// "Dd Hh" until the next weekly reset
    pub weekly: String,
    pub daily_seconds: i64,
    pub weekly_seconds: i64,
}

impl ResetCountdown {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            daily: daily_countdown(now),
            weekly: weekly_countdown(now),
            daily_seconds: (next_daily_reset(now) - now).num_seconds(),
            weekly_seconds: (next_weekly_reset(now) - now).num_seconds(),
        }
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

/// Start of the next day
pub fn next_daily_reset(now: NaiveDateTime) -> NaiveDateTime {
    midnight(now.date() + Days::new(1))
}

/// Next Sunday 00:00, strictly after `now` (a Sunday maps to the following Sunday)
pub fn next_weekly_reset(now: NaiveDateTime) -> NaiveDateTime {
    let days_until_sunday = 7 - u64::from(now.weekday().num_days_from_sunday());
    midnight(now.date() + Days::new(days_until_sunday))
}

/// Most recent Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_sunday()))
}

/// Time until next daily reset as "H:MM:SS"
pub fn daily_countdown(now: NaiveDateTime) -> String {
    let secs = (next_daily_reset(now) - now).num_seconds().max(0);
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Time until next weekly reset as "Dd Hh"
pub fn weekly_countdown(now: NaiveDateTime) -> String {
    let secs = (next_weekly_reset(now) - now).num_seconds().max(0);
    format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3600)
}

/// Period a record created at `now` belongs to
pub fn period_key(kind: DefinitionKind, policy: ResetPolicy, now: NaiveDateTime) -> String {
    match (policy, kind) {
        (ResetPolicy::DisplayOnly, _) => PERMANENT_PERIOD.to_string(),
        (ResetPolicy::Rollover, DefinitionKind::Mission) => {
            now.date().format("%Y-%m-%d").to_string()
        }
        (ResetPolicy::Rollover, DefinitionKind::Quest) => {
            format!("week-{}", week_start(now.date()).format("%Y-%m-%d"))
        }
    }
}
