//! Scheduling rules for warranty and maintenance follow-ups.
//!
//! A follow-up is derived from a catalog rule (a kind plus a numeric value)
//! and a base date. Time-term rules count months of 30 days; working-hours
//! rules translate a cumulative operating-hour budget into calendar time via
//! the customer's declared work week.

pub mod calculator;

pub use calculator::{due_date, fallback_due, DueDate, FallbackReason};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Days ahead of the due date at which a follow-up counts as "due soon".
pub const DUE_SOON_WINDOW_DAYS: i64 = 30;

/// How a rule's numeric value is interpreted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Value is a number of months (30-day months).
    TimeTerm,
    /// Value is a budget of cumulative operating hours.
    WorkingHours,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::TimeTerm => "time_term",
            RuleKind::WorkingHours => "working_hours",
        }
    }
}

/// A customer's declared working week, input to working-hours calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkWeek {
    pub daily_hours: f64,
    pub saturday: bool,
    pub sunday: bool,
}

impl WorkWeek {
    pub fn working_days_per_week(&self) -> u8 {
        5 + u8::from(self.saturday) + u8::from(self.sunday)
    }

    pub fn weekly_hours(&self) -> f64 {
        self.daily_hours * f64::from(self.working_days_per_week())
    }
}

/// Read-side urgency classification of a service follow-up. Never persisted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FollowUpPriority {
    Overdue,
    DueSoon,
    Pending,
    Done,
}

/// Classifies a follow-up relative to `now`.
pub fn priority(next_due: DateTime<Utc>, is_completed: bool, now: DateTime<Utc>) -> FollowUpPriority {
    if is_completed {
        FollowUpPriority::Done
    } else if next_due <= now {
        FollowUpPriority::Overdue
    } else if next_due <= now + Duration::days(DUE_SOON_WINDOW_DAYS) {
        FollowUpPriority::DueSoon
    } else {
        FollowUpPriority::Pending
    }
}
