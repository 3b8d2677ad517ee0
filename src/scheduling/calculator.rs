//! Due-date calculation for follow-up rules.
//!
//! Behavioral contract carried over from the production system:
//! time-term rules use a fixed 30-day month, and working-hours rules add
//! fractional days directly. Both are deliberate approximations that must be
//! preserved for compatibility with previously computed schedules.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use strum::Display;

use super::{RuleKind, WorkWeek};

/// Fixed month length used by time-term rules.
pub const DAYS_PER_MONTH: i64 = 30;

/// Weekly hours assumed when a customer has no usable working-hours profile.
pub const ASSUMED_WEEKLY_HOURS: f64 = 40.0;

/// Successor interval applied when a calculation cannot be performed at all.
pub const FALLBACK_INTERVAL_MONTHS: i64 = 6;

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// Why a calculation degraded to an assumed or fixed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FallbackReason {
    /// The customer has no working-hours profile.
    MissingWorkWeek,
    /// A profile exists but its weekly hours resolve to zero.
    ZeroWeeklyHours,
    /// The inputs could not be resolved (e.g. the profile lookup failed).
    CalculationFailed,
}

/// A computed due date together with its audit trail.
///
/// `Computed` means the rule was applied with real inputs; `Fallback` means
/// an assumed constant stood in for a missing or broken input. The notes
/// string records the branch and constants used; it is displayed, never
/// parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum DueDate {
    Computed {
        due: DateTime<Utc>,
        notes: String,
    },
    Fallback {
        due: DateTime<Utc>,
        notes: String,
        reason: FallbackReason,
    },
}

impl DueDate {
    pub fn due(&self) -> DateTime<Utc> {
        match self {
            DueDate::Computed { due, .. } | DueDate::Fallback { due, .. } => *due,
        }
    }

    pub fn notes(&self) -> &str {
        match self {
            DueDate::Computed { notes, .. } | DueDate::Fallback { notes, .. } => notes,
        }
    }

    pub fn used_fallback(&self) -> bool {
        matches!(self, DueDate::Fallback { .. })
    }

    /// Splits into the pieces the entities persist.
    pub fn into_parts(self) -> (DateTime<Utc>, String, bool) {
        match self {
            DueDate::Computed { due, notes } => (due, notes, false),
            DueDate::Fallback { due, notes, .. } => (due, notes, true),
        }
    }
}

/// Computes the due date for a rule applied at `base`.
///
/// Pure function of its inputs. The working-hours branch needs the
/// customer's work week; pass `None` when the customer has no profile and
/// the assumed 40-hour week is used instead.
pub fn due_date(
    kind: RuleKind,
    value: Decimal,
    base: DateTime<Utc>,
    work_week: Option<&WorkWeek>,
) -> DueDate {
    match kind {
        RuleKind::TimeTerm => {
            let months = value.trunc().to_i64().unwrap_or(0);
            DueDate::Computed {
                due: base + Duration::days(months * DAYS_PER_MONTH),
                notes: format!(
                    "Time-term rule: {months} month(s) from base date ({DAYS_PER_MONTH}-day months)"
                ),
            }
        }
        RuleKind::WorkingHours => {
            let hours = value.to_f64().unwrap_or(0.0);
            match work_week {
                Some(week) if week.weekly_hours() > 0.0 => {
                    let weekly = week.weekly_hours();
                    let weeks = hours / weekly;
                    let days = weeks * 7.0;
                    DueDate::Computed {
                        due: add_float_days(base, days),
                        notes: format!(
                            "Working-hours rule: {hours} hours, weekly working hours: {weekly}, \
                             calculated duration: {weeks:.1} weeks ({days:.0} days)"
                        ),
                    }
                }
                Some(_) => assumed_week(hours, base, FallbackReason::ZeroWeeklyHours),
                None => assumed_week(hours, base, FallbackReason::MissingWorkWeek),
            }
        }
    }
}

/// Fixed six-month successor interval, used when the calculation inputs
/// cannot be resolved at all. Degrade, never propagate.
pub fn fallback_due(base: DateTime<Utc>) -> DueDate {
    DueDate::Fallback {
        due: base + Duration::days(FALLBACK_INTERVAL_MONTHS * DAYS_PER_MONTH),
        notes: format!(
            "Fixed {FALLBACK_INTERVAL_MONTHS} month interval applied (calculation inputs unavailable)"
        ),
        reason: FallbackReason::CalculationFailed,
    }
}

fn assumed_week(hours: f64, base: DateTime<Utc>, reason: FallbackReason) -> DueDate {
    let weeks = hours / ASSUMED_WEEKLY_HOURS;
    let days = weeks * 7.0;
    let cause = match reason {
        FallbackReason::MissingWorkWeek => "customer has no working hours configured",
        _ => "no usable working hours configured",
    };
    DueDate::Fallback {
        due: add_float_days(base, days),
        notes: format!(
            "Working-hours rule: {hours} hours, default {ASSUMED_WEEKLY_HOURS} hours/week used \
             ({cause}), calculated duration: {weeks:.1} weeks ({days:.0} days)"
        ),
        reason,
    }
}

// Fractional days at microsecond resolution, mirroring the additive-float
// semantics of the original calculator.
fn add_float_days(base: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    base + Duration::microseconds((days * MICROS_PER_DAY) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn full_week() -> WorkWeek {
        WorkWeek {
            daily_hours: 8.0,
            saturday: false,
            sunday: false,
        }
    }

    #[test]
    fn time_term_uses_thirty_day_months() {
        let base = date(2024, 1, 1);
        let result = due_date(RuleKind::TimeTerm, dec!(12), base, None);
        assert_eq!(result.due(), base + Duration::days(360));
        // 12 "months" land well short of the calendar anniversary
        assert_ne!(result.due(), date(2025, 1, 1));
        assert!(!result.used_fallback());
        assert!(result.notes().contains("12 month(s)"));
    }

    #[test]
    fn time_term_truncates_fractional_months() {
        let base = date(2024, 3, 15);
        let result = due_date(RuleKind::TimeTerm, dec!(6.9), base, None);
        assert_eq!(result.due(), base + Duration::days(180));
    }

    #[test]
    fn working_hours_full_example() {
        // 1000 hours at 5 days x 8h = 40h/week => 175 days
        let base = date(2024, 1, 1);
        let result = due_date(RuleKind::WorkingHours, dec!(1000), base, Some(&full_week()));
        assert_eq!(result.due(), base + Duration::days(175));
        assert!(!result.used_fallback());
        assert!(result.notes().contains("1000 hours"));
    }

    #[test]
    fn working_hours_adds_fractional_days() {
        // 100 hours at 40h/week => 2.5 weeks => 17.5 days => 420 hours
        let base = date(2024, 1, 1);
        let result = due_date(RuleKind::WorkingHours, dec!(100), base, Some(&full_week()));
        assert_eq!(result.due(), base + Duration::hours(420));
    }

    #[test]
    fn weekend_work_shortens_the_calendar_interval() {
        let base = date(2024, 1, 1);
        let week = WorkWeek {
            daily_hours: 8.0,
            saturday: true,
            sunday: true,
        };
        // 56h/week: 1000 / 56 * 7 = 125 days
        let result = due_date(RuleKind::WorkingHours, dec!(1000), base, Some(&week));
        assert_eq!(result.due(), base + Duration::days(125));
    }

    #[test]
    fn missing_profile_assumes_forty_hour_week() {
        let base = date(2024, 1, 1);
        let result = due_date(RuleKind::WorkingHours, dec!(1000), base, None);
        assert_matches!(
            result,
            DueDate::Fallback {
                reason: FallbackReason::MissingWorkWeek,
                ..
            }
        );
        assert_eq!(result.due(), base + Duration::days(175));
        assert!(result.notes().contains("default 40 hours/week"));
    }

    #[test]
    fn zero_weekly_hours_assumes_forty_hour_week() {
        let base = date(2024, 1, 1);
        let week = WorkWeek {
            daily_hours: 0.0,
            saturday: false,
            sunday: false,
        };
        let result = due_date(RuleKind::WorkingHours, dec!(400), base, Some(&week));
        assert_matches!(
            result,
            DueDate::Fallback {
                reason: FallbackReason::ZeroWeeklyHours,
                ..
            }
        );
        // 400 / 40 * 7 = 70 days
        assert_eq!(result.due(), base + Duration::days(70));
    }

    #[test]
    fn fallback_due_is_a_fixed_six_month_interval() {
        let base = date(2024, 6, 1);
        let result = fallback_due(base);
        assert_matches!(
            result,
            DueDate::Fallback {
                reason: FallbackReason::CalculationFailed,
                ..
            }
        );
        assert_eq!(result.due(), base + Duration::days(180));
    }

    #[test]
    fn into_parts_carries_the_fallback_flag() {
        let base = date(2024, 1, 1);
        let (_, _, degraded) = due_date(RuleKind::TimeTerm, dec!(6), base, None).into_parts();
        assert!(!degraded);
        let (_, _, degraded) = due_date(RuleKind::WorkingHours, dec!(10), base, None).into_parts();
        assert!(degraded);
    }

    proptest! {
        // The 30-day-month identity holds for any whole month count and any
        // base date, regardless of calendar month lengths.
        #[test]
        fn time_term_exactness(months in 1i64..240, secs in -1_000_000_000i64..2_000_000_000) {
            let base = Utc.timestamp_opt(secs, 0).unwrap();
            let result = due_date(RuleKind::TimeTerm, Decimal::from(months), base, None);
            prop_assert_eq!(result.due(), base + Duration::days(months * 30));
        }

        // Working-hours result is invariant in which path supplied the
        // 40-hour week: an explicit 40h profile and the assumed fallback
        // agree on the date and differ only in the tag.
        #[test]
        fn assumed_week_matches_explicit_forty_hours(hours in 1u32..100_000) {
            let base = Utc.timestamp_opt(0, 0).unwrap();
            let explicit = due_date(
                RuleKind::WorkingHours,
                Decimal::from(hours),
                base,
                Some(&WorkWeek { daily_hours: 8.0, saturday: false, sunday: false }),
            );
            let assumed = due_date(RuleKind::WorkingHours, Decimal::from(hours), base, None);
            prop_assert_eq!(explicit.due(), assumed.due());
            prop_assert!(!explicit.used_fallback());
            prop_assert!(assumed.used_fallback());
        }
    }
}
