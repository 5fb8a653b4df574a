//! Live projections derived from an [`AttendanceRecord`] at a given instant.
//!
//! Nothing here is persisted: the panel recomputes a [`Projection`] on every
//! render tick, so the only inputs are the stored record and "now".

use chrono::{NaiveDateTime, TimeDelta};

use crate::attendance::{AttendanceRecord, ClockTime, SignedDuration};
use crate::fields::format_signed_duration;

/// Break allowance added to the target finish time.
pub const DEFAULT_BREAK_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    NotStarted,
    Working,
    Finished,
}

/// Balance of worked vs. scheduled hours for the month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverUnder {
    /// Computed from the scheduled and total hours (including today's live time).
    Computed(SignedDuration),
    /// The page's own figure, shown verbatim when the inputs are not parseable.
    Reported(String),
}

impl OverUnder {
    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            OverUnder::Computed(d) => d.is_negative(),
            OverUnder::Reported(text) => text.starts_with('-'),
        }
    }

    /// Display text with an explicit `+` for non-negative computed values.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            OverUnder::Computed(d) if d.is_negative() => format_signed_duration(Some(*d)),
            OverUnder::Computed(d) => format!("+{}", format_signed_duration(Some(*d))),
            OverUnder::Reported(text) => text.clone(),
        }
    }
}

/// Required work per remaining day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceTarget {
    Pending(SignedDuration),
    Achieved,
}

/// Time of day to clock out to stay on pace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFinish {
    At(ClockTime),
    Achieved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub status: WorkStatus,
    /// Live elapsed time while working, final worked time once finished.
    pub elapsed: Option<TimeDelta>,
    pub over_under: Option<OverUnder>,
    pub remaining_work_days: Option<i64>,
    pub required_pace_per_day: Option<PaceTarget>,
    pub target_finish_time: Option<TargetFinish>,
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectionEngine {
    break_minutes: i64,
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_BREAK_MINUTES)
    }
}

impl ProjectionEngine {
    #[must_use]
    pub fn new(break_minutes: i64) -> Self {
        Self { break_minutes }
    }

    #[must_use]
    pub fn break_minutes(&self) -> i64 {
        self.break_minutes
    }

    /// Projects `record` onto the local instant `now`.
    ///
    /// Clock times are anchored to `now`'s calendar date. Pace and target
    /// finish are only computed while scheduled days remain; once
    /// `scheduledDays - actualDays <= 0` they stay `None`.
    #[must_use]
    pub fn project(&self, record: &AttendanceRecord, now: NaiveDateTime) -> Projection {
        let today = now.date();
        let clock_in_at = record.clock_in.map(|t| t.on(today));

        let status = match (record.clock_in, record.clock_out) {
            (None, _) => WorkStatus::NotStarted,
            (Some(_), None) => WorkStatus::Working,
            (Some(_), Some(_)) => WorkStatus::Finished,
        };

        let elapsed = match (status, clock_in_at, record.clock_out) {
            (WorkStatus::Working, Some(start), _) => Some(now - start),
            (WorkStatus::Finished, Some(start), Some(out)) => Some(out.on(today) - start),
            _ => None,
        };

        let mut projection = Projection {
            status,
            elapsed,
            over_under: None,
            remaining_work_days: None,
            required_pace_per_day: None,
            target_finish_time: None,
        };

        let Some(summary) = &record.summary else {
            return projection;
        };

        let (Some(scheduled), Some(total)) = (summary.scheduled_minutes(), summary.total_minutes())
        else {
            projection.over_under = summary
                .over_under_hours
                .as_ref()
                .filter(|text| !text.is_empty())
                .map(|text| OverUnder::Reported(text.clone()));
            return projection;
        };

        let live_minutes = match (status, clock_in_at) {
            (WorkStatus::Working, Some(start)) => {
                (now - start).num_milliseconds().div_euclid(60_000)
            }
            _ => 0,
        };
        let current_total = total.minutes().saturating_add(live_minutes);
        projection.over_under = Some(OverUnder::Computed(SignedDuration::from_minutes(
            current_total.saturating_sub(scheduled.minutes()),
        )));

        let (Some(scheduled_days), Some(actual_days)) =
            (summary.scheduled_day_count(), summary.actual_day_count())
        else {
            return projection;
        };

        let remaining_days = scheduled_days.saturating_sub(actual_days);
        projection.remaining_work_days = Some(remaining_days);
        if remaining_days <= 0 {
            return projection;
        }

        let remaining_minutes = scheduled.minutes().saturating_sub(current_total);
        if remaining_minutes <= 0 {
            projection.required_pace_per_day = Some(PaceTarget::Achieved);
            projection.target_finish_time = Some(TargetFinish::Achieved);
            return projection;
        }

        let pace = ceil_div(remaining_minutes, remaining_days);
        projection.required_pace_per_day =
            Some(PaceTarget::Pending(SignedDuration::from_minutes(pace)));

        if status == WorkStatus::Working {
            projection.target_finish_time = clock_in_at
                .and_then(|start| {
                    let offset = TimeDelta::try_minutes(pace.saturating_add(self.break_minutes))?;
                    start.checked_add_signed(offset)
                })
                .map(|finish| TargetFinish::At(ClockTime::from_naive_time(finish.time())));
        }

        projection
    }
}

/// Ceiling division for positive operands.
fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    if numerator % denominator == 0 {
        quotient
    } else {
        quotient + 1
    }
}

#[cfg(test)]
#[path = "projection_test.rs"]
mod tests;
