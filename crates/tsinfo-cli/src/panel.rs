//! Text rendering of the attendance panel.
//!
//! Labels follow the TeamSpirit UI so the panel reads like the page it sits
//! beside.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use tsinfo_core::fields::{format_clock_time, format_elapsed, format_signed_duration, PLACEHOLDER};
use tsinfo_core::{
    AttendanceRecord, OverUnder, PaceTarget, Projection, ProjectionEngine, TargetFinish,
    WorkStatus,
};

const ACHIEVED: &str = "達成済み";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Renders the panel for `record` as of `now`. `None` is the loading state.
#[must_use]
pub(crate) fn render(
    record: Option<&AttendanceRecord>,
    engine: &ProjectionEngine,
    now: NaiveDateTime,
) -> String {
    let mut out = String::from("勤怠情報\n");

    let Some(record) = record else {
        row(&mut out, "状態", "読込中...");
        return out;
    };

    let projection = engine.project(record, now);
    row(&mut out, "状態", status_label(projection.status));

    match projection.status {
        WorkStatus::Working => {
            row(&mut out, "出勤時刻", &format_clock_time(record.clock_in));
            row(&mut out, "勤務時間", &format_elapsed(projection.elapsed));
            row(&mut out, "目標退勤", &target_label(&projection));
        }
        WorkStatus::Finished => {
            row(&mut out, "出勤時刻", &format_clock_time(record.clock_in));
            row(&mut out, "退勤時刻", &format_clock_time(record.clock_out));
            row(&mut out, "勤務時間", &format_elapsed(projection.elapsed));
        }
        WorkStatus::NotStarted => {}
    }

    if let Some(summary) = &record.summary {
        out.push_str("────────────\n月間サマリー\n");
        row(
            &mut out,
            "所定労働時間",
            summary.scheduled_hours.as_deref().unwrap_or(PLACEHOLDER),
        );
        row(
            &mut out,
            "総労働時間",
            summary.total_hours.as_deref().unwrap_or(PLACEHOLDER),
        );
        let over_under = projection
            .over_under
            .as_ref()
            .map_or_else(|| PLACEHOLDER.to_string(), signed_over_under);
        row(&mut out, "過不足時間", &over_under);
        let remaining = projection
            .remaining_work_days
            .map_or_else(|| "--日".to_string(), |days| format!("{days}日"));
        row(&mut out, "残り勤務日数", &remaining);
        row(&mut out, "一日当たり必要", &pace_label(&projection));
    }

    out
}

/// Surplus in green, shortfall in red.
fn signed_over_under(over_under: &OverUnder) -> String {
    let colour = if over_under.is_negative() { RED } else { GREEN };
    format!("{colour}{}{RESET}", over_under.display())
}

fn row(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "  {label}: {value}");
}

fn status_label(status: WorkStatus) -> &'static str {
    match status {
        WorkStatus::NotStarted => "未出勤",
        WorkStatus::Working => "出勤中",
        WorkStatus::Finished => "退勤済み",
    }
}

fn pace_label(projection: &Projection) -> String {
    match projection.required_pace_per_day {
        Some(PaceTarget::Pending(minutes)) => format_signed_duration(Some(minutes)),
        Some(PaceTarget::Achieved) => ACHIEVED.to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

fn target_label(projection: &Projection) -> String {
    match projection.target_finish_time {
        Some(TargetFinish::At(time)) => time.to_string(),
        Some(TargetFinish::Achieved) => ACHIEVED.to_string(),
        None => PLACEHOLDER.to_string(),
    }
}
