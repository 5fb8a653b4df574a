//! Attendance data model shared by the extractor, the store, and the panel.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{parse_clock_time, parse_day_count, parse_signed_duration};

/// A wall-clock time of day with minute precision.
///
/// Serialized as `"HH:MM"`. Always in range; construction goes through
/// [`ClockTime::new`] or the text parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Returns `None` unless `hour <= 23` and `minute <= 59`.
    #[must_use]
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Truncates `time` to the minute.
    #[must_use]
    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self(time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time))
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    /// Anchors this time of day to `date`.
    #[must_use]
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }
}

impl std::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ClockTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_clock_time(&value).ok_or_else(|| format!("invalid clock time '{value}'"))
    }
}

/// A possibly negative span in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedDuration(i64);

impl SignedDuration {
    #[must_use]
    pub const fn from_minutes(minutes: i64) -> Self {
        Self(minutes)
    }

    #[must_use]
    pub const fn minutes(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

/// Which monthly summary row a label refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummaryKey {
    ScheduledHours,
    TotalHours,
    OverUnderHours,
    ScheduledDays,
    ActualDays,
}

/// Monthly summary figures as found on the page.
///
/// Values are kept as the raw cell text. `None` means the row was not found,
/// which is different from a row whose value is zero or unparseable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub over_under_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_days: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_days: Option<String>,
}

impl SummaryFields {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scheduled_hours.is_none()
            && self.total_hours.is_none()
            && self.over_under_hours.is_none()
            && self.scheduled_days.is_none()
            && self.actual_days.is_none()
    }

    #[must_use]
    pub fn get(&self, key: SummaryKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    pub fn set(&mut self, key: SummaryKey, value: impl Into<String>) {
        *self.slot_mut(key) = Some(value.into());
    }

    /// Shallow field-wise overwrite: every field present in `other` replaces
    /// the corresponding field here; fields absent in `other` are kept.
    pub fn overlay(&mut self, other: &SummaryFields) {
        for key in [
            SummaryKey::ScheduledHours,
            SummaryKey::TotalHours,
            SummaryKey::OverUnderHours,
            SummaryKey::ScheduledDays,
            SummaryKey::ActualDays,
        ] {
            if let Some(value) = other.get(key) {
                self.set(key, value);
            }
        }
    }

    #[must_use]
    pub fn scheduled_minutes(&self) -> Option<SignedDuration> {
        self.scheduled_hours.as_deref().and_then(parse_signed_duration)
    }

    #[must_use]
    pub fn total_minutes(&self) -> Option<SignedDuration> {
        self.total_hours.as_deref().and_then(parse_signed_duration)
    }

    #[must_use]
    pub fn over_under_minutes(&self) -> Option<SignedDuration> {
        self.over_under_hours.as_deref().and_then(parse_signed_duration)
    }

    #[must_use]
    pub fn scheduled_day_count(&self) -> Option<i64> {
        self.scheduled_days.as_deref().and_then(parse_day_count)
    }

    #[must_use]
    pub fn actual_day_count(&self) -> Option<i64> {
        self.actual_days.as_deref().and_then(parse_day_count)
    }

    fn slot(&self, key: SummaryKey) -> &Option<String> {
        match key {
            SummaryKey::ScheduledHours => &self.scheduled_hours,
            SummaryKey::TotalHours => &self.total_hours,
            SummaryKey::OverUnderHours => &self.over_under_hours,
            SummaryKey::ScheduledDays => &self.scheduled_days,
            SummaryKey::ActualDays => &self.actual_days,
        }
    }

    fn slot_mut(&mut self, key: SummaryKey) -> &mut Option<String> {
        match key {
            SummaryKey::ScheduledHours => &mut self.scheduled_hours,
            SummaryKey::TotalHours => &mut self.total_hours,
            SummaryKey::OverUnderHours => &mut self.over_under_hours,
            SummaryKey::ScheduledDays => &mut self.scheduled_days,
            SummaryKey::ActualDays => &mut self.actual_days,
        }
    }
}

/// Identifier of one scanned frame (the top document or a nested frame).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub String);

impl FrameId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What one frame yielded during one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub success: bool,
    pub clock_in: Option<ClockTime>,
    pub clock_out: Option<ClockTime>,
    pub summary: Option<SummaryFields>,
    pub source_frame_id: FrameId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl ExtractionResult {
    /// An unsuccessful result carrying a single diagnostic.
    #[must_use]
    pub fn failed(source_frame_id: FrameId, diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            clock_in: None,
            clock_out: None,
            summary: None,
            source_frame_id,
            diagnostics: vec![diagnostic.into()],
        }
    }

    #[must_use]
    pub fn is_working(&self) -> bool {
        self.clock_in.is_some() && self.clock_out.is_none()
    }
}

/// The reconciled, authoritative attendance state.
///
/// Replaced wholesale on every successful fetch; never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub clock_in: Option<ClockTime>,
    pub clock_out: Option<ClockTime>,
    pub is_working: bool,
    pub summary: Option<SummaryFields>,
    pub fetched_at: DateTime<Utc>,
}

impl AttendanceRecord {
    #[must_use]
    pub fn from_extraction(result: ExtractionResult, fetched_at: DateTime<Utc>) -> Self {
        Self {
            is_working: result.is_working(),
            clock_in: result.clock_in,
            clock_out: result.clock_out,
            summary: result.summary,
            fetched_at,
        }
    }
}
