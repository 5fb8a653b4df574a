//! Per-frame attendance extraction.
//!
//! Reads today's clock-in/clock-out cells and the monthly summary table from
//! one frame snapshot. The page belongs to a third party and changes without
//! notice, so extraction never fails outward: anything missing is simply
//! unset, malformed text is noted in `diagnostics`, and even a panic inside
//! the tree builder is contained and reported as an unsuccessful result.

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tsinfo_core::attendance::SummaryKey;
use tsinfo_core::fields::{parse_clock_time, PLACEHOLDER};
use tsinfo_core::{ClockTime, ExtractionResult, FrameId, SummaryFields};

use crate::dom::{Document, Element};
use crate::matcher::{first_match, Matcher};

/// Id prefix of today's clock-in cell; the full id appends `YYYY-MM-DD`.
pub const CLOCK_IN_ID_PREFIX: &str = "ttvTimeSt";

/// Snapshots above this size are not parsed.
pub const MAX_SNAPSHOT_BYTES: usize = 8 * 1024 * 1024;

/// Summary row labels: (label substring, field, label substring that vetoes the match).
const SUMMARY_LABELS: &[(&str, SummaryKey, Option<&str>)] = &[
    ("所定労働時間", SummaryKey::ScheduledHours, None),
    // "法定総労働時間" is the statutory figure, not the actual total.
    ("総労働時間", SummaryKey::TotalHours, Some("法定")),
    ("過不足時間", SummaryKey::OverUnderHours, None),
    ("所定出勤日数", SummaryKey::ScheduledDays, None),
    ("実出勤日数", SummaryKey::ActualDays, None),
];

/// The clock-out cell sits in the same row as the clock-in cell.
const CLOCK_OUT_STRATEGIES: &[Matcher] = &[
    Matcher::TagWithClasses {
        tag: "td",
        classes: &["vet"],
    },
    Matcher::TagWithClasses {
        tag: "td",
        classes: &["dval", "vet"],
    },
];

/// Raw markup of one frame as captured after the page settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub id: FrameId,
    pub html: String,
}

impl FrameSnapshot {
    #[must_use]
    pub fn new(id: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            id: FrameId::new(id),
            html: html.into(),
        }
    }
}

/// `ttvTimeSt2026-10-16` for 16 October 2026.
#[must_use]
pub fn clock_in_element_id(today: NaiveDate) -> String {
    format!("{CLOCK_IN_ID_PREFIX}{}", today.format("%Y-%m-%d"))
}

/// Extracts attendance fields from one frame. Never panics.
#[must_use]
pub fn extract_frame(snapshot: &FrameSnapshot, today: NaiveDate) -> ExtractionResult {
    if snapshot.html.len() > MAX_SNAPSHOT_BYTES {
        tracing::warn!(
            frame = %snapshot.id,
            bytes = snapshot.html.len(),
            "frame snapshot too large, skipping"
        );
        return ExtractionResult::failed(
            snapshot.id.clone(),
            format!(
                "snapshot of {} bytes exceeds the {MAX_SNAPSHOT_BYTES} byte limit",
                snapshot.html.len()
            ),
        );
    }

    contain_panic(&snapshot.id, || scan_frame(snapshot, today))
}

/// Runs one frame scan, turning a panic into a failed result for that frame.
fn contain_panic(frame: &FrameId, scan: impl FnOnce() -> ExtractionResult) -> ExtractionResult {
    match catch_unwind(AssertUnwindSafe(scan)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(frame = %frame, %message, "frame extraction aborted");
            ExtractionResult::failed(frame.clone(), format!("extraction aborted: {message}"))
        }
    }
}

fn scan_frame(snapshot: &FrameSnapshot, today: NaiveDate) -> ExtractionResult {
    let document = Document::parse(&snapshot.html);
    let mut diagnostics = Vec::new();

    let clock_in_id = clock_in_element_id(today);
    let mut clock_in = None;
    let mut clock_out = None;

    match first_match(document.root(), &[Matcher::Id(clock_in_id.clone())]) {
        None => diagnostics.push(format!("clock-in element #{clock_in_id} not found")),
        Some(clock_in_el) => {
            clock_in = read_clock_cell(&clock_in_el, "clock-in", &mut diagnostics);

            match clock_in_el.closest("tr") {
                None => diagnostics.push("clock-in element is not inside a table row".to_string()),
                Some(row) => {
                    if let Some(cell) = first_match(row, CLOCK_OUT_STRATEGIES) {
                        clock_out = read_clock_cell(&cell, "clock-out", &mut diagnostics);
                    }
                }
            }
        }
    }

    let summary = scan_summary(&document);
    if summary.is_empty() {
        diagnostics.push("no summary rows found".to_string());
    }

    let success = clock_in.is_some() || !summary.is_empty();
    tracing::debug!(
        frame = %snapshot.id,
        elements = document.element_count(),
        success,
        clock_in = ?clock_in,
        clock_out = ?clock_out,
        "scanned frame"
    );

    ExtractionResult {
        success,
        clock_in,
        clock_out,
        summary: (!summary.is_empty()).then_some(summary),
        source_frame_id: snapshot.id.clone(),
        diagnostics,
    }
}

/// Empty and placeholder cells are silently unset; anything else that does
/// not parse is unset with a diagnostic.
fn read_clock_cell(
    cell: &Element<'_>,
    what: &str,
    diagnostics: &mut Vec<String>,
) -> Option<ClockTime> {
    let text = cell.text();
    let text = text.trim();
    if text.is_empty() || text == PLACEHOLDER {
        return None;
    }

    let parsed = parse_clock_time(text);
    if parsed.is_none() {
        tracing::debug!(what, text, "malformed clock text");
        diagnostics.push(format!("malformed {what} text '{text}'"));
    }
    parsed
}

/// Scans every row of every table; later matches overwrite earlier ones.
fn scan_summary(document: &Document) -> SummaryFields {
    let mut summary = SummaryFields::default();

    for table in document.elements_by_tag("table") {
        for row in table.descendants().filter(|el| el.tag() == "tr") {
            let cells: Vec<Element<'_>> = row
                .descendants()
                .filter(|el| matches!(el.tag(), "td" | "th"))
                .collect();
            let (Some(first), Some(last)) = (cells.first(), cells.last()) else {
                continue;
            };
            if cells.len() < 2 {
                continue;
            }

            let label = first.text();
            let label = label.trim();
            let value = last.text();
            let value = value.trim();

            for (needle, key, veto) in SUMMARY_LABELS {
                if label.contains(needle) && !veto.is_some_and(|v| label.contains(v)) {
                    summary.set(*key, value);
                }
            }
        }
    }

    summary
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
