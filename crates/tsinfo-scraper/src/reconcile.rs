//! Merges per-frame extraction results into one attendance record.
//!
//! Clock times come from a single frame: the first successful one, unless a
//! later successful frame has a clock-in and the current best does not.
//! Summary fields are overlaid from every successful frame in arrival order,
//! since summary rows are often split or duplicated across frames.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tsinfo_core::{AttendanceRecord, ExtractionResult};

/// Best-so-far state while frame results arrive.
#[derive(Debug, Default)]
pub struct Reconciler {
    best: Option<ExtractionResult>,
    observed: usize,
}

impl Reconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one frame result. Order matters: call in scan order.
    pub fn observe(&mut self, result: ExtractionResult) {
        self.observed += 1;

        if !result.success {
            tracing::debug!(
                frame = %result.source_frame_id,
                diagnostics = ?result.diagnostics,
                "frame yielded no attendance data"
            );
            return;
        }

        let Some(best) = self.best.as_mut() else {
            tracing::debug!(frame = %result.source_frame_id, "first successful frame");
            self.best = Some(result);
            return;
        };

        if result.clock_in.is_some() && best.clock_in.is_none() {
            tracing::debug!(
                frame = %result.source_frame_id,
                replaced = %best.source_frame_id,
                "frame with clock-in replaces best result"
            );
            *best = result;
            return;
        }

        if let Some(summary) = &result.summary {
            best.summary
                .get_or_insert_with(Default::default)
                .overlay(summary);
        }
    }

    #[must_use]
    pub fn best(&self) -> Option<&ExtractionResult> {
        self.best.as_ref()
    }

    /// Number of results seen, successful or not.
    #[must_use]
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// `None` when no frame succeeded.
    #[must_use]
    pub fn finish(self, fetched_at: DateTime<Utc>) -> Option<AttendanceRecord> {
        self.best
            .map(|best| AttendanceRecord::from_extraction(best, fetched_at))
    }
}

/// Reconciles an ordered batch of frame results.
#[must_use]
pub fn reconcile<I>(results: I, fetched_at: DateTime<Utc>) -> Option<AttendanceRecord>
where
    I: IntoIterator<Item = ExtractionResult>,
{
    let mut reconciler = Reconciler::new();
    for result in results {
        reconciler.observe(result);
    }
    reconciler.finish(fetched_at)
}

/// Drains `rx` until every sender is dropped, observing results in send order.
pub async fn reconcile_channel(mut rx: mpsc::Receiver<ExtractionResult>) -> Reconciler {
    let mut reconciler = Reconciler::new();
    while let Some(result) = rx.recv().await {
        reconciler.observe(result);
    }
    reconciler
}
