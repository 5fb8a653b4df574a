//! Live panel loop.
//!
//! Redraws every tick so the elapsed time keeps moving, refetches the page
//! on a slower interval, and picks up any record saved to the store in the
//! meantime.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tsinfo_core::{AppConfig, AttendanceRecord, ProjectionEngine};
use tsinfo_scraper::PageRunner;
use tsinfo_store::RecordStore;

use crate::fetch::request_fetch;
use crate::panel;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Per-session panel state, owned by the loop.
pub(crate) struct PanelSession {
    engine: ProjectionEngine,
    record: Option<AttendanceRecord>,
    initialized: bool,
    last_frame: Option<String>,
}

impl PanelSession {
    pub(crate) fn new(engine: ProjectionEngine) -> Self {
        Self {
            engine,
            record: None,
            initialized: false,
            last_frame: None,
        }
    }

    /// True once a record has been shown, from the store or a fetch.
    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn apply(&mut self, record: AttendanceRecord) {
        self.record = Some(record);
        self.initialized = true;
    }

    /// Returns the panel text when it differs from the last frame drawn.
    pub(crate) fn render(&mut self, now: NaiveDateTime) -> Option<String> {
        let text = panel::render(self.record.as_ref(), &self.engine, now);
        if self.last_frame.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.last_frame = Some(text.clone());
        Some(text)
    }
}

pub(crate) async fn run_watch(
    config: &AppConfig,
    runner: Option<PageRunner>,
) -> anyhow::Result<()> {
    let store = Arc::new(RecordStore::open(&config.store_path).await);
    let runner = runner.map(Arc::new);
    let mut changes = store.subscribe();
    let mut session = PanelSession::new(ProjectionEngine::new(config.break_minutes));

    if let Some(record) = store.current() {
        session.apply(record);
    }
    draw(&mut session);

    // Stored data first; only fetch up front when there is none.
    if !session.is_initialized() {
        if let Some(runner) = &runner {
            if let Some(record) = request_fetch(runner, &store, Local::now().date_naive()).await {
                session.apply(record);
            }
        }
    }

    let mut tick = interval(Duration::from_millis(config.tick_interval_ms));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let refresh_period = Duration::from_secs(config.refresh_interval_secs.max(1));
    let mut refresh = interval_at(Instant::now() + refresh_period, refresh_period);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight: Option<JoinHandle<()>> = None;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tick.tick() => draw(&mut session),
            _ = refresh.tick(), if runner.is_some() => {
                if in_flight.as_ref().is_some_and(|task| !task.is_finished()) {
                    tracing::debug!("previous refresh still running, skipping");
                } else if let Some(runner) = &runner {
                    // Results reach the session through the store's change channel.
                    in_flight = Some(spawn_refresh(Arc::clone(runner), Arc::clone(&store)));
                }
            }
            Ok(()) = changes.changed() => {
                let latest = changes.borrow_and_update().clone();
                if let Some(record) = latest {
                    tracing::debug!(fetched_at = %record.fetched_at, "stored record changed");
                    session.apply(record);
                }
            }
            result = &mut shutdown => {
                result?;
                tracing::info!("received ctrl-c, closing panel");
                break;
            }
        }
    }

    if let Some(task) = in_flight {
        task.abort();
    }
    Ok(())
}

/// Fetches in the background so ticks keep drawing while the page loads.
pub(crate) fn spawn_refresh(runner: Arc<PageRunner>, store: Arc<RecordStore>) -> JoinHandle<()> {
    tokio::spawn(async move {
        request_fetch(&runner, &store, Local::now().date_naive()).await;
    })
}

fn draw(session: &mut PanelSession) {
    if let Some(text) = session.render(Local::now().naive_local()) {
        print!("{CLEAR_SCREEN}{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tsinfo_core::ClockTime;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn working_since(hour: u32, minute: u32) -> AttendanceRecord {
        AttendanceRecord {
            clock_in: ClockTime::new(hour, minute),
            clock_out: None,
            is_working: true,
            summary: None,
            fetched_at: Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn new_session_renders_loading_state() {
        let mut session = PanelSession::new(ProjectionEngine::default());
        assert!(!session.is_initialized());
        let text = session.render(at(9, 0, 0)).unwrap();
        assert!(text.contains("読込中..."));
    }

    #[test]
    fn unchanged_frame_is_not_redrawn() {
        let mut session = PanelSession::new(ProjectionEngine::default());
        session.apply(working_since(9, 0));
        assert!(session.is_initialized());
        assert!(session.render(at(10, 0, 0)).is_some());
        assert!(session.render(at(10, 0, 0)).is_none());
        let next = session.render(at(10, 0, 1)).unwrap();
        assert!(next.contains("01:00:01"));
    }

    #[test]
    fn applying_a_new_record_changes_the_frame() {
        let mut session = PanelSession::new(ProjectionEngine::default());
        session.apply(working_since(9, 0));
        session.render(at(10, 0, 0));
        session.apply(working_since(8, 0));
        let text = session.render(at(10, 0, 0)).unwrap();
        assert!(text.contains("02:00:00"));
    }
}
