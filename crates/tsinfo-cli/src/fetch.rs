//! Fetch orchestration: build the frame list, run one extraction pass, and
//! persist whatever the reconciler produced.
//!
//! Collaborator failures (network, storage) are logged and degrade to "no
//! data"; only setup mistakes in configuration are returned as errors.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, NaiveDate, Utc};
use tsinfo_core::{AppConfig, AttendanceRecord, FrameConfig, ProjectionEngine};
use tsinfo_scraper::{FrameClient, FrameSource, PageRunner};
use tsinfo_store::RecordStore;

use crate::panel;

/// Frame id of the configured attendance page itself.
pub(crate) const MAIN_FRAME_ID: &str = "main";

/// The attendance page first, then any extra frames from the frames file.
pub(crate) fn frame_list(config: &AppConfig) -> anyhow::Result<Vec<FrameConfig>> {
    let mut frames = vec![FrameConfig {
        id: MAIN_FRAME_ID.to_string(),
        url: config.attendance_url.clone(),
    }];

    if !config.frames_path.exists() {
        tracing::debug!(
            path = %config.frames_path.display(),
            "no frames file, fetching the attendance page only"
        );
        return Ok(frames);
    }

    let extra = tsinfo_core::load_frames(&config.frames_path)
        .with_context(|| format!("loading {}", config.frames_path.display()))?;
    for frame in extra.frames {
        if frame.id == MAIN_FRAME_ID {
            anyhow::bail!(
                "frame id '{MAIN_FRAME_ID}' is reserved for TSINFO_ATTENDANCE_URL; rename it in {}",
                config.frames_path.display()
            );
        }
        frames.push(frame);
    }
    Ok(frames)
}

pub(crate) fn build_http_runner(config: &AppConfig) -> anyhow::Result<PageRunner> {
    let client = FrameClient::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.session_cookie.clone(),
        config.max_retries,
        config.retry_backoff_base_ms,
    )?;
    if config.session_cookie.is_none() {
        tracing::warn!(
            "TSINFO_SESSION_COOKIE is not set; the attendance page will likely show a login form"
        );
    }
    let source = FrameSource::Http {
        client,
        frames: frame_list(config)?,
        max_concurrent: config.max_concurrent_frames,
    };
    Ok(PageRunner::new(
        source,
        Duration::from_millis(config.settle_delay_ms),
    ))
}

/// Runs one pass and saves the result. `None` means no data: either no
/// frame yielded anything or the pass itself failed (already logged).
pub(crate) async fn request_fetch(
    runner: &PageRunner,
    store: &RecordStore,
    today: NaiveDate,
) -> Option<AttendanceRecord> {
    let reconciler = match runner.run(today).await {
        Ok(reconciler) => reconciler,
        Err(e) => {
            tracing::warn!(error = %e, "attendance fetch failed");
            return None;
        }
    };

    let Some(record) = reconciler.finish(Utc::now()) else {
        tracing::info!("no frame contained attendance data");
        return None;
    };

    if let Err(e) = store.save(&record).await {
        tracing::error!(error = %e, "failed to persist attendance record");
    }
    Some(record)
}

pub(crate) async fn run_fetch(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let runner = build_http_runner(config)?;
    let store = RecordStore::open(&config.store_path).await;
    let record = request_fetch(&runner, &store, Local::now().date_naive())
        .await
        .context("no attendance data found; see the log for per-frame details")?;
    print_record(config, &record, json)
}

pub(crate) async fn run_extract(
    config: &AppConfig,
    files: Vec<PathBuf>,
    date: Option<NaiveDate>,
    save: bool,
    json: bool,
) -> anyhow::Result<()> {
    let today = date.unwrap_or_else(|| Local::now().date_naive());
    let runner = PageRunner::new(FrameSource::Files(files), Duration::ZERO);
    let reconciler = runner.run(today).await?;

    if let Some(best) = reconciler.best() {
        for diagnostic in &best.diagnostics {
            tracing::info!(frame = %best.source_frame_id, %diagnostic, "extraction note");
        }
    }
    let record = reconciler
        .finish(Utc::now())
        .context("no snapshot contained attendance data")?;

    if save {
        RecordStore::open(&config.store_path)
            .await
            .save(&record)
            .await?;
    }
    print_record(config, &record, json)
}

pub(crate) async fn run_status(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let store = RecordStore::open(&config.store_path).await;
    match store.load().await? {
        Some(record) => print_record(config, &record, json),
        None if json => {
            println!("null");
            Ok(())
        }
        None => {
            println!(
                "{}",
                panel::render(None, &ProjectionEngine::default(), Local::now().naive_local())
            );
            Ok(())
        }
    }
}

fn print_record(config: &AppConfig, record: &AttendanceRecord, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        let engine = ProjectionEngine::new(config.break_minutes);
        println!("{}", panel::render(Some(record), &engine, Local::now().naive_local()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
