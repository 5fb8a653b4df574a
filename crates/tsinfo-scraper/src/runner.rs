//! One full pass over the attendance page: load every frame, wait for the
//! page to settle, extract each frame, and reconcile in scan order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tsinfo_core::{ExtractionResult, FrameConfig, FrameId};

use crate::client::FrameClient;
use crate::error::ScraperError;
use crate::extract::{extract_frame, FrameSnapshot};
use crate::reconcile::{reconcile_channel, Reconciler};

/// Where frame markup comes from.
pub enum FrameSource {
    /// Live frames downloaded over HTTP, at most `max_concurrent` at a time.
    Http {
        client: FrameClient,
        frames: Vec<FrameConfig>,
        max_concurrent: usize,
    },
    /// Saved snapshots on disk; the file stem becomes the frame id.
    Files(Vec<PathBuf>),
}

impl FrameSource {
    #[must_use]
    pub fn frame_count(&self) -> usize {
        match self {
            FrameSource::Http { frames, .. } => frames.len(),
            FrameSource::Files(paths) => paths.len(),
        }
    }

    /// Loads every frame, preserving scan order. Individual failures are
    /// returned alongside the frame id they belong to.
    async fn load_all(&self) -> Vec<(FrameId, Result<FrameSnapshot, ScraperError>)> {
        match self {
            FrameSource::Http {
                client,
                frames,
                max_concurrent,
            } => {
                // Owned frames keep the future `Send` for `tokio::spawn` callers.
                stream::iter(frames.iter().cloned())
                    .map(|frame: FrameConfig| async move {
                        let result = client.fetch_frame(&frame).await;
                        (FrameId::new(frame.id), result)
                    })
                    .buffered((*max_concurrent).max(1))
                    .collect()
                    .await
            }
            FrameSource::Files(paths) => {
                let mut loaded = Vec::with_capacity(paths.len());
                for path in paths {
                    let id = frame_id_for_path(path);
                    let snapshot = tokio::fs::read_to_string(path)
                        .await
                        .map(|html| FrameSnapshot::new(id.as_str(), html))
                        .map_err(|source| ScraperError::Io {
                            path: path.clone(),
                            source,
                        });
                    loaded.push((id, snapshot));
                }
                loaded
            }
        }
    }
}

fn frame_id_for_path(path: &Path) -> FrameId {
    FrameId::new(
        path.file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned()),
    )
}

/// Drives one extraction pass over a [`FrameSource`].
pub struct PageRunner {
    source: FrameSource,
    settle_delay: Duration,
}

impl PageRunner {
    #[must_use]
    pub fn new(source: FrameSource, settle_delay: Duration) -> Self {
        Self {
            source,
            settle_delay,
        }
    }

    /// Loads, settles, extracts and reconciles. The returned reconciler has
    /// seen one result per frame; call [`Reconciler::finish`] for the record.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::NoFrames`] if the source lists no frames.
    /// - [`ScraperError::AllFramesFailed`] if not a single frame could be loaded.
    pub async fn run(&self, today: NaiveDate) -> Result<Reconciler, ScraperError> {
        let attempted = self.source.frame_count();
        if attempted == 0 {
            return Err(ScraperError::NoFrames);
        }

        let loaded = self.source.load_all().await;
        let failures = loaded.iter().filter(|(_, r)| r.is_err()).count();
        if failures == attempted {
            for (id, result) in &loaded {
                if let Err(e) = result {
                    tracing::error!(frame = %id, error = %e, "frame load failed");
                }
            }
            return Err(ScraperError::AllFramesFailed { attempted });
        }

        if !self.settle_delay.is_zero() {
            tracing::debug!(delay = ?self.settle_delay, "waiting for page to settle");
            tokio::time::sleep(self.settle_delay).await;
        }

        let (tx, rx) = mpsc::channel(attempted);
        let produce = async move {
            for (id, loaded) in loaded {
                let result = match loaded {
                    Ok(snapshot) => extract_frame(&snapshot, today),
                    Err(e) => {
                        tracing::warn!(frame = %id, error = %e, "frame load failed, skipping");
                        ExtractionResult::failed(id, format!("load failed: {e}"))
                    }
                };
                if tx.send(result).await.is_err() {
                    break;
                }
            }
        };
        let ((), reconciler) = tokio::join!(produce, reconcile_channel(rx));

        tracing::info!(
            frames = attempted,
            failures,
            found = reconciler.best().is_some(),
            "extraction pass complete"
        );
        Ok(reconciler)
    }
}
