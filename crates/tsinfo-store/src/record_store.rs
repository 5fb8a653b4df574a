use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tsinfo_core::AttendanceRecord;

use crate::StoreError;

/// On-disk shape of the store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredState {
    pub attendance_data: AttendanceRecord,
    /// `fetchedAt` as Unix milliseconds.
    pub last_fetched: i64,
}

impl From<&AttendanceRecord> for StoredState {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            attendance_data: record.clone(),
            last_fetched: record.fetched_at.timestamp_millis(),
        }
    }
}

/// File-backed holder of the single current [`AttendanceRecord`].
pub struct RecordStore {
    path: PathBuf,
    tx: watch::Sender<Option<AttendanceRecord>>,
}

impl RecordStore {
    /// Opens the store at `path`, reading any record already saved there.
    ///
    /// A missing file is an empty store. A corrupt file is logged and
    /// treated as empty so a bad write never locks the user out.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = match read_state(&path).await {
            Ok(state) => state.map(|s| s.attendance_data),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable attendance store");
                None
            }
        };
        let (tx, _rx) = watch::channel(initial);
        Self { path, tx }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the stored record and notifies subscribers.
    ///
    /// The file is written to a uniquely named temp file in the same
    /// directory and renamed into place, so readers never see a partial
    /// record and concurrent writers never share a temp file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory or file cannot be written.
    pub async fn save(&self, record: &AttendanceRecord) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&StoredState::from(record)).map_err(|source| {
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| self.io_error(source))?;

        let target = self.path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&dir, &target, &json))
            .await
            .map_err(std::io::Error::other)
            .and_then(|written| written)
            .map_err(|source| self.io_error(source))?;

        tracing::debug!(
            path = %self.path.display(),
            fetched_at = %record.fetched_at,
            "attendance saved"
        );
        self.tx.send_replace(Some(record.clone()));
        Ok(())
    }

    /// Reads the record from disk. `None` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read, or
    /// [`StoreError::Json`] if its contents do not parse.
    pub async fn load(&self) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(read_state(&self.path).await?.map(|s| s.attendance_data))
    }

    /// The last record saved or loaded by this handle.
    #[must_use]
    pub fn current(&self) -> Option<AttendanceRecord> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AttendanceRecord>> {
        self.tx.subscribe()
    }

    /// Calls `callback` with every record saved from now on.
    ///
    /// The task ends when the store is dropped.
    pub fn on_change<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(AttendanceRecord) + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let latest = rx.borrow_and_update().clone();
                if let Some(record) = latest {
                    callback(record);
                }
            }
        })
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

async fn read_state(path: &Path) -> Result<Option<StoredState>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
}

fn atomic_write(dir: &Path, target: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tsinfo_core::ClockTime;

    #[test]
    fn stored_state_uses_camel_case_and_millis() {
        let record = AttendanceRecord {
            clock_in: ClockTime::new(9, 0),
            clock_out: None,
            is_working: true,
            summary: None,
            fetched_at: Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(StoredState::from(&record)).unwrap();
        assert_eq!(value["lastFetched"], 1_792_108_800_000_i64);
        assert_eq!(value["attendanceData"]["clockIn"], "09:00");
        assert_eq!(value["attendanceData"]["isWorking"], true);
    }
}
