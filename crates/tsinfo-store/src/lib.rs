//! Persistence for the current attendance record.
//!
//! One record is kept in a small JSON file and replaced wholesale on every
//! successful fetch. Subscribers are told about each replacement through a
//! `tokio::sync::watch` channel.

use std::path::PathBuf;

use thiserror::Error;

pub mod record_store;

pub use record_store::{RecordStore, StoredState};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
