//! Frame loading, attendance extraction and cross-frame reconciliation.

pub mod client;
pub mod dom;
pub mod error;
pub mod extract;
pub mod matcher;
pub(crate) mod rate_limit;
pub mod reconcile;
pub mod runner;

pub use client::FrameClient;
pub use error::ScraperError;
pub use extract::{clock_in_element_id, extract_frame, FrameSnapshot};
pub use reconcile::{reconcile, reconcile_channel, Reconciler};
pub use runner::{FrameSource, PageRunner};
