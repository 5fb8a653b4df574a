//! Frame list configuration.
//!
//! The attendance page is composed of a top document plus nested frames
//! (the work-time grid usually lives in an embedded Visualforce frame). When
//! those frames must be fetched directly, their URLs are listed in a YAML
//! file:
//!
//! ```yaml
//! frames:
//!   - id: work-time-grid
//!     url: https://example.visualforce.com/apex/AtkWorkTimeView
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FramesFile {
    #[serde(default)]
    pub frames: Vec<FrameConfig>,
}

/// Load and validate the frame list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_frames(path: &Path) -> Result<FramesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FramesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_frames(&content)
}

fn parse_frames(content: &str) -> Result<FramesFile, ConfigError> {
    // An empty document deserializes to unit, not to an empty struct.
    if content.trim().is_empty() {
        return Ok(FramesFile::default());
    }

    let frames_file: FramesFile = serde_yaml::from_str(content)?;
    validate_frames(&frames_file)?;
    Ok(frames_file)
}

fn validate_frames(frames_file: &FramesFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for frame in &frames_file.frames {
        if frame.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "frame id must be non-empty".to_string(),
            ));
        }

        if !frame.url.starts_with("http://") && !frame.url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "frame '{}' has non-http url '{}'",
                frame.id, frame.url
            )));
        }

        if !seen_ids.insert(frame.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate frame id: '{}'",
                frame.id
            )));
        }
    }

    Ok(())
}
