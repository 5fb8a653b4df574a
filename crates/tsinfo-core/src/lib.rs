pub mod app_config;
pub mod attendance;
pub mod config;
pub mod fields;
pub mod frames;
pub mod projection;

pub use app_config::{AppConfig, Environment};
pub use attendance::{
    AttendanceRecord, ClockTime, ExtractionResult, FrameId, SignedDuration, SummaryFields,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use frames::{load_frames, FrameConfig, FramesFile};
pub use projection::{
    OverUnder, PaceTarget, Projection, ProjectionEngine, TargetFinish, WorkStatus,
    DEFAULT_BREAK_MINUTES,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read frames file {path}: {source}")]
    FramesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse frames file: {0}")]
    FramesFileParse(#[from] serde_yaml::Error),

    #[error("frames config validation failed: {0}")]
    Validation(String),
}
