use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Default attendance page: the `TeamSpirit` work-time view.
pub const DEFAULT_ATTENDANCE_URL: &str =
    "https://teamspirit-74532.lightning.force.com/lightning/n/teamspirit__AtkWorkTimeView";

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub attendance_url: String,
    pub frames_path: PathBuf,
    pub store_path: PathBuf,
    pub session_cookie: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub settle_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_concurrent_frames: usize,
    pub refresh_interval_secs: u64,
    pub tick_interval_ms: u64,
    pub break_minutes: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("attendance_url", &self.attendance_url)
            .field("frames_path", &self.frames_path)
            .field("store_path", &self.store_path)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[redacted]"),
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("max_concurrent_frames", &self.max_concurrent_frames)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("break_minutes", &self.break_minutes)
            .finish()
    }
}
