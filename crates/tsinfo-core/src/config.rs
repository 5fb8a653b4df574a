use crate::app_config::{AppConfig, Environment, DEFAULT_ATTENDANCE_URL};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// config. Tests drive this with a `HashMap` lookup instead of touching the
/// process environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        or_default(var, default)
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("TSINFO_ENV", "development"))?;
    let log_level = or_default("TSINFO_LOG_LEVEL", "info");

    let attendance_url = or_default("TSINFO_ATTENDANCE_URL", DEFAULT_ATTENDANCE_URL);
    if !attendance_url.starts_with("http://") && !attendance_url.starts_with("https://") {
        return Err(invalid(
            "TSINFO_ATTENDANCE_URL",
            format!("'{attendance_url}' is not an http(s) URL"),
        ));
    }

    let frames_path = PathBuf::from(or_default("TSINFO_FRAMES_PATH", "./config/frames.yaml"));
    let store_path = PathBuf::from(or_default("TSINFO_STORE_PATH", "./data/attendance.json"));
    let session_cookie = lookup("TSINFO_SESSION_COOKIE")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let request_timeout_secs = parse_u64("TSINFO_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("TSINFO_USER_AGENT", "tsinfo/0.1 (attendance-panel)");
    let settle_delay_ms = parse_u64("TSINFO_SETTLE_DELAY_MS", "8000")?;
    let max_retries = parse_u32("TSINFO_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("TSINFO_RETRY_BACKOFF_BASE_MS", "1000")?;
    let max_concurrent_frames = parse_usize("TSINFO_MAX_CONCURRENT_FRAMES", "4")?;
    if max_concurrent_frames == 0 {
        return Err(invalid(
            "TSINFO_MAX_CONCURRENT_FRAMES",
            "must be at least 1".to_string(),
        ));
    }

    let refresh_interval_secs = parse_u64("TSINFO_REFRESH_INTERVAL_SECS", "60")?;
    let tick_interval_ms = parse_u64("TSINFO_TICK_INTERVAL_MS", "1000")?;
    if tick_interval_ms == 0 {
        return Err(invalid(
            "TSINFO_TICK_INTERVAL_MS",
            "must be greater than 0".to_string(),
        ));
    }

    let break_minutes = parse_i64("TSINFO_BREAK_MINUTES", "60")?;
    if break_minutes < 0 {
        return Err(invalid(
            "TSINFO_BREAK_MINUTES",
            format!("{break_minutes} is negative"),
        ));
    }

    Ok(AppConfig {
        env,
        log_level,
        attendance_url,
        frames_path,
        store_path,
        session_cookie,
        request_timeout_secs,
        user_agent,
        settle_delay_ms,
        max_retries,
        retry_backoff_base_ms,
        max_concurrent_frames,
        refresh_interval_secs,
        tick_interval_ms,
        break_minutes,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TSINFO_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
