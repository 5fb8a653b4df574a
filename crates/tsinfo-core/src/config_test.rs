use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_test() {
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("unknown").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "TSINFO_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.attendance_url, DEFAULT_ATTENDANCE_URL);
    assert_eq!(cfg.frames_path.to_string_lossy(), "./config/frames.yaml");
    assert_eq!(cfg.store_path.to_string_lossy(), "./data/attendance.json");
    assert!(cfg.session_cookie.is_none());
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.user_agent, "tsinfo/0.1 (attendance-panel)");
    assert_eq!(cfg.settle_delay_ms, 8000);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert_eq!(cfg.max_concurrent_frames, 4);
    assert_eq!(cfg.refresh_interval_secs, 60);
    assert_eq!(cfg.tick_interval_ms, 1000);
    assert_eq!(cfg.break_minutes, 60);
}

#[test]
fn build_app_config_fails_on_invalid_tsinfo_env() {
    let mut map = HashMap::new();
    map.insert("TSINFO_ENV", "producton");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TSINFO_ENV"),
        "expected InvalidEnvVar(TSINFO_ENV), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_non_http_attendance_url() {
    let mut map = HashMap::new();
    map.insert("TSINFO_ATTENDANCE_URL", "ftp://example.com/page");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TSINFO_ATTENDANCE_URL"),
        "expected InvalidEnvVar(TSINFO_ATTENDANCE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_settle_delay_override() {
    let mut map = HashMap::new();
    map.insert("TSINFO_SETTLE_DELAY_MS", "12000");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.settle_delay_ms, 12000);
}

#[test]
fn build_app_config_settle_delay_invalid() {
    let mut map = HashMap::new();
    map.insert("TSINFO_SETTLE_DELAY_MS", "eight seconds");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TSINFO_SETTLE_DELAY_MS"),
        "expected InvalidEnvVar(TSINFO_SETTLE_DELAY_MS), got: {result:?}"
    );
}

#[test]
fn build_app_config_session_cookie_is_read_and_blank_is_ignored() {
    let mut map = HashMap::new();
    map.insert("TSINFO_SESSION_COOKIE", "sid=abc123");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.session_cookie.as_deref(), Some("sid=abc123"));

    map.insert("TSINFO_SESSION_COOKIE", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.session_cookie.is_none());
}

#[test]
fn debug_output_redacts_session_cookie() {
    let mut map = HashMap::new();
    map.insert("TSINFO_SESSION_COOKIE", "sid=secret-value");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("secret-value"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn build_app_config_max_retries_override() {
    let mut map = HashMap::new();
    map.insert("TSINFO_MAX_RETRIES", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_retries, 5);
}

#[test]
fn build_app_config_max_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("TSINFO_MAX_RETRIES", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TSINFO_MAX_RETRIES"),
        "expected InvalidEnvVar(TSINFO_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_concurrent_frames() {
    let mut map = HashMap::new();
    map.insert("TSINFO_MAX_CONCURRENT_FRAMES", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TSINFO_MAX_CONCURRENT_FRAMES"),
        "expected InvalidEnvVar(TSINFO_MAX_CONCURRENT_FRAMES), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_tick_interval() {
    let mut map = HashMap::new();
    map.insert("TSINFO_TICK_INTERVAL_MS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TSINFO_TICK_INTERVAL_MS"),
        "expected InvalidEnvVar(TSINFO_TICK_INTERVAL_MS), got: {result:?}"
    );
}

#[test]
fn build_app_config_break_minutes_override() {
    let mut map = HashMap::new();
    map.insert("TSINFO_BREAK_MINUTES", "45");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.break_minutes, 45);
}

#[test]
fn build_app_config_rejects_negative_break_minutes() {
    let mut map = HashMap::new();
    map.insert("TSINFO_BREAK_MINUTES", "-15");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TSINFO_BREAK_MINUTES"),
        "expected InvalidEnvVar(TSINFO_BREAK_MINUTES), got: {result:?}"
    );
}
