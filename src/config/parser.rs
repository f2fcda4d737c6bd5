// Author: Dustin Pilgrim
// License: MIT

use std::path::PathBuf;

use rune_cfg::{RuneConfig, Value};

use crate::core::{
    config::{
        IdlePolicy, PauseClock, Pattern, SignalKind, TimerConfig, DEFAULT_REFRESH_MS,
        DEFAULT_THROTTLE_MS, DEFAULT_TIMEOUT_MS,
    },
    error::ConfigError,
};

use super::{
    duration::parse_duration_ms,
    pattern::{compile_regex, parse_target_pattern},
    ConfigLoadError,
};

/// Everything the binary reads from a config file.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub timer: TimerConfig,
    pub extend_command: Option<String>,
    pub end_command: Option<String>,

    /// File the settings came from; `None` for built-in defaults.
    pub source: Option<PathBuf>,
}

/// Keys are looked up as written (snake_case) and as kebab-case.
fn kebab(key: &str) -> String {
    format!("vigil.{}", key.replace('_', "-"))
}

fn snake(key: &str) -> String {
    format!("vigil.{}", key)
}

fn get_string(config: &RuneConfig, key: &str) -> Option<String> {
    config
        .get::<String>(&snake(key))
        .or_else(|_| config.get::<String>(&kebab(key)))
        .ok()
}

fn get_bool(config: &RuneConfig, key: &str) -> Option<bool> {
    config
        .get::<bool>(&snake(key))
        .or_else(|_| config.get::<bool>(&kebab(key)))
        .ok()
}

fn get_value(config: &RuneConfig, key: &str) -> Option<Value> {
    config
        .get_value(&snake(key))
        .or_else(|_| config.get_value(&kebab(key)))
        .ok()
}

/// Durations are strings (`"15m"`, `"250ms"`) or plain numbers of seconds.
/// Fractional seconds are allowed down to whole milliseconds.
fn get_duration_ms(config: &RuneConfig, key: &'static str) -> Result<Option<u64>, ConfigLoadError> {
    if let Some(s) = get_string(config, key) {
        return parse_duration_ms(&s)
            .map(Some)
            .map_err(|reason| ConfigLoadError::Invalid { key, reason });
    }

    match get_value(config, key) {
        Some(Value::Number(secs)) => seconds_to_ms(secs)
            .map(Some)
            .map_err(|reason| ConfigLoadError::Invalid { key, reason }),
        _ => Ok(None),
    }
}

fn seconds_to_ms(secs: f64) -> Result<u64, String> {
    let ms = secs * 1_000.0;

    if !ms.is_finite() || ms < 0.0 {
        return Err(format!("{} is not a valid number of seconds", secs));
    }
    if ms.fract() != 0.0 {
        return Err(format!("{} seconds is not a whole number of milliseconds", secs));
    }
    if ms >= u64::MAX as f64 {
        return Err(format!("{} seconds is too large", secs));
    }

    Ok(ms as u64)
}

fn parse_policy<T: std::str::FromStr<Err = String>>(
    config: &RuneConfig,
    key: &'static str,
) -> Result<Option<T>, ConfigLoadError> {
    get_string(config, key)
        .map(|s| s.parse::<T>().map_err(|reason| ConfigLoadError::Invalid { key, reason }))
        .transpose()
}

fn parse_activity_events(config: &RuneConfig) -> Result<Option<Vec<SignalKind>>, ConfigLoadError> {
    let Ok(names) = config
        .get::<Vec<String>>("vigil.activity_events")
        .or_else(|_| config.get::<Vec<String>>("vigil.activity-events"))
    else {
        return Ok(None);
    };

    names
        .iter()
        .map(|n| {
            n.parse::<SignalKind>().map_err(|reason| ConfigLoadError::Invalid {
                key: "activity_events",
                reason,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn parse_text_entry_targets(config: &RuneConfig) -> Result<Vec<Pattern>, ConfigLoadError> {
    let invalid = |reason| ConfigLoadError::Invalid {
        key: "text_entry_targets",
        reason,
    };

    match get_value(config, "text_entry_targets") {
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(parse_target_pattern(s).map_err(invalid)),
                Value::Regex(s) => Some(compile_regex(s).map_err(invalid)),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => Ok(vec![parse_target_pattern(&s).map_err(invalid)?]),
        Some(Value::Regex(s)) => Ok(vec![compile_regex(&s).map_err(invalid)?]),
        _ => Ok(Vec::new()),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse the `vigil` section of a loaded config and validate it.
pub fn parse_settings(config: &RuneConfig) -> Result<Settings, ConfigLoadError> {
    let mut timer = TimerConfig::default();

    timer.timeout_ms = get_duration_ms(config, "timeout")?.unwrap_or(DEFAULT_TIMEOUT_MS);

    let negative_throttle = match get_value(config, "throttle") {
        Some(Value::String(s)) => s.trim_start().starts_with('-'),
        Some(Value::Number(n)) => n < 0.0,
        _ => false,
    };
    if negative_throttle {
        return Err(ConfigError::NegativeThrottle.into());
    }
    timer.throttle_ms = get_duration_ms(config, "throttle")?.unwrap_or(DEFAULT_THROTTLE_MS);

    timer.refresh_ms = get_duration_ms(config, "refresh_interval")?.unwrap_or(DEFAULT_REFRESH_MS);

    if let Some(auto_start) = get_bool(config, "auto_start") {
        timer.auto_start = auto_start;
    }

    if let Some(kinds) = parse_activity_events(config)? {
        timer.activity_kinds = kinds.into_iter().collect();
    }

    if let Some(clock) = parse_policy::<PauseClock>(config, "pause_clock")? {
        timer.pause_clock = clock;
    }
    if let Some(policy) = parse_policy::<IdlePolicy>(config, "on_idle")? {
        timer.on_idle = policy;
    }
    if let Some(policy) = parse_policy::<IdlePolicy>(config, "on_expired_resume")? {
        timer.on_expired_resume = policy;
    }

    timer.text_entry_targets = parse_text_entry_targets(config)?;

    timer.validate()?;

    let settings = Settings {
        timer,
        extend_command: non_empty(get_string(config, "extend_command")),
        end_command: non_empty(get_string(config, "end_command")),
        source: None,
    };

    tracing::debug!(
        "parsed config: timeout={}ms throttle={}ms refresh={}ms kinds={}",
        settings.timer.timeout_ms,
        settings.timer.throttle_ms,
        settings.timer.refresh_ms,
        settings.timer.activity_kinds.len()
    );

    Ok(settings)
}
