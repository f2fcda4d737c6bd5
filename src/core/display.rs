// Author: Dustin Pilgrim
// License: MIT

//! Pure helpers for presenting a countdown. All inputs are clamped; nothing
//! here panics on out-of-range values.

use serde::Serialize;

/// Below this the countdown is critical.
pub const CRITICAL_BELOW_MS: i64 = 2 * 60 * 1000;

/// Below this the countdown is a warning.
pub const WARNING_BELOW_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Normal => "normal",
            Urgency::Warning => "warning",
            Urgency::Critical => "critical",
        }
    }
}

/// Largest unit first: `42s`, `4m 10s`, `1h 5m`.
pub fn format_remaining(ms: i64) -> String {
    let secs = ms.max(0) / 1000;

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        let minutes = secs / 60;
        let seconds = secs % 60;
        format!("{}m {}s", minutes, seconds)
    } else {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        format!("{}h {}m", hours, minutes)
    }
}

pub fn classify_urgency(remaining_ms: i64) -> Urgency {
    let r = remaining_ms.max(0);
    if r < CRITICAL_BELOW_MS {
        Urgency::Critical
    } else if r < WARNING_BELOW_MS {
        Urgency::Warning
    } else {
        Urgency::Normal
    }
}

/// Share of `total_ms` already used up, in `[0, 100]`.
///
/// A non-positive total counts as fully elapsed.
pub fn percentage_elapsed(remaining_ms: i64, total_ms: i64) -> f64 {
    if total_ms <= 0 {
        return 100.0;
    }

    let remaining = remaining_ms.clamp(0, total_ms);
    let elapsed = (total_ms - remaining) as f64;

    (elapsed / total_ms as f64 * 100.0).clamp(0.0, 100.0)
}
