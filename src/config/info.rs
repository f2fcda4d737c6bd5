// Author: Dustin Pilgrim
// License: MIT

use serde_json::json;

use super::{duration::format_duration_ms, Settings};

const LABELS: [&str; 12] = [
    "Source",
    "Timeout",
    "Throttle",
    "RefreshInterval",
    "AutoStart",
    "ActivityEvents",
    "PauseClock",
    "OnIdle",
    "OnExpiredResume",
    "TextEntryTargets",
    "ExtendCommand",
    "EndCommand",
];

impl Settings {
    /// Aligned `label │ value` listing for `vigil check`.
    pub fn pretty_print(&self) -> String {
        let width = LABELS.iter().map(|s| s.len()).max().unwrap_or(0);
        let t = &self.timer;

        let kinds: Vec<String> = t.activity_kinds.iter().map(|k| k.to_string()).collect();
        let targets: Vec<String> = t.text_entry_targets.iter().map(|p| p.to_string()).collect();

        let rows = [
            self.source
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in defaults".to_string()),
            format_duration_ms(t.timeout_ms),
            format_duration_ms(t.throttle_ms),
            format_duration_ms(t.refresh_ms),
            t.auto_start.to_string(),
            kinds.join(", "),
            t.pause_clock.to_string(),
            t.on_idle.to_string(),
            t.on_expired_resume.to_string(),
            if targets.is_empty() { "-".to_string() } else { targets.join(", ") },
            self.extend_command.clone().unwrap_or_else(|| "-".to_string()),
            self.end_command.clone().unwrap_or_else(|| "-".to_string()),
        ];

        let mut out = String::from("◆ CONFIG\n");
        for (label, value) in LABELS.iter().zip(rows.iter()) {
            out.push_str(&format!("  {:<width$}    │ {}\n", label, value, width = width));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Value {
        let t = &self.timer;
        json!({
            "source": self.source.as_ref().map(|p| p.display().to_string()),
            "timeout_ms": t.timeout_ms,
            "throttle_ms": t.throttle_ms,
            "refresh_ms": t.refresh_ms,
            "auto_start": t.auto_start,
            "activity_events": t.activity_kinds.iter().map(|k| k.to_string()).collect::<Vec<_>>(),
            "pause_clock": t.pause_clock.to_string(),
            "on_idle": t.on_idle.to_string(),
            "on_expired_resume": t.on_expired_resume.to_string(),
            "text_entry_targets": t.text_entry_targets.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            "extend_command": self.extend_command,
            "end_command": self.end_command,
        })
    }
}
