// Author: Dustin Pilgrim
// License: MIT

use serde::Serialize;

use crate::core::{
    display::{classify_urgency, format_remaining, percentage_elapsed, Urgency},
    state::Phase,
};

/// Read-only view of the machine, handed to presentation code.
///
/// `remaining_ms` is derived at sampling time; the ground truth is the deadline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub is_idle: bool,
    pub remaining_ms: u64,
    pub last_active_ms: u64,
    pub deadline_ms: Option<u64>,
    pub timeout_ms: u64,
    pub session_ended: bool,
    pub urgency: Urgency,
    pub remaining_text: String,
}

impl TimerSnapshot {
    pub fn new(
        phase: Phase,
        remaining_ms: u64,
        last_active_ms: u64,
        deadline_ms: Option<u64>,
        timeout_ms: u64,
        session_ended: bool,
    ) -> Self {
        let signed = i64::try_from(remaining_ms).unwrap_or(i64::MAX);
        Self {
            phase,
            is_idle: phase == Phase::Idle,
            remaining_ms,
            last_active_ms,
            deadline_ms,
            timeout_ms,
            session_ended,
            urgency: classify_urgency(signed),
            remaining_text: format_remaining(signed),
        }
    }

    pub fn percentage_elapsed(&self) -> f64 {
        percentage_elapsed(
            i64::try_from(self.remaining_ms).unwrap_or(i64::MAX),
            i64::try_from(self.timeout_ms).unwrap_or(i64::MAX),
        )
    }

    /// One status line for terminals and logs.
    pub fn status_line(&self) -> String {
        let phase = match self.phase {
            Phase::Stopped => "stopped",
            Phase::Active => "active",
            Phase::Idle => "idle",
            Phase::Paused => "paused",
        };

        let mut line = format!(
            "{phase}: {} left [{}] {:.0}% elapsed",
            self.remaining_text,
            self.urgency.as_str(),
            self.percentage_elapsed()
        );
        if self.session_ended {
            line.push_str(" (session ended)");
        }
        line
    }
}
