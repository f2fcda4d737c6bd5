// Author: Dustin Pilgrim
// License: MIT

use serde::Serialize;

/// Named states of the timeout machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No deadline is tracked.
    Stopped,
    /// Counting down towards the deadline.
    Active,
    /// The deadline elapsed without activity.
    Idle,
    /// Deadline tracking suspended; the deadline itself is remembered.
    Paused,
}

#[derive(Debug, Clone)]
pub struct State {
    phase: Phase,

    // Mirrors config; the manager copies it in on construction.
    timeout_ms: u64,

    // Timing (ms on the injected monotonic clock)
    last_active_ms: u64,
    deadline_ms: Option<u64>,

    // Display value. Only authoritative while paused/stopped.
    remaining_ms: u64,

    pause_started_ms: Option<u64>,

    // Idle-episode latch: true once "became idle" has fired for this episode.
    idle_notified: bool,

    // Set once the session-ending collaborator has been asked to log out.
    // Plain activity no longer revives the countdown after that.
    session_ended: bool,
}

impl State {
    pub fn new(timeout_ms: u64, now_ms: u64) -> Self {
        Self {
            phase: Phase::Stopped,
            timeout_ms,
            last_active_ms: now_ms,
            deadline_ms: None,
            remaining_ms: timeout_ms,
            pause_started_ms: None,
            idle_notified: false,
            session_ended: false,
        }
    }

    // ---------------- getters ----------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn last_active_ms(&self) -> u64 {
        self.last_active_ms
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn pause_started_ms(&self) -> Option<u64> {
        self.pause_started_ms
    }

    pub fn idle_notified(&self) -> bool {
        self.idle_notified
    }

    pub fn session_ended(&self) -> bool {
        self.session_ended
    }

    /// Remaining time as seen at `now_ms`.
    pub fn remaining_at(&self, now_ms: u64) -> u64 {
        match self.phase {
            Phase::Active => self
                .deadline_ms
                .map(|d| d.saturating_sub(now_ms))
                .unwrap_or(self.remaining_ms),
            Phase::Idle => 0,
            Phase::Paused | Phase::Stopped => self.remaining_ms,
        }
    }

    /// Last computed remaining value (updated on every transition and tick).
    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    // ---------------- transitions ----------------

    /// Enter `Active` with a fresh countdown ending at `deadline_ms`.
    pub fn begin_cycle(&mut self, now_ms: u64, deadline_ms: u64) {
        self.phase = Phase::Active;
        self.last_active_ms = now_ms;
        self.deadline_ms = Some(deadline_ms);
        self.remaining_ms = deadline_ms.saturating_sub(now_ms);
        self.pause_started_ms = None;
        self.idle_notified = false;
    }

    /// Re-enter `Active` after a pause; `last_active_ms` is left alone.
    pub fn continue_cycle(&mut self, now_ms: u64, deadline_ms: u64) {
        self.phase = Phase::Active;
        self.deadline_ms = Some(deadline_ms);
        self.remaining_ms = deadline_ms.saturating_sub(now_ms);
        self.pause_started_ms = None;
    }

    /// Enter `Idle`. Returns true when this starts a new idle episode,
    /// i.e. the "became idle" notification is due.
    pub fn enter_idle(&mut self) -> bool {
        self.phase = Phase::Idle;
        self.remaining_ms = 0;
        self.pause_started_ms = None;

        if self.idle_notified {
            return false;
        }
        self.idle_notified = true;
        true
    }

    pub fn enter_paused(&mut self, now_ms: u64) {
        self.remaining_ms = self.remaining_at(now_ms);
        self.phase = Phase::Paused;
        self.pause_started_ms = Some(now_ms);
    }

    pub fn enter_stopped(&mut self) {
        self.phase = Phase::Stopped;
        self.deadline_ms = None;
        self.remaining_ms = self.timeout_ms;
        self.pause_started_ms = None;
        self.idle_notified = false;
    }

    /// Recompute the display value. Never touches the deadline.
    pub fn refresh(&mut self, now_ms: u64) {
        self.remaining_ms = self.remaining_at(now_ms);
    }

    pub fn set_session_ended(&mut self, v: bool) {
        self.session_ended = v;
    }
}
