// Author: Dustin Pilgrim
// License: MIT

use crate::core::{info::TimerSnapshot, state::State};

use super::Manager;

impl Manager {
    pub fn snapshot(&self, state: &State, now_ms: u64) -> TimerSnapshot {
        TimerSnapshot::new(
            state.phase(),
            state.remaining_at(now_ms),
            state.last_active_ms(),
            state.deadline_ms(),
            self.cfg.timeout_ms,
            state.session_ended(),
        )
    }
}
