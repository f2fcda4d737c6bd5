// Author: Dustin Pilgrim
// License: MIT

mod engine;
mod snapshot;

use crate::core::{config::TimerConfig, error::Error, state::State};

/// Pure timeout state machine. Owns the validated config; the caller owns
/// the [`State`] and feeds it events stamped with the current time.
#[derive(Debug, Clone)]
pub struct Manager {
    cfg: TimerConfig,
}

impl Manager {
    pub fn new(cfg: TimerConfig) -> Result<Self, Error> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &TimerConfig {
        &self.cfg
    }

    /// Fresh, stopped state for this manager's timeout.
    pub fn new_state(&self, now_ms: u64) -> State {
        State::new(self.cfg.timeout_ms, now_ms)
    }
}
