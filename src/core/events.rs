// Author: Dustin Pilgrim
// License: MIT

use crate::core::config::SignalKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Sampling tick: deadline check and display refresh. Never activity.
    Tick {
        now_ms: u64,
    },

    /// A throttled, filtered activity signal from the watchdog.
    Activity {
        kind: SignalKind,
        now_ms: u64,
    },

    Start {
        now_ms: u64,
    },
    Stop {
        now_ms: u64,
    },
    Pause {
        now_ms: u64,
    },
    Resume {
        now_ms: u64,
    },
    Reset {
        now_ms: u64,
    },

    /// The session-extension collaborator confirmed the extension.
    Extended {
        now_ms: u64,
    },

    /// The session-extension collaborator refused.
    /// `session_dead` is the auth classifier's verdict.
    ExtensionRejected {
        session_dead: bool,
        now_ms: u64,
    },
}

impl Event {
    pub fn now_ms(&self) -> u64 {
        match self {
            Event::Tick { now_ms }
            | Event::Activity { now_ms, .. }
            | Event::Start { now_ms }
            | Event::Stop { now_ms }
            | Event::Pause { now_ms }
            | Event::Resume { now_ms }
            | Event::Reset { now_ms }
            | Event::Extended { now_ms }
            | Event::ExtensionRejected { now_ms, .. } => *now_ms,
        }
    }
}
