// Author: Dustin Pilgrim
// License: MIT

use tokio::sync::oneshot;

use crate::core::{
    config::SignalKind,
    error::Error,
    events::Event,
    info::TimerSnapshot,
};

/// Caller-initiated operations. The timer loop stamps them with its clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Pause,
    Resume,
    Reset,
    Extended,
    ExtensionRejected { session_dead: bool },
}

impl Command {
    pub fn into_event(self, now_ms: u64) -> Event {
        match self {
            Command::Start => Event::Start { now_ms },
            Command::Stop => Event::Stop { now_ms },
            Command::Pause => Event::Pause { now_ms },
            Command::Resume => Event::Resume { now_ms },
            Command::Reset => Event::Reset { now_ms },
            Command::Extended => Event::Extended { now_ms },
            Command::ExtensionRejected { session_dead } => {
                Event::ExtensionRejected { session_dead, now_ms }
            }
        }
    }
}

#[derive(Debug)]
pub enum ManagerMsg {
    Command {
        cmd: Command,
        reply: oneshot::Sender<Result<TimerSnapshot, Error>>,
    },

    /// Forwarded by the watchdog; no reply.
    Activity { kind: SignalKind },

    /// Display refresh from the ticker.
    Tick,

    Shutdown { reply: oneshot::Sender<()> },
}
