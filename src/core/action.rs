// Author: Dustin Pilgrim
// License: MIT

/// Side effects the state machine asks its runtime to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Arm the single deadline callback, replacing any pending one.
    ArmDeadline {
        at_ms: u64,
    },

    /// Drop the pending deadline callback, if any.
    CancelDeadline,

    /// Start the periodic display refresh (only while active).
    StartRefresh,

    StopRefresh,

    /// Tell observers the user just went idle.
    NotifyIdle,

    /// Tell observers the user is back.
    NotifyActive,

    /// Ask the session-ending collaborator to log out.
    EndSession,
}
