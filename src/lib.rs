// Author: Dustin Pilgrim
// License: MIT

//! Session idle-timeout engine: a pure timeout state machine, a tokio loop
//! that owns its timers, and an activity watchdog that feeds it throttled
//! resets.

pub mod config;
pub mod core;
pub mod logfile;
pub mod services;
pub mod timer;

pub use crate::core::{
    config::{IdlePolicy, PauseClock, Pattern, SignalKind, TimerConfig},
    display::{classify_urgency, format_remaining, percentage_elapsed, Urgency},
    error::{ConfigError, Error, ExtendError, StateError},
    info::TimerSnapshot,
    state::Phase,
};
pub use crate::services::activity::{ActivityWatchdog, InputFilter, TextEntryFilter};
pub use crate::services::signals::{ActivitySignal, SignalBus, SignalSink};
pub use crate::timer::{SessionTimer, TimerHandle};
