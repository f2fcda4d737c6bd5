// Author: Dustin Pilgrim
// License: MIT

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The timer configuration is unusable; construction is refused.
    InvalidConfig(ConfigError),

    /// An operation was rejected because it is invalid in the current state.
    ///
    /// Examples:
    /// - pause while already paused
    /// - resume while running
    InvalidState(StateError),

    /// The session-extension collaborator refused to extend.
    /// The local countdown is left exactly as it was.
    ExtensionRejected(ExtendError),

    /// A deferred callback could not be armed (no runtime, timer loop gone,
    /// deadline not representable). The machine keeps its prior state.
    SchedulingUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NonPositiveTimeout,
    NegativeThrottle,
    NoActivityKinds,
    ZeroRefreshInterval,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    AlreadyPaused,
    NotPaused,
    NotRunning,
}

/// Why the session-extension collaborator failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendError {
    /// Credentials were refused.
    Unauthorized,
    /// The backend already considers the session expired.
    Expired,
    /// The round-trip itself failed.
    Transport(String),
}

// ---------------- Display ----------------

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(e) => write!(f, "invalid config: {e}"),
            Error::InvalidState(e) => write!(f, "{e}"),
            Error::ExtensionRejected(e) => write!(f, "session extension rejected: {e}"),
            Error::SchedulingUnavailable => write!(f, "scheduling unavailable"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositiveTimeout =>
                write!(f, "timeout must be greater than 0"),
            ConfigError::NegativeThrottle =>
                write!(f, "throttle interval must not be negative"),
            ConfigError::NoActivityKinds =>
                write!(f, "auto start needs at least one activity event type"),
            ConfigError::ZeroRefreshInterval =>
                write!(f, "refresh interval must be greater than 0"),
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::AlreadyPaused =>
                write!(f, "already paused"),
            StateError::NotPaused =>
                write!(f, "not paused"),
            StateError::NotRunning =>
                write!(f, "not running"),
        }
    }
}

impl fmt::Display for ExtendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendError::Unauthorized => write!(f, "unauthorized"),
            ExtendError::Expired => write!(f, "session expired"),
            ExtendError::Transport(msg) => write!(f, "transport failure: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
impl std::error::Error for ConfigError {}
impl std::error::Error for StateError {}
impl std::error::Error for ExtendError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::InvalidConfig(e)
    }
}

impl From<StateError> for Error {
    fn from(e: StateError) -> Self {
        Error::InvalidState(e)
    }
}
