// Author: Dustin Pilgrim
// License: MIT

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;

use crate::core::error::ConfigError;

pub const DEFAULT_TIMEOUT_MS: u64 = 15 * 60 * 1000;
pub const DEFAULT_THROTTLE_MS: u64 = 1000;
pub const DEFAULT_REFRESH_MS: u64 = 1000;

/// A type of user-interaction signal that may count as activity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    PointerMove,
    KeyPress,
    Scroll,
    Touch,
    Click,
    Wheel,

    /// Anything a source wants to report that has no dedicated variant.
    Custom(String),
}

impl SignalKind {
    /// The default activity set: every built-in kind.
    pub fn standard() -> BTreeSet<SignalKind> {
        [
            SignalKind::PointerMove,
            SignalKind::KeyPress,
            SignalKind::Scroll,
            SignalKind::Touch,
            SignalKind::Click,
            SignalKind::Wheel,
        ]
        .into_iter()
        .collect()
    }

    pub fn as_str(&self) -> &str {
        match self {
            SignalKind::PointerMove => "pointer-move",
            SignalKind::KeyPress => "key-press",
            SignalKind::Scroll => "scroll",
            SignalKind::Touch => "touch",
            SignalKind::Click => "click",
            SignalKind::Wheel => "wheel",
            SignalKind::Custom(s) => s,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = String;

    /// Accepts both the canonical names and the usual DOM event names
    /// (`mousemove`, `keydown`, `touchstart`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        if raw.is_empty() {
            return Err("empty signal name".to_string());
        }

        let n: String = raw.chars().filter(|c| *c != '-' && *c != '_').collect();

        Ok(match n.as_str() {
            "pointermove" | "mousemove" => SignalKind::PointerMove,
            "keypress" | "keydown" | "keyup" | "key" => SignalKind::KeyPress,
            "scroll" => SignalKind::Scroll,
            "touch" | "touchstart" | "touchmove" => SignalKind::Touch,
            "click" | "mousedown" | "pointerdown" => SignalKind::Click,
            "wheel" | "mousewheel" => SignalKind::Wheel,
            _ => SignalKind::Custom(raw),
        })
    }
}

/// How a pause treats the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PauseClock {
    /// The deadline stays where it was; time spent paused still counts.
    #[default]
    Running,
    /// Remaining time is frozen at pause and carried over to resume.
    Frozen,
}

impl fmt::Display for PauseClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PauseClock::Running => write!(f, "running"),
            PauseClock::Frozen => write!(f, "frozen"),
        }
    }
}

impl FromStr for PauseClock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" | "wall" | "wall-clock" => Ok(PauseClock::Running),
            "frozen" | "freeze" => Ok(PauseClock::Frozen),
            other => Err(format!("unknown pause clock '{other}' (use running or frozen)")),
        }
    }
}

/// What the machine does when it decides the user is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdlePolicy {
    /// Flip to idle and notify observers; the presentation layer decides.
    #[default]
    Notify,
    /// Additionally ask the session-ending collaborator to log out.
    EndSession,
}

impl fmt::Display for IdlePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdlePolicy::Notify => write!(f, "notify"),
            IdlePolicy::EndSession => write!(f, "end-session"),
        }
    }
}

impl FromStr for IdlePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = s.trim().to_ascii_lowercase().replace('_', "-");
        match n.as_str() {
            "notify" | "idle" => Ok(IdlePolicy::Notify),
            "end-session" | "logout" => Ok(IdlePolicy::EndSession),
            other => Err(format!("unknown idle policy '{other}' (use notify or end-session)")),
        }
    }
}

/// Pattern used for text-entry target classification.
///
/// - Literals are expected to already be normalized lowercase by the config loader.
/// - Regexes are compiled case-insensitive by the config loader.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    Regex(Regex),
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(s) => write!(f, "{s}"),
            Pattern::Regex(r) => write!(f, "/{}/", r.as_str()),
        }
    }
}

impl Pattern {
    /// Match against a lowercase haystack string.
    pub fn matches_lc(&self, hay_lc: &str) -> bool {
        match self {
            Pattern::Literal(s) => !s.is_empty() && hay_lc.contains(s),
            Pattern::Regex(r) => r.is_match(hay_lc),
        }
    }
}

/// Immutable timer configuration, supplied at construction.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Allowed inactivity before the session counts as idle.
    pub timeout_ms: u64,

    /// Minimum spacing between two forwarded activity signals.
    pub throttle_ms: u64,

    /// Display refresh period while active.
    pub refresh_ms: u64,

    pub activity_kinds: BTreeSet<SignalKind>,
    pub auto_start: bool,

    pub pause_clock: PauseClock,

    /// Applied when the deadline elapses while active.
    pub on_idle: IdlePolicy,

    /// Applied when `resume()` lands past the deadline.
    pub on_expired_resume: IdlePolicy,

    /// Signal targets that count as text entry and are excluded from activity.
    pub text_entry_targets: Vec<Pattern>,
}

impl TimerConfig {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            throttle_ms: DEFAULT_THROTTLE_MS,
            refresh_ms: DEFAULT_REFRESH_MS,
            activity_kinds: SignalKind::standard(),
            auto_start: true,
            pause_clock: PauseClock::default(),
            on_idle: IdlePolicy::default(),
            on_expired_resume: IdlePolicy::default(),
            text_entry_targets: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::NonPositiveTimeout);
        }
        if self.refresh_ms == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        if self.auto_start && self.activity_kinds.is_empty() {
            return Err(ConfigError::NoActivityKinds);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig::new(DEFAULT_TIMEOUT_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_names_map_to_kinds() {
        assert_eq!("mousemove".parse::<SignalKind>(), Ok(SignalKind::PointerMove));
        assert_eq!("keydown".parse::<SignalKind>(), Ok(SignalKind::KeyPress));
        assert_eq!("Touch_Start".parse::<SignalKind>(), Ok(SignalKind::Touch));
        assert_eq!(
            "visibility".parse::<SignalKind>(),
            Ok(SignalKind::Custom("visibility".to_string()))
        );
        assert!("  ".parse::<SignalKind>().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = TimerConfig::new(0);
        assert_eq!(cfg.validate(), Err(ConfigError::NonPositiveTimeout));
    }

    #[test]
    fn auto_start_needs_activity_kinds() {
        let mut cfg = TimerConfig::new(1000);
        cfg.activity_kinds.clear();
        assert_eq!(cfg.validate(), Err(ConfigError::NoActivityKinds));

        cfg.auto_start = false;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn policies_parse() {
        assert_eq!("end_session".parse::<IdlePolicy>(), Ok(IdlePolicy::EndSession));
        assert_eq!("frozen".parse::<PauseClock>(), Ok(PauseClock::Frozen));
        assert!("later".parse::<IdlePolicy>().is_err());
    }

    #[test]
    fn literal_pattern_matches_substring() {
        let p = Pattern::Literal("input".to_string());
        assert!(p.matches_lc("input#email"));
        assert!(!Pattern::Literal(String::new()).matches_lc("anything"));
    }
}
