// Author: Dustin Pilgrim
// License: MIT

//! In-process signal plumbing: raw interaction signals are dispatched on a
//! bus to whichever listeners are installed for their kind.

use std::str::FromStr;
use std::sync::Mutex;

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::core::config::SignalKind;

/// One raw interaction signal, with the element it came from if known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySignal {
    pub kind: SignalKind,
    pub target: Option<String>,
}

impl ActivitySignal {
    pub fn new(kind: SignalKind) -> Self {
        Self { kind, target: None }
    }

    pub fn with_target(kind: SignalKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: Some(target.into()),
        }
    }
}

impl FromStr for ActivitySignal {
    type Err = String;

    /// `"<kind> [target...]"`, e.g. `mousemove input#email`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let kind: SignalKind = parts.next().unwrap_or_default().parse()?;

        let target = parts.collect::<Vec<_>>().join(" ");
        if target.is_empty() {
            Ok(Self::new(kind))
        } else {
            Ok(Self::with_target(kind, target))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Anything listeners can be installed on.
pub trait SignalTarget: Send + Sync + 'static {
    fn add_listener(&self, kind: SignalKind, tx: mpsc::Sender<ActivitySignal>) -> ListenerId;

    /// Returns false if `id` was not installed.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

struct Listener {
    id: ListenerId,
    kind: SignalKind,
    tx: mpsc::Sender<ActivitySignal>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// Fan-out of raw signals to per-kind listeners.
///
/// Delivery never blocks: a listener whose queue is full misses the signal,
/// which is harmless for activity detection.
#[derive(Default)]
pub struct SignalBus {
    inner: Mutex<BusInner>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver to every listener of the signal's kind. Returns how many
    /// listeners accepted it.
    pub fn dispatch(&self, signal: ActivitySignal) -> usize {
        let targets: Vec<mpsc::Sender<ActivitySignal>> = {
            let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner
                .listeners
                .iter()
                .filter(|l| l.kind == signal.kind)
                .map(|l| l.tx.clone())
                .collect()
        };

        let mut delivered = 0;
        for tx in targets {
            match tx.try_send(signal.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::trace!("listener queue full; dropped {}", signal.kind);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::trace!("listener gone; dropped {}", signal.kind);
                }
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .listeners
            .len()
    }

    pub fn listener_count_for(&self, kind: &SignalKind) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .listeners
            .iter()
            .filter(|l| &l.kind == kind)
            .count()
    }
}

impl SignalTarget for SignalBus {
    fn add_listener(&self, kind: SignalKind, tx: mpsc::Sender<ActivitySignal>) -> ListenerId {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = ListenerId(inner.next_id);
        inner.next_id = inner.next_id.wrapping_add(1);
        inner.listeners.push(Listener { id, kind, tx });
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let before = inner.listeners.len();
        inner.listeners.retain(|l| l.id != id);
        inner.listeners.len() != before
    }
}

/// Direct entry point into a watchdog for sources that do not go through
/// a bus.
#[derive(Debug, Clone)]
pub struct SignalSink {
    tx: mpsc::Sender<ActivitySignal>,
}

impl SignalSink {
    pub(crate) fn new(tx: mpsc::Sender<ActivitySignal>) -> Self {
        Self { tx }
    }

    /// Returns false if the signal was dropped.
    pub fn push(&self, signal: ActivitySignal) -> bool {
        self.tx.try_send(signal).is_ok()
    }
}
