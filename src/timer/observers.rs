// Author: Dustin Pilgrim
// License: MIT

use std::sync::{Arc, Mutex, Weak};

use crate::core::info::TimerSnapshot;

type Callback = Arc<dyn Fn(&TimerSnapshot) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverKind {
    Idle,
    Active,
}

struct Entry {
    id: u64,
    kind: ObserverKind,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Registered "became idle" / "became active" callbacks.
#[derive(Default)]
pub struct Observers {
    inner: Mutex<Registry>,
}

impl Observers {
    pub fn subscribe(
        self: &Arc<Self>,
        kind: ObserverKind,
        callback: impl Fn(&TimerSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        let mut reg = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = reg.next_id;
        reg.next_id = reg.next_id.wrapping_add(1);
        reg.entries.push(Entry {
            id,
            kind,
            callback: Arc::new(callback),
        });

        Subscription {
            id,
            observers: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) {
        let mut reg = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        reg.entries.retain(|e| e.id != id);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every callback of `kind`. Callbacks run outside the lock, so
    /// they may subscribe or unsubscribe.
    pub fn notify(&self, kind: ObserverKind, snapshot: &TimerSnapshot) {
        let callbacks: Vec<Callback> = {
            let reg = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            reg.entries
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| Arc::clone(&e.callback))
                .collect()
        };

        for cb in callbacks {
            cb(snapshot);
        }
    }
}

/// Unsubscribe handle. Dropping it also unsubscribes.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: u64,
    observers: Weak<Observers>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
