// Author: Dustin Pilgrim
// License: MIT

//! Activity watchdog: turns a bursty stream of raw signals into throttled
//! activity resets for one timer.

use std::collections::{BTreeSet, HashMap};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use tokio::{sync::mpsc, task::JoinHandle};

use crate::core::{
    config::{Pattern, SignalKind, TimerConfig},
    error::Error,
    throttle::ThrottleGate,
};
use crate::services::signals::{ActivitySignal, ListenerId, SignalSink, SignalTarget};
use crate::timer::TimerHandle;

const SIGNAL_QUEUE_CAPACITY: usize = 256;

/// Decides whether a signal may count as activity.
pub trait InputFilter: Send + Sync + 'static {
    fn accept(&self, signal: &ActivitySignal) -> bool;
}

impl<F> InputFilter for F
where
    F: Fn(&ActivitySignal) -> bool + Send + Sync + 'static,
{
    fn accept(&self, signal: &ActivitySignal) -> bool {
        self(signal)
    }
}

/// Rejects signals whose target looks like a text-entry element.
#[derive(Debug, Clone, Default)]
pub struct TextEntryFilter {
    patterns: Vec<Pattern>,
}

impl TextEntryFilter {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }
}

impl InputFilter for TextEntryFilter {
    fn accept(&self, signal: &ActivitySignal) -> bool {
        let Some(target) = signal.target.as_deref() else {
            return true;
        };

        let target_lc = target.to_lowercase();
        !self.patterns.iter().any(|p| p.matches_lc(&target_lc))
    }
}

/// Counters kept by the pump.
#[derive(Debug, Default)]
pub struct WatchdogStats {
    received: AtomicU64,
    ignored: AtomicU64,
    filtered: AtomicU64,
    throttled: AtomicU64,
    forwarded: AtomicU64,
}

impl WatchdogStats {
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Signals of a kind that is not configured as activity.
    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }

    pub fn filtered(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    pub fn throttled(&self) -> u64 {
        self.throttled.load(Ordering::Relaxed)
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }
}

/// Watches one signal target on behalf of one timer.
pub struct ActivityWatchdog {
    kinds: BTreeSet<SignalKind>,
    tx: mpsc::Sender<ActivitySignal>,
    target: Option<Arc<dyn SignalTarget>>,
    installed: HashMap<SignalKind, ListenerId>,
    gate: Arc<Mutex<ThrottleGate>>,
    stats: Arc<WatchdogStats>,
    pump: JoinHandle<()>,
}

impl ActivityWatchdog {
    /// Watchdog with a text-entry filter built from the config.
    pub fn new(timer: TimerHandle, cfg: &TimerConfig) -> Result<Self, Error> {
        let filter = TextEntryFilter::new(cfg.text_entry_targets.clone());
        Self::with_filter(timer, cfg, filter)
    }

    pub fn with_filter(
        timer: TimerHandle,
        cfg: &TimerConfig,
        filter: impl InputFilter,
    ) -> Result<Self, Error> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            tracing::error!("no tokio runtime available; cannot start activity watchdog");
            Error::SchedulingUnavailable
        })?;

        let (tx, rx) = mpsc::channel(SIGNAL_QUEUE_CAPACITY);
        let gate = Arc::new(Mutex::new(ThrottleGate::new(cfg.throttle_ms)));
        let stats = Arc::new(WatchdogStats::default());

        let pump = runtime.spawn(pump(
            rx,
            timer,
            cfg.activity_kinds.clone(),
            Arc::new(filter),
            Arc::clone(&gate),
            Arc::clone(&stats),
        ));

        Ok(Self {
            kinds: cfg.activity_kinds.clone(),
            tx,
            target: None,
            installed: HashMap::new(),
            gate,
            stats,
            pump,
        })
    }

    /// Install one listener per configured kind that is not yet installed.
    /// Attaching to a different target detaches from the current one first.
    pub fn attach(&mut self, target: Arc<dyn SignalTarget>) {
        if let Some(current) = &self.target
            && !Arc::ptr_eq(current, &target)
        {
            self.detach();
        }

        let mut added = 0;
        for kind in &self.kinds {
            if self.installed.contains_key(kind) {
                continue;
            }
            let id = target.add_listener(kind.clone(), self.tx.clone());
            self.installed.insert(kind.clone(), id);
            added += 1;
        }

        if added > 0 {
            tracing::debug!("watchdog attached ({} listeners)", added);
        }
        self.target = Some(target);
    }

    /// Remove exactly the listeners this watchdog installed and reopen the
    /// throttle gate.
    pub fn detach(&mut self) {
        let Some(target) = self.target.take() else {
            return;
        };

        for (kind, id) in self.installed.drain() {
            if !target.remove_listener(id) {
                tracing::warn!("listener for {} was already gone", kind);
            }
        }

        self.gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();

        tracing::debug!("watchdog detached");
    }

    pub fn is_attached(&self) -> bool {
        self.target.is_some()
    }

    pub fn installed_count(&self) -> usize {
        self.installed.len()
    }

    /// Push entry for sources that do not dispatch through a target.
    pub fn sink(&self) -> SignalSink {
        SignalSink::new(self.tx.clone())
    }

    pub fn stats(&self) -> Arc<WatchdogStats> {
        Arc::clone(&self.stats)
    }
}

impl Drop for ActivityWatchdog {
    fn drop(&mut self) {
        self.detach();
        self.pump.abort();
    }
}

async fn pump(
    mut rx: mpsc::Receiver<ActivitySignal>,
    timer: TimerHandle,
    kinds: BTreeSet<SignalKind>,
    filter: Arc<dyn InputFilter>,
    gate: Arc<Mutex<ThrottleGate>>,
    stats: Arc<WatchdogStats>,
) {
    let clock = timer.clock();

    while let Some(signal) = rx.recv().await {
        stats.received.fetch_add(1, Ordering::Relaxed);

        if !kinds.contains(&signal.kind) {
            stats.ignored.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        if !filter.accept(&signal) {
            stats.filtered.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                "filtered {} on {}",
                signal.kind,
                signal.target.as_deref().unwrap_or("-")
            );
            continue;
        }

        let admitted = gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .admit(clock.now_ms());
        if !admitted {
            stats.throttled.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        stats.forwarded.fetch_add(1, Ordering::Relaxed);
        if timer.record_activity(signal.kind).await.is_err() {
            tracing::debug!("watchdog pump stopping (timer gone)");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use regex::Regex;
    use tokio::time::{sleep, Duration};

    use crate::services::signals::SignalBus;
    use crate::timer::SessionTimer;

    fn cfg() -> TimerConfig {
        let mut cfg = TimerConfig::new(60_000);
        cfg.throttle_ms = 1_000;
        cfg
    }

    #[test]
    fn text_entry_filter_matches_case_insensitively() {
        let f = TextEntryFilter::new(vec![
            Pattern::Literal("input".to_string()),
            Pattern::Regex(Regex::new(r"^textarea").unwrap()),
        ]);

        assert!(!f.accept(&ActivitySignal::with_target(SignalKind::KeyPress, "INPUT#email")));
        assert!(!f.accept(&ActivitySignal::with_target(SignalKind::KeyPress, "textarea.note")));
        assert!(f.accept(&ActivitySignal::with_target(SignalKind::KeyPress, "div.canvas")));
        assert!(f.accept(&ActivitySignal::new(SignalKind::KeyPress)));
    }

    #[tokio::test(start_paused = true)]
    async fn attach_and_detach_are_idempotent() {
        let cfg = cfg();
        let timer = SessionTimer::spawn(cfg.clone()).unwrap();
        let bus = Arc::new(SignalBus::new());
        let mut dog = ActivityWatchdog::new(timer.handle().clone(), &cfg).unwrap();

        assert!(!dog.is_attached());

        dog.attach(bus.clone());
        dog.attach(bus.clone());
        assert!(dog.is_attached());
        assert_eq!(dog.installed_count(), cfg.activity_kinds.len());
        assert_eq!(bus.listener_count(), cfg.activity_kinds.len());

        dog.detach();
        dog.detach();
        assert!(!dog.is_attached());
        assert_eq!(dog.installed_count(), 0);
        assert_eq!(bus.listener_count(), 0);

        dog.attach(bus.clone());
        assert_eq!(bus.listener_count(), cfg.activity_kinds.len());

        drop(dog);
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_forwards_once_per_interval() {
        let cfg = cfg();
        let timer = SessionTimer::spawn(cfg.clone()).unwrap();
        let bus = Arc::new(SignalBus::new());
        let mut dog = ActivityWatchdog::new(timer.handle().clone(), &cfg).unwrap();
        dog.attach(bus.clone());

        sleep(Duration::from_millis(5_000)).await;
        for _ in 0..200 {
            bus.dispatch(ActivitySignal::new(SignalKind::PointerMove));
        }
        sleep(Duration::from_millis(10)).await;

        let stats = dog.stats();
        assert_eq!(stats.received(), 200);
        assert_eq!(stats.forwarded(), 1);
        assert_eq!(stats.throttled(), 199);
        assert_eq!(timer.handle().state().last_active_ms, 5_000);

        // Gate reopens after the interval.
        sleep(Duration::from_millis(1_000)).await;
        bus.dispatch(ActivitySignal::new(SignalKind::Scroll));
        sleep(Duration::from_millis(10)).await;

        assert_eq!(stats.forwarded(), 2);
        assert_eq!(timer.handle().state().last_active_ms, 6_010);
    }

    #[tokio::test(start_paused = true)]
    async fn filtered_and_unconfigured_signals_do_not_reset() {
        let mut cfg = cfg();
        cfg.activity_kinds = [SignalKind::KeyPress].into_iter().collect();
        cfg.text_entry_targets = vec![Pattern::Literal("password".to_string())];

        let timer = SessionTimer::spawn(cfg.clone()).unwrap();
        let dog = ActivityWatchdog::new(timer.handle().clone(), &cfg).unwrap();
        let sink = dog.sink();

        sleep(Duration::from_millis(2_000)).await;
        assert!(sink.push(ActivitySignal::with_target(SignalKind::KeyPress, "input#Password")));
        assert!(sink.push(ActivitySignal::new(SignalKind::PointerMove)));
        sleep(Duration::from_millis(10)).await;

        let stats = dog.stats();
        assert_eq!(stats.filtered(), 1);
        assert_eq!(stats.ignored(), 1);
        assert_eq!(stats.forwarded(), 0);
        assert_eq!(timer.handle().state().last_active_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_reopens_the_gate() {
        let cfg = cfg();
        let timer = SessionTimer::spawn(cfg.clone()).unwrap();
        let bus = Arc::new(SignalBus::new());
        let mut dog = ActivityWatchdog::new(timer.handle().clone(), &cfg).unwrap();

        dog.attach(bus.clone());
        bus.dispatch(ActivitySignal::new(SignalKind::Click));
        sleep(Duration::from_millis(10)).await;

        dog.detach();
        dog.attach(bus.clone());
        bus.dispatch(ActivitySignal::new(SignalKind::Click));
        sleep(Duration::from_millis(10)).await;

        assert_eq!(dog.stats().forwarded(), 2);
    }
}
