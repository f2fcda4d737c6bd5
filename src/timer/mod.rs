// Author: Dustin Pilgrim
// License: MIT

mod actions;
pub mod clock;
pub mod observers;
mod run;

#[cfg(test)]
mod tests;

pub use clock::{Clock, MonotonicClock};
pub use observers::{ObserverKind, Observers, Subscription};

use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};

use crate::core::{
    config::{SignalKind, TimerConfig},
    error::Error,
    info::TimerSnapshot,
    manager::Manager,
    manager_msg::{Command, ManagerMsg},
};
use crate::services::session::{
    AuthClassifier, AuthVerdict, DefaultClassifier, LogOnlyEnder, NoExtender, SessionEnder,
    SessionExtender,
};

use self::run::TimerLoop;

const CHANNEL_CAPACITY: usize = 256;

/// Wires collaborators into a timer before it is spawned.
pub struct TimerBuilder {
    cfg: TimerConfig,
    clock: Arc<dyn Clock>,
    extender: Arc<dyn SessionExtender>,
    ender: Arc<dyn SessionEnder>,
    classifier: Arc<dyn AuthClassifier>,
}

impl TimerBuilder {
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn extender(mut self, extender: impl SessionExtender) -> Self {
        self.extender = Arc::new(extender);
        self
    }

    pub fn ender(mut self, ender: impl SessionEnder) -> Self {
        self.ender = Arc::new(ender);
        self
    }

    pub fn classifier(mut self, classifier: impl AuthClassifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Validate the config and start the timer loop on the current runtime.
    ///
    /// Fails with `InvalidConfig` for a bad config and `SchedulingUnavailable`
    /// outside a tokio runtime or when auto-start cannot arm its deadline.
    pub fn spawn(self) -> Result<SessionTimer, Error> {
        let manager = Manager::new(self.cfg)?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            tracing::error!("no tokio runtime available; cannot arm session timers");
            Error::SchedulingUnavailable
        })?;

        let auto_start = manager.config().auto_start;
        let observers = Arc::new(Observers::default());

        let mut timer_loop = TimerLoop::new(
            manager,
            Arc::clone(&self.clock),
            Arc::clone(&observers),
            self.ender,
        );

        if auto_start {
            timer_loop.apply_command(Command::Start)?;
        }

        let state_rx = timer_loop.subscribe_state();
        let (tx, rx) = mpsc::channel::<ManagerMsg>(CHANNEL_CAPACITY);
        let task = runtime.spawn(timer_loop.run(rx));

        Ok(SessionTimer {
            handle: TimerHandle {
                tx,
                state_rx,
                observers,
                clock: self.clock,
                extender: self.extender,
                classifier: self.classifier,
            },
            task: Some(task),
        })
    }
}

/// Owner of one timeout machine. Dropping it tears the machine down and
/// cancels every timer it armed.
pub struct SessionTimer {
    handle: TimerHandle,
    task: Option<JoinHandle<()>>,
}

impl SessionTimer {
    pub fn builder(cfg: TimerConfig) -> TimerBuilder {
        TimerBuilder {
            cfg,
            clock: Arc::new(MonotonicClock::new()),
            extender: Arc::new(NoExtender),
            ender: Arc::new(LogOnlyEnder),
            classifier: Arc::new(DefaultClassifier),
        }
    }

    /// Spawn with default collaborators.
    pub fn spawn(cfg: TimerConfig) -> Result<Self, Error> {
        Self::builder(cfg).spawn()
    }

    pub fn handle(&self) -> &TimerHandle {
        &self.handle
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(mut self) {
        let (reply, rx) = oneshot::channel();
        if self.handle.tx.send(ManagerMsg::Shutdown { reply }).await.is_ok() {
            let _ = rx.await;
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Cloneable access to a running timer, for watchdogs and presentation code.
#[derive(Clone)]
pub struct TimerHandle {
    tx: mpsc::Sender<ManagerMsg>,
    state_rx: watch::Receiver<TimerSnapshot>,
    observers: Arc<Observers>,
    clock: Arc<dyn Clock>,
    extender: Arc<dyn SessionExtender>,
    classifier: Arc<dyn AuthClassifier>,
}

impl TimerHandle {
    /// Latest published state.
    pub fn state(&self) -> TimerSnapshot {
        self.state_rx.borrow().clone()
    }

    /// Receiver that changes on every transition and refresh tick.
    pub fn watch(&self) -> watch::Receiver<TimerSnapshot> {
        self.state_rx.clone()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub async fn start(&self) -> Result<TimerSnapshot, Error> {
        self.command(Command::Start).await
    }

    pub async fn stop(&self) -> Result<TimerSnapshot, Error> {
        self.command(Command::Stop).await
    }

    pub async fn pause(&self) -> Result<TimerSnapshot, Error> {
        self.command(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<TimerSnapshot, Error> {
        self.command(Command::Resume).await
    }

    pub async fn reset(&self) -> Result<TimerSnapshot, Error> {
        self.command(Command::Reset).await
    }

    /// Ask the backend to extend the session, then reset locally.
    ///
    /// The local countdown only moves once the extender has confirmed. On
    /// rejection nothing local changes and the error is returned; if the
    /// classifier says the session is dead, the session is also ended.
    pub async fn extend(&self) -> Result<TimerSnapshot, Error> {
        match self.extender.extend_session().await {
            Ok(()) => {
                tracing::info!("session extension confirmed");
                self.command(Command::Extended).await
            }
            Err(e) => {
                let verdict = self.classifier.classify(&e);
                tracing::warn!("session extension rejected: {} ({:?})", e, verdict);

                let session_dead = verdict == AuthVerdict::SessionDead;
                if let Err(se) = self.command(Command::ExtensionRejected { session_dead }).await {
                    tracing::error!("failed to report rejected extension: {}", se);
                }

                Err(Error::ExtensionRejected(e))
            }
        }
    }

    /// Forward one accepted activity signal. Counts as a reset while the
    /// machine is active or idle; ignored while paused or stopped.
    pub async fn record_activity(&self, kind: SignalKind) -> Result<(), Error> {
        self.tx
            .send(ManagerMsg::Activity { kind })
            .await
            .map_err(|_| Error::SchedulingUnavailable)
    }

    pub fn on_idle(&self, callback: impl Fn(&TimerSnapshot) + Send + Sync + 'static) -> Subscription {
        self.observers.subscribe(ObserverKind::Idle, callback)
    }

    pub fn on_active(&self, callback: impl Fn(&TimerSnapshot) + Send + Sync + 'static) -> Subscription {
        self.observers.subscribe(ObserverKind::Active, callback)
    }

    async fn command(&self, cmd: Command) -> Result<TimerSnapshot, Error> {
        let (reply, rx) = oneshot::channel();

        self.tx
            .send(ManagerMsg::Command { cmd, reply })
            .await
            .map_err(|_| {
                tracing::error!("timer loop is gone; cannot apply {:?}", cmd);
                Error::SchedulingUnavailable
            })?;

        rx.await.map_err(|_| Error::SchedulingUnavailable)?
    }
}
