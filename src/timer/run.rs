// Author: Dustin Pilgrim
// License: MIT

use std::sync::Arc;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Duration, Instant},
};

use crate::core::{
    action::Action,
    error::Error,
    events::Event,
    info::TimerSnapshot,
    manager::Manager,
    manager_msg::{Command, ManagerMsg},
    state::{Phase, State},
};
use crate::services::session::SessionEnder;

use super::{clock::Clock, observers::Observers};

const TICK_CHANNEL_CAPACITY: usize = 8;

/// Smallest re-arm delay when the deadline sleep wakes a little early.
const REARM_FLOOR: Duration = Duration::from_millis(10);

/// The single task that owns a timer's state. Every event is applied to a
/// copy and only committed once its deadline could be scheduled.
pub(super) struct TimerLoop {
    manager: Manager,
    state: State,
    clock: Arc<dyn Clock>,
    pub(super) observers: Arc<Observers>,
    pub(super) ender: Arc<dyn SessionEnder>,
    state_tx: watch::Sender<TimerSnapshot>,
    deadline: Option<Instant>,
    pub(super) ticker: Option<JoinHandle<()>>,
    pub(super) tick_tx: mpsc::Sender<ManagerMsg>,
    tick_rx: Option<mpsc::Receiver<ManagerMsg>>,
}

impl TimerLoop {
    pub(super) fn new(
        manager: Manager,
        clock: Arc<dyn Clock>,
        observers: Arc<Observers>,
        ender: Arc<dyn SessionEnder>,
    ) -> Self {
        let now_ms = clock.now_ms();
        let state = manager.new_state(now_ms);
        let (state_tx, _) = watch::channel(manager.snapshot(&state, now_ms));
        let (tick_tx, tick_rx) = mpsc::channel(TICK_CHANNEL_CAPACITY);

        Self {
            manager,
            state,
            clock,
            observers,
            ender,
            state_tx,
            deadline: None,
            ticker: None,
            tick_tx,
            tick_rx: Some(tick_rx),
        }
    }

    pub(super) fn subscribe_state(&self) -> watch::Receiver<TimerSnapshot> {
        self.state_tx.subscribe()
    }

    pub(super) fn refresh_period(&self) -> Duration {
        self.manager.config().refresh()
    }

    pub(super) async fn run(mut self, mut rx: mpsc::Receiver<ManagerMsg>) {
        let Some(mut tick_rx) = self.tick_rx.take() else {
            tracing::error!("timer loop started twice");
            return;
        };

        tracing::info!(
            "session timer loop started (timeout {} ms)",
            self.manager.config().timeout_ms
        );

        loop {
            let deadline = self.deadline;

            tokio::select! {
                // Commands and activity queued before a deadline win the race.
                biased;

                maybe = rx.recv() => {
                    let Some(msg) = maybe else {
                        tracing::info!("timer loop stopping (all handles dropped)");
                        break;
                    };
                    if !self.handle_msg(msg) {
                        break;
                    }
                }

                Some(msg) = tick_rx.recv() => {
                    self.handle_msg(msg);
                }

                _ = wait_deadline(deadline) => {
                    self.on_deadline();
                }
            }
        }

        self.teardown();
    }

    /// Returns false when the loop should exit.
    fn handle_msg(&mut self, msg: ManagerMsg) -> bool {
        match msg {
            ManagerMsg::Command { cmd, reply } => {
                let res = self.apply_command(cmd);
                if let Err(e) = &res {
                    tracing::warn!("{:?} failed: {}", cmd, e);
                }
                let _ = reply.send(res);
            }

            ManagerMsg::Activity { kind } => {
                let now_ms = self.clock.now_ms();
                tracing::trace!("activity: {}", kind);
                if let Err(e) = self.apply(Event::Activity { kind, now_ms }) {
                    tracing::error!("activity reset failed: {}", e);
                }
            }

            ManagerMsg::Tick => self.tick(),

            ManagerMsg::Shutdown { reply } => {
                tracing::info!("timer loop stopping (shutdown requested)");
                self.teardown();
                let _ = reply.send(());
                return false;
            }
        }

        true
    }

    pub(super) fn apply_command(&mut self, cmd: Command) -> Result<TimerSnapshot, Error> {
        let now_ms = self.clock.now_ms();
        self.apply(cmd.into_event(now_ms))
    }

    fn tick(&mut self) {
        let now_ms = self.clock.now_ms();
        if let Err(e) = self.apply(Event::Tick { now_ms }) {
            tracing::error!("tick failed: {}", e);
        }
    }

    fn on_deadline(&mut self) {
        self.deadline = None;
        self.tick();

        // Woke before the clock reached the deadline: sleep the rest.
        if self.deadline.is_none() && self.state.phase() == Phase::Active {
            let now_ms = self.clock.now_ms();
            let left = self
                .state
                .deadline_ms()
                .map(|d| d.saturating_sub(now_ms))
                .unwrap_or_default();
            let delay = Duration::from_millis(left).max(REARM_FLOOR);
            tracing::debug!("deadline woke early; re-arming in {} ms", delay.as_millis());
            self.deadline = Instant::now().checked_add(delay);
        }
    }

    fn apply(&mut self, event: Event) -> Result<TimerSnapshot, Error> {
        let now_ms = event.now_ms();

        let mut next = self.state.clone();
        let actions = self.manager.handle_event(&mut next, event)?;

        let mut deadline = self.deadline;
        for action in &actions {
            match action {
                Action::ArmDeadline { at_ms } => {
                    deadline = Some(plan_deadline(*at_ms, now_ms)?);
                }
                Action::CancelDeadline => deadline = None,
                _ => {}
            }
        }

        self.state = next;
        self.deadline = deadline;

        let snapshot = self.manager.snapshot(&self.state, now_ms);
        self.state_tx.send_replace(snapshot.clone());

        for action in actions {
            self.exec_action(action, &snapshot);
        }

        Ok(snapshot)
    }

    fn teardown(&mut self) {
        self.deadline = None;
        self.stop_refresh();
    }
}

impl Drop for TimerLoop {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

fn plan_deadline(at_ms: u64, now_ms: u64) -> Result<Instant, Error> {
    let delay = Duration::from_millis(at_ms.saturating_sub(now_ms));
    Instant::now().checked_add(delay).ok_or_else(|| {
        tracing::error!("deadline {} ms out of range", at_ms);
        Error::SchedulingUnavailable
    })
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
