// Author: Dustin Pilgrim
// License: MIT

use crate::core::{action::Action, info::TimerSnapshot};
use crate::services::ticker::run_ticker;

use super::{observers::ObserverKind, run::TimerLoop};

impl TimerLoop {
    /// Carry out the side effects of one committed transition.
    pub(super) fn exec_action(&mut self, action: Action, snapshot: &TimerSnapshot) {
        match action {
            Action::ArmDeadline { at_ms } => {
                tracing::debug!("deadline armed at {} ms", at_ms);
            }

            Action::CancelDeadline => {
                tracing::debug!("deadline cancelled");
            }

            Action::StartRefresh => self.start_refresh(),

            Action::StopRefresh => self.stop_refresh(),

            Action::NotifyIdle => {
                tracing::info!("session idle");
                self.observers.notify(ObserverKind::Idle, snapshot);
            }

            Action::NotifyActive => {
                tracing::info!("session active again");
                self.observers.notify(ObserverKind::Active, snapshot);
            }

            Action::EndSession => {
                tracing::warn!("ending session");
                self.ender.end_session();
            }
        }
    }

    fn start_refresh(&mut self) {
        if self.ticker.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let period = self.refresh_period();
        self.ticker = Some(tokio::spawn(run_ticker(self.tick_tx.clone(), period)));
    }

    pub(super) fn stop_refresh(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            tracing::debug!("refresh ticker stopped");
        }
    }
}
