// Author: Dustin Pilgrim
// License: MIT

use crate::core::{
    action::Action,
    config::{IdlePolicy, PauseClock},
    error::{Error, StateError},
    events::Event,
    state::{Phase, State},
};

use super::Manager;

impl Manager {
    /// Apply one event. On `Err` the state is left exactly as it was.
    pub fn handle_event(&self, state: &mut State, event: Event) -> Result<Vec<Action>, Error> {
        let now_ms = event.now_ms();
        let mut out = Vec::new();

        match event {
            Event::Tick { .. } => {
                if state.phase() == Phase::Active {
                    self.check_deadline(state, now_ms, &mut out);
                } else {
                    state.refresh(now_ms);
                }
            }

            Event::Activity { .. } => {
                let revivable = matches!(state.phase(), Phase::Active | Phase::Idle);
                if revivable && !state.session_ended() {
                    self.restart_cycle(state, now_ms, &mut out)?;
                }
            }

            Event::Start { .. } | Event::Reset { .. } | Event::Extended { .. } => {
                self.restart_cycle(state, now_ms, &mut out)?;
                state.set_session_ended(false);
            }

            Event::Stop { .. } => {
                if state.phase() != Phase::Stopped {
                    state.enter_stopped();
                    out.push(Action::CancelDeadline);
                    out.push(Action::StopRefresh);
                }
            }

            Event::Pause { .. } => match state.phase() {
                Phase::Active => {
                    state.enter_paused(now_ms);
                    out.push(Action::CancelDeadline);
                    out.push(Action::StopRefresh);
                }
                Phase::Paused => return Err(Error::InvalidState(StateError::AlreadyPaused)),
                Phase::Idle | Phase::Stopped => {
                    return Err(Error::InvalidState(StateError::NotRunning));
                }
            },

            Event::Resume { .. } => match state.phase() {
                Phase::Paused => self.resume_from_pause(state, now_ms, &mut out)?,
                Phase::Idle => {}
                Phase::Active | Phase::Stopped => {
                    return Err(Error::InvalidState(StateError::NotPaused));
                }
            },

            Event::ExtensionRejected { session_dead, .. } => {
                if session_dead && !state.session_ended() {
                    state.set_session_ended(true);
                    out.push(Action::EndSession);
                }
            }
        }

        Ok(out)
    }

    fn restart_cycle(&self, state: &mut State, now_ms: u64, out: &mut Vec<Action>) -> Result<(), Error> {
        let deadline = now_ms
            .checked_add(self.cfg.timeout_ms)
            .ok_or(Error::SchedulingUnavailable)?;

        let prev = state.phase();
        state.begin_cycle(now_ms, deadline);

        out.push(Action::ArmDeadline { at_ms: deadline });
        if prev != Phase::Active {
            out.push(Action::StartRefresh);
        }
        if prev == Phase::Idle {
            out.push(Action::NotifyActive);
        }

        Ok(())
    }

    fn resume_from_pause(&self, state: &mut State, now_ms: u64, out: &mut Vec<Action>) -> Result<(), Error> {
        let deadline = match self.cfg.pause_clock {
            PauseClock::Running => match state.deadline_ms() {
                Some(d) => d,
                None => state
                    .last_active_ms()
                    .checked_add(self.cfg.timeout_ms)
                    .ok_or(Error::SchedulingUnavailable)?,
            },
            PauseClock::Frozen => now_ms
                .checked_add(state.remaining_ms())
                .ok_or(Error::SchedulingUnavailable)?,
        };

        if now_ms >= deadline {
            self.go_idle(state, self.cfg.on_expired_resume, out);
            return Ok(());
        }

        state.continue_cycle(now_ms, deadline);
        out.push(Action::ArmDeadline { at_ms: deadline });
        out.push(Action::StartRefresh);
        Ok(())
    }

    fn check_deadline(&self, state: &mut State, now_ms: u64, out: &mut Vec<Action>) {
        match state.deadline_ms() {
            Some(deadline) if now_ms >= deadline => self.go_idle(state, self.cfg.on_idle, out),
            _ => state.refresh(now_ms),
        }
    }

    fn go_idle(&self, state: &mut State, policy: IdlePolicy, out: &mut Vec<Action>) {
        let fresh_episode = state.enter_idle();

        out.push(Action::CancelDeadline);
        out.push(Action::StopRefresh);

        if !fresh_episode {
            return;
        }

        out.push(Action::NotifyIdle);

        if policy == IdlePolicy::EndSession && !state.session_ended() {
            state.set_session_ended(true);
            out.push(Action::EndSession);
        }
    }
}
