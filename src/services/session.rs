// Author: Dustin Pilgrim
// License: MIT

//! Collaborators the timer consumes but does not implement: extending the
//! session with the backend, ending it, and deciding whether an extension
//! failure means the session is dead.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::core::error::ExtendError;
use crate::services::processes::{run_command_detached, run_command_status};

/// Exit code an extend command uses to say "credentials refused".
pub const EXIT_UNAUTHORIZED: i32 = 77;

/// Exit code an extend command uses to say "session already expired".
pub const EXIT_EXPIRED: i32 = 78;

const EXTEND_COMMAND_LIMIT: Duration = Duration::from_secs(30);

/// Asks the backend to extend the session. Resolves once it has answered.
pub trait SessionExtender: Send + Sync + 'static {
    fn extend_session(&self) -> BoxFuture<'_, Result<(), ExtendError>>;
}

impl<F, Fut> SessionExtender for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ExtendError>> + Send + 'static,
{
    fn extend_session(&self) -> BoxFuture<'_, Result<(), ExtendError>> {
        Box::pin(self())
    }
}

/// Forced logout. Called from the timer loop, so it must not block.
pub trait SessionEnder: Send + Sync + 'static {
    fn end_session(&self);
}

impl<F> SessionEnder for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn end_session(&self) {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    /// The backend no longer honours this session.
    SessionDead,
    /// Worth telling the user, but the session may still be alive.
    Transient,
}

/// Classifies extension failures. Injected rather than global so every
/// timer instance can be tested on its own.
pub trait AuthClassifier: Send + Sync + 'static {
    fn classify(&self, err: &ExtendError) -> AuthVerdict;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl AuthClassifier for DefaultClassifier {
    fn classify(&self, err: &ExtendError) -> AuthVerdict {
        match err {
            ExtendError::Unauthorized | ExtendError::Expired => AuthVerdict::SessionDead,
            ExtendError::Transport(_) => AuthVerdict::Transient,
        }
    }
}

/// Used when nothing can extend the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtender;

impl SessionExtender for NoExtender {
    fn extend_session(&self) -> BoxFuture<'_, Result<(), ExtendError>> {
        Box::pin(async {
            Err(ExtendError::Transport("no session extender configured".to_string()))
        })
    }
}

/// Used when nobody acts on forced logout; only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyEnder;

impl SessionEnder for LogOnlyEnder {
    fn end_session(&self) {
        tracing::warn!("session ended (no end-session handler configured)");
    }
}

/// Extends the session by running a shell command.
///
/// Exit 0 is success, [`EXIT_UNAUTHORIZED`] and [`EXIT_EXPIRED`] map to the
/// matching errors, anything else is a transport failure.
#[derive(Debug, Clone)]
pub struct CommandExtender {
    command: String,
}

impl CommandExtender {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

impl SessionExtender for CommandExtender {
    fn extend_session(&self) -> BoxFuture<'_, Result<(), ExtendError>> {
        Box::pin(async move {
            tracing::info!("extend: {}", self.command);

            let status = run_command_status(&self.command, EXTEND_COMMAND_LIMIT)
                .await
                .map_err(|e| ExtendError::Transport(e.to_string()))?;

            match status.code() {
                Some(0) => Ok(()),
                Some(EXIT_UNAUTHORIZED) => Err(ExtendError::Unauthorized),
                Some(EXIT_EXPIRED) => Err(ExtendError::Expired),
                Some(code) => Err(ExtendError::Transport(format!("exit status {code}"))),
                None => Err(ExtendError::Transport("terminated by signal".to_string())),
            }
        })
    }
}

/// Ends the session by running a shell command detached.
#[derive(Debug, Clone)]
pub struct CommandEnder {
    command: String,
}

impl CommandEnder {
    pub fn new(command: impl Into<String>) -> Self {
        Self { command: command.into() }
    }
}

impl SessionEnder for CommandEnder {
    fn end_session(&self) {
        tracing::info!("end session: {}", self.command);
        if let Err(e) = run_command_detached(&self.command) {
            tracing::error!("failed to run end-session command: {}", e);
        }
    }
}
