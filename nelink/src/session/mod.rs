//! Session engine: drives the send/expect steps of one interactive shell.
//!
//! A [`Session`] owns the shell channel of an endpoint between login and
//! disconnect. Every step alternates a send and an expect, strictly in
//! order; the dialect decides which steps run.

mod command;
mod login;

pub use command::{Command, INTERRUPT_COOLDOWN, STALE_OUTPUT_QUIET};

use std::fmt;
use std::time::Duration;

use log::debug;

use crate::channel::{Expectation, ScanMatch, ShellChannel};
use crate::error::{Error, ExpectError, Result, SessionError, Step};
use crate::platform::{Dialect, StepTimeouts};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Shell allocated, nothing exchanged yet.
    Opened,
    AwaitingIdentity,
    AwaitingSecret,
    /// Waiting for the agreement banner or the prompt.
    AwaitingConfirmation,
    /// Command prompt recognized.
    Ready,
    /// One command in flight.
    Executing,
    /// Shell closed; terminal.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Opened => "opened",
            SessionState::AwaitingIdentity => "awaiting identity",
            SessionState::AwaitingSecret => "awaiting secret",
            SessionState::AwaitingConfirmation => "awaiting confirmation",
            SessionState::Ready => "ready",
            SessionState::Executing => "executing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// An interactive shell being driven through a dialect.
pub struct Session {
    dialect: &'static Dialect,
    shell: ShellChannel,
    state: SessionState,
    timeouts: StepTimeouts,
    host: String,
    port: u16,
    discovered_name: Option<String>,
    /// A command timed out; its late output has not been read yet.
    stale_output: bool,
}

impl Session {
    /// Wrap a freshly opened shell. Nothing is exchanged until [`login`](Self::login).
    pub fn new(
        dialect: &'static Dialect,
        shell: ShellChannel,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            dialect,
            shell,
            state: SessionState::Opened,
            timeouts: dialect.timeouts.clone(),
            host: host.into(),
            port,
            discovered_name: None,
            stale_output: false,
        }
    }

    /// Replace the dialect's step deadlines.
    pub fn with_timeouts(mut self, timeouts: StepTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a command can be issued.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Device name read from the first prompt, for dialects that advertise it.
    pub fn discovered_name(&self) -> Option<&str> {
        self.discovered_name.as_deref()
    }

    /// Close the shell. Closing twice is a no-op.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.shell.close().await;
        self.state = SessionState::Closed;
        debug!("{}:{} session closed", self.host, self.port);
    }

    fn step_error(&self, step: Step, context: Option<&str>, source: impl Into<Error>) -> Error {
        SessionError::StepFailed {
            host: self.host.clone(),
            port: self.port,
            step,
            context: context.map(str::to_string),
            source: Box::new(source.into()),
        }
        .into()
    }

    fn not_ready(&self) -> Error {
        SessionError::NotConnected {
            host: self.host.clone(),
            port: self.port,
        }
        .into()
    }

    /// Send one line; `what` names it in logs and errors.
    async fn send(&mut self, step: Step, what: &str, line: &str) -> Result<()> {
        debug!("{}:{} send {}", self.host, self.port, what);
        self.shell
            .send_line(line)
            .await
            .map_err(|e| self.step_error(step, Some(what), e))
    }

    async fn send_secret(&mut self, step: Step, what: &str, secret: &str) -> Result<()> {
        debug!("{}:{} send {} <hidden>", self.host, self.port, what);
        self.shell
            .send_secret(secret)
            .await
            .map_err(|e| self.step_error(step, Some(what), e))
    }

    /// Run one expect step.
    ///
    /// A match of the dialect's authentication failure recognizer becomes
    /// [`SessionError::AuthenticationFailed`]; anything else is wrapped with
    /// the step.
    async fn expect(
        &mut self,
        step: Step,
        context: Option<&str>,
        expectation: &Expectation,
        timeout: Duration,
    ) -> Result<ScanMatch> {
        debug!("{}:{} expect {} ({})", self.host, self.port, step, timeout.as_secs_f32());
        match self.shell.expect(expectation, timeout).await {
            Ok(found) => Ok(found),
            Err(ExpectError::FailurePattern {
                pattern,
                matched,
                observed,
            }) if self.is_auth_failure(&pattern) => Err(SessionError::AuthenticationFailed {
                host: self.host.clone(),
                port: self.port,
                matched,
                observed,
            }
            .into()),
            Err(e) => Err(self.step_error(step, context, e)),
        }
    }

    fn is_auth_failure(&self, pattern: &str) -> bool {
        self.dialect
            .patterns
            .auth_failure
            .as_ref()
            .is_some_and(|re| re.as_str() == pattern)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("kind", &self.dialect.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state)
            .finish()
    }
}
