//! Command execution on a ready session.

use std::time::Duration;

use log::{debug, trace};
use regex::bytes::Regex;

use super::{Session, SessionState};
use crate::channel::{Expectation, Signal};
use crate::error::{ChannelError, Result, Step};

/// Pause after interrupting the OSE foreground process before the shell is
/// used again.
pub const INTERRUPT_COOLDOWN: Duration = Duration::from_secs(3);

/// Quiet period that ends the discard of output left over after an
/// interrupt or a timed out command.
pub const STALE_OUTPUT_QUIET: Duration = Duration::from_millis(200);

/// A command line plus an optional extra completion recognizer.
#[derive(Debug, Clone)]
pub struct Command {
    /// The line as the caller wrote it; also the key of its output.
    pub line: String,

    /// Matched in addition to the prompt, for commands that stop at their
    /// own confirmation question.
    pub extra_prompt: Option<Regex>,
}

impl Command {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            extra_prompt: None,
        }
    }

    /// Also complete when `pattern` matches.
    pub fn with_prompt(mut self, pattern: &str) -> Result<Self> {
        self.extra_prompt = Some(Regex::new(pattern).map_err(ChannelError::InvalidPattern)?);
        Ok(self)
    }
}

impl From<&str> for Command {
    fn from(line: &str) -> Self {
        Command::new(line)
    }
}

impl From<String> for Command {
    fn from(line: String) -> Self {
        Command::new(line)
    }
}

impl Session {
    /// Run one command and return the text printed before the prompt.
    ///
    /// A timeout waiting for the plain prompt leaves the session usable; the
    /// late output is discarded before the next command is sent. Any other
    /// failure closes the session, as does a timeout on a dialect that wraps
    /// commands (sub-shell, exit command, interrupt), since the shell may be
    /// left outside the outer prompt.
    pub async fn execute(&mut self, command: &Command) -> Result<String> {
        if !self.is_ready() {
            return Err(self.not_ready());
        }

        self.state = SessionState::Executing;
        if self.stale_output {
            let stale = self.shell.drain(STALE_OUTPUT_QUIET).await;
            debug!("{}:{} discarded {} bytes left by a timed out command", self.host, self.port, stale);
            self.stale_output = false;
        }

        let result = self.execute_steps(command).await;
        match &result {
            Ok(_) => self.state = SessionState::Ready,
            Err(e) if e.is_timeout() && !self.dialect.wraps_commands() => {
                self.stale_output = true;
                self.state = SessionState::Ready;
            }
            Err(_) => self.close().await,
        }
        result
    }

    async fn execute_steps(&mut self, command: &Command) -> Result<String> {
        let dialect = self.dialect;
        let patterns = &dialect.patterns;
        let prompt = Expectation::new(&patterns.prompt);
        let context = Some(command.line.as_str());

        if let Some(nested) = &dialect.nested {
            self.send(Step::EnterMode, nested.enter_command, nested.enter_command)
                .await?;
            if let Some(username) = &patterns.username {
                self.expect(
                    Step::NestedIdentityExpect,
                    context,
                    &Expectation::new(username),
                    self.timeouts.nested,
                )
                .await?;
            }
            self.send(Step::Send, "nested username", nested.username)
                .await?;
            if let Some(password) = &patterns.password {
                self.expect(
                    Step::NestedSecretExpect,
                    context,
                    &Expectation::new(password),
                    self.timeouts.nested,
                )
                .await?;
            }
            self.send_secret(Step::Send, "nested password", nested.password)
                .await?;
            self.expect(Step::NestedPromptExpect, context, &prompt, self.timeouts.nested)
                .await?;
        }

        let line = format!("{}{}", command.line, dialect.command_suffix);
        self.send(Step::Send, &command.line, &line).await?;

        let completion = prompt.clone().or_maybe(command.extra_prompt.as_ref());
        let found = self
            .expect(Step::CommandExpect, context, &completion, self.timeouts.command)
            .await?;
        trace!("{}:{} {:?} completed at {:?}", self.host, self.port, command.line, found.prompt_line);
        let output = found.before;

        if let Some(exit) = dialect.exit_command {
            self.send(Step::Send, exit, exit).await?;
            self.expect(Step::ExitExpect, context, &prompt, self.timeouts.exit)
                .await?;
        }

        if dialect.interrupt_after_command {
            self.shell
                .signal(Signal::Interrupt)
                .map_err(|e| self.step_error(Step::Interrupt, context, e))?;
            tokio::time::sleep(INTERRUPT_COOLDOWN).await;
            let stale = self.shell.drain(STALE_OUTPUT_QUIET).await;
            debug!("{}:{} discarded {} bytes after interrupt", self.host, self.port, stale);
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelControl, ShellChannel};
    use crate::platform::{DeviceKind, dialect};
    use crate::test_support::FakeDevice;

    /// A session already at the prompt, skipping login.
    async fn ready_session(kind: DeviceKind) -> (Session, FakeDevice) {
        crate::test_support::init_logging();
        let (shell, remote) = ShellChannel::pair();
        let mut session = Session::new(dialect(kind).unwrap(), shell, "10.0.0.7", 22);
        session.state = SessionState::Ready;
        (session, FakeDevice::new(remote))
    }

    #[tokio::test]
    async fn test_command_output_before_prompt() {
        let (mut session, mut device) = ready_session(DeviceKind::VendorCliA).await;
        let script = tokio::spawn(async move {
            assert_eq!(device.expect_line().await, "show version");
            device.emit("...output...\n").await;
            device.emit("node-7# ").await;
            device
        });

        let output = session.execute(&"show version".into()).await.unwrap();
        assert_eq!(output, "...output...\n");
        assert!(session.is_ready());
        script.await.unwrap();
    }

    #[tokio::test]
    async fn test_extra_prompt_completes_command() {
        let (mut session, mut device) = ready_session(DeviceKind::VendorCliA).await;
        let script = tokio::spawn(async move {
            device.expect_line().await;
            device.emit("Reboot the shelf? [y/N] ").await;
            device
        });

        let command = Command::new("reboot shelf").with_prompt(r"\[y/N\]").unwrap();
        let output = session.execute(&command).await.unwrap();
        assert_eq!(output, "Reboot the shelf? ");
        script.await.unwrap();
    }

    #[test]
    fn test_invalid_extra_prompt() {
        let err = Command::new("x").with_prompt("(").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Channel(ChannelError::InvalidPattern(_))
        ));
    }

    #[tokio::test]
    async fn test_quit_after_command() {
        let (mut session, mut device) = ready_session(DeviceKind::VendorCliB).await;
        let script = tokio::spawn(async move {
            assert_eq!(device.expect_line().await, "show card");
            device.emit("card 1 up\r\nnode-7# ").await;
            assert_eq!(device.expect_line().await, "quit\r");
            device.emit("node-7# ").await;
            device
        });

        let output = session.execute(&"show card".into()).await.unwrap();
        assert_eq!(output, "card 1 up\r\n");
        script.await.unwrap();
    }

    #[tokio::test]
    async fn test_nested_login_wraps_command() {
        let (mut session, mut device) = ready_session(DeviceKind::VendorCliC).await;
        let script = tokio::spawn(async move {
            assert_eq!(device.expect_line().await, "tools gmre");
            device.emit("Username: ").await;
            assert_eq!(device.expect_line().await, "gmre\r");
            device.emit("Password: ").await;
            assert_eq!(device.expect_line().await, "gmre\r");
            device.emit("gmre[1]# ").await;
            assert_eq!(device.expect_line().await, "show links\r");
            device.emit("link 1\r\ngmre[1]# ").await;
            assert_eq!(device.expect_line().await, "quit\r");
            device.emit("node-7# ").await;
            device
        });

        let output = session.execute(&"show links".into()).await.unwrap();
        assert_eq!(output, "link 1\r\n");
        assert!(session.is_ready());
        script.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_and_cooldown_after_command() {
        let (mut session, mut device) = ready_session(DeviceKind::NestedOseShell).await;
        let script = tokio::spawn(async move {
            assert_eq!(device.expect_line().await, "tail -f log");
            device.emit("line 1\nACT-OSE $ ").await;
            assert_eq!(
                device.next_control().await,
                Some(ChannelControl::Signal(Signal::Interrupt))
            );
            device.emit("^C\r\nACT-OSE $ ").await;
            device
        });

        let started = tokio::time::Instant::now();
        let output = session.execute(&"tail -f log".into()).await.unwrap();
        assert_eq!(output, "line 1\n");
        assert!(started.elapsed() >= INTERRUPT_COOLDOWN);
        let mut device = script.await.unwrap();

        // The stale prompt was drained; the next command sees only its own output.
        let script = tokio::spawn(async move {
            assert_eq!(device.expect_line().await, "date");
            device.emit("Mon\nACT-OSE $ ").await;
            device
        });
        let output = session.execute(&"date".into()).await.unwrap();
        assert_eq!(output, "Mon\n");
        script.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_session_usable() {
        let (mut session, mut device) = ready_session(DeviceKind::VendorCliA).await;
        let err = session.execute(&"show slow".into()).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.step(), Some(Step::CommandExpect));
        assert!(session.is_ready());
        assert_eq!(device.expect_line().await, "show slow");
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_output_of_timed_out_command_is_discarded() {
        let (mut session, mut device) = ready_session(DeviceKind::VendorCliA).await;
        let err = session.execute(&"show slow".into()).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(device.expect_line().await, "show slow");
        device.emit("slow result\nnode-7# ").await;

        let script = tokio::spawn(async move {
            assert_eq!(device.expect_line().await, "show date");
            device.emit("Mon Oct 16\nnode-7# ").await;
            device
        });
        let output = session.execute(&"show date".into()).await.unwrap();
        assert_eq!(output, "Mon Oct 16\n");
        assert!(session.is_ready());
        script.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_inside_nested_shell_closes_session() {
        let (mut session, mut device) = ready_session(DeviceKind::VendorCliC).await;
        let script = tokio::spawn(async move {
            assert_eq!(device.expect_line().await, "tools gmre");
            device.emit("Username: ").await;
            device.expect_line().await;
            device.emit("Password: ").await;
            device.expect_line().await;
            device.emit("gmre[1]# ").await;
            assert_eq!(device.expect_line().await, "show links\r");
            assert_eq!(device.next_control().await, Some(ChannelControl::Close));
            device
        });

        let err = session.execute(&"show links".into()).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.step(), Some(Step::CommandExpect));
        assert_eq!(session.state(), SessionState::Closed);
        script.await.unwrap();

        let err = session.execute(&"show links".into()).await.unwrap_err();
        assert!(err.is_not_connected());
    }

    #[tokio::test]
    async fn test_closed_stream_closes_session() {
        let (mut session, device) = ready_session(DeviceKind::VendorCliA).await;
        drop(device);
        let err = session.execute(&"show version".into()).await.unwrap_err();
        assert!(err.is_stream_closed() || matches!(err.step(), Some(Step::Send)));
        assert_eq!(session.state(), SessionState::Closed);

        let err = session.execute(&"show version".into()).await.unwrap_err();
        assert!(err.is_not_connected());
    }
}
