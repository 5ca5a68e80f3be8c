//! Dialect definitions: recognizers, login steps and timeouts per device kind.

use std::time::Duration;

use regex::bytes::Regex;

use super::kind::DeviceKind;
use crate::error::PlatformError;

/// Compile a recognizer, mapping failures to a platform error.
pub(crate) fn compile(pattern: &str) -> Result<Regex, PlatformError> {
    Regex::new(pattern).map_err(|source| PlatformError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Recognizers for one dialect.
///
/// The prompt recognizer is mandatory. The others are absent for dialects
/// that skip the matching login step.
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// Command prompt.
    pub prompt: Regex,

    /// Identity (username) prompt.
    pub username: Option<Regex>,

    /// Secret (password) prompt.
    pub password: Option<Regex>,

    /// Yes/no confirmation prompt shown after login.
    pub agreement: Option<Regex>,

    /// Explicit rejection of the credentials.
    pub auth_failure: Option<Regex>,
}

impl PatternSet {
    /// Create a pattern set with only a prompt recognizer.
    pub fn new(prompt: &str) -> Result<Self, PlatformError> {
        if prompt.is_empty() {
            return Err(PlatformError::InvalidDefinition {
                message: "prompt pattern must not be empty".to_string(),
            });
        }
        Ok(Self {
            prompt: compile(prompt)?,
            username: None,
            password: None,
            agreement: None,
            auth_failure: None,
        })
    }

    /// Add the identity and secret prompt recognizers.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Result<Self, PlatformError> {
        self.username = Some(compile(username)?);
        self.password = Some(compile(password)?);
        Ok(self)
    }

    /// Add the yes/no confirmation recognizer.
    pub fn with_agreement(mut self, agreement: &str) -> Result<Self, PlatformError> {
        self.agreement = Some(compile(agreement)?);
        Ok(self)
    }

    /// Add the authentication failure recognizer.
    pub fn with_auth_failure(mut self, auth_failure: &str) -> Result<Self, PlatformError> {
        self.auth_failure = Some(compile(auth_failure)?);
        Ok(self)
    }
}

/// Deadlines for each expect step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTimeouts {
    pub initial_prompt: Duration,
    pub identity: Duration,
    pub secret: Duration,
    /// Agreement-or-prompt race after the secret.
    pub confirmation: Duration,
    /// Prompt after answering the agreement.
    pub post_agreement: Duration,
    pub ready: Duration,
    pub enter_mode: Duration,
    pub command: Duration,
    pub nested: Duration,
    pub exit: Duration,
}

impl Default for StepTimeouts {
    fn default() -> Self {
        Self {
            initial_prompt: Duration::from_secs(6),
            identity: Duration::from_secs(6),
            secret: Duration::from_secs(6),
            confirmation: Duration::from_secs(6),
            post_agreement: Duration::from_secs(4),
            ready: Duration::from_secs(4),
            enter_mode: Duration::from_secs(6),
            command: Duration::from_secs(15),
            nested: Duration::from_secs(15),
            exit: Duration::from_secs(15),
        }
    }
}

/// Which credentials authenticate the SSH transport itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialPolicy {
    /// The caller's username and password.
    Caller,

    /// A fixed account; the caller's credentials are used for the CLI login.
    ServiceAccount {
        username: &'static str,
        password: &'static str,
    },
}

/// In-band sub-shell entered from the outer CLI before every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedLogin {
    /// Command that starts the sub-shell.
    pub enter_command: &'static str,

    /// Inner username line.
    pub username: &'static str,

    /// Inner password line.
    pub password: &'static str,
}

/// How commands are carried to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// One exec channel per command, stdout captured until it closes.
    OneShot,

    /// Commands written to a persistent shell and completed by the prompt.
    Interactive,
}

/// Everything the session engine needs to drive one device kind.
///
/// The engine runs a single generic procedure; each field switches a step on
/// or off or supplies its data.
#[derive(Debug, Clone)]
pub struct Dialect {
    pub kind: DeviceKind,
    pub execution: Execution,
    pub credentials: CredentialPolicy,
    pub patterns: PatternSet,

    /// Wait for the prompt before doing anything else.
    pub await_initial_prompt: bool,

    /// Lines sent after the initial prompt to enter the working mode; the
    /// prompt is expected once they are all sent.
    pub enter_mode: Vec<&'static str>,

    /// Command that turns output paging off after login.
    pub paging_command: Option<&'static str>,

    /// Expect the prompt once login is complete.
    pub confirm_ready: bool,

    /// Recognizer with a `name` group that extracts the device's own name
    /// from the first prompt.
    pub name_discovery: Option<Regex>,

    /// Sub-shell login wrapped around every command.
    pub nested: Option<NestedLogin>,

    /// Appended to every command line.
    pub command_suffix: &'static str,

    /// Sent after every command, followed by a prompt expect.
    pub exit_command: Option<&'static str>,

    /// Interrupt the foreground process after every command.
    pub interrupt_after_command: bool,

    pub timeouts: StepTimeouts,
}

impl Dialect {
    /// Start a dialect definition with defaults for every optional step.
    pub fn new(kind: DeviceKind, execution: Execution, patterns: PatternSet) -> Self {
        Self {
            kind,
            execution,
            credentials: CredentialPolicy::Caller,
            patterns,
            await_initial_prompt: false,
            enter_mode: Vec::new(),
            paging_command: None,
            confirm_ready: false,
            name_discovery: None,
            nested: None,
            command_suffix: "",
            exit_command: None,
            interrupt_after_command: false,
            timeouts: StepTimeouts::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: CredentialPolicy) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_initial_prompt(mut self) -> Self {
        self.await_initial_prompt = true;
        self
    }

    pub fn with_enter_mode(mut self, lines: &[&'static str]) -> Self {
        self.enter_mode = lines.to_vec();
        self
    }

    pub fn with_paging_command(mut self, command: &'static str) -> Self {
        self.paging_command = Some(command);
        self
    }

    pub fn with_ready_check(mut self) -> Self {
        self.confirm_ready = true;
        self
    }

    /// Discover the display name from the first prompt.
    ///
    /// The recognizer must define a `name` capture group.
    pub fn with_name_discovery(mut self, pattern: &str) -> Result<Self, PlatformError> {
        let re = compile(pattern)?;
        if !re.capture_names().flatten().any(|n| n == "name") {
            return Err(PlatformError::InvalidDefinition {
                message: format!("name discovery pattern '{pattern}' has no 'name' group"),
            });
        }
        self.name_discovery = Some(re);
        Ok(self)
    }

    pub fn with_nested_login(mut self, nested: NestedLogin) -> Self {
        self.nested = Some(nested);
        self
    }

    pub fn with_command_suffix(mut self, suffix: &'static str) -> Self {
        self.command_suffix = suffix;
        self
    }

    pub fn with_exit_command(mut self, command: &'static str) -> Self {
        self.exit_command = Some(command);
        self
    }

    pub fn with_interrupt_after_command(mut self) -> Self {
        self.interrupt_after_command = true;
        self
    }

    /// Whether every command is wrapped in steps that move the shell away
    /// from the outer prompt (sub-shell login, exit command, interrupt).
    pub fn wraps_commands(&self) -> bool {
        self.nested.is_some() || self.exit_command.is_some() || self.interrupt_after_command
    }

    /// Transport username and password for the given caller credentials.
    pub fn transport_credentials<'a>(
        &self,
        username: &'a str,
        password: &'a str,
    ) -> (&'a str, &'a str) {
        match self.credentials {
            CredentialPolicy::Caller => (username, password),
            CredentialPolicy::ServiceAccount { username, password } => (username, password),
        }
    }
}
