//! Error types for nelink.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for nelink operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed endpoint input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Shell channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Stream scanner errors
    #[error("Expect error: {0}")]
    Expect(#[from] ExpectError),

    /// Login, command and logout step errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Dialect definition errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Input validation errors raised before anything is dialed.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Address is not four dot-separated decimal octets
    #[error("provided ip: {address} - {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Device kind selector not recognised
    #[error("unknown device kind '{name}'")]
    UnknownDeviceKind { name: String },

    /// A required builder field was not supplied
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host is not in known_hosts and strict checking is on
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Shell channel errors.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to open a session channel
    #[error("Failed to open session channel: {0}")]
    OpenFailed(russh::Error),

    /// Failed to allocate the PTY
    #[error("Failed to request PTY: {0}")]
    PtyRequestFailed(russh::Error),

    /// Failed to request shell
    #[error("Failed to request shell: {0}")]
    ShellRequestFailed(russh::Error),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// Writing to the remote failed
    #[error("Write to channel failed: {0}")]
    Write(#[source] io::Error),

    /// One-shot command could not be executed
    #[error("failed to run: {command} >> {reason}")]
    ExecFailed { command: String, reason: String },

    /// One-shot command exited with a non-zero status
    #[error("failed to run: {command} >> exit status {exit_status}: {output}")]
    NonZeroExit {
        command: String,
        exit_status: u32,
        output: String,
    },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Stream scanner outcomes other than a happy match.
#[derive(Error, Debug)]
pub enum ExpectError {
    /// Deadline elapsed with no recognizer match
    #[error("timed out after {timeout:?} on: {patterns} - seen: {observed:?}")]
    Timeout {
        timeout: Duration,
        patterns: String,
        observed: String,
    },

    /// Peer closed the stream before any recognizer matched
    #[error("stream closed before match - seen: {observed:?}")]
    StreamClosed { observed: String },

    /// A failure recognizer matched
    #[error("{matched:?} matched failure pattern {pattern} - seen: {observed:?}")]
    FailurePattern {
        pattern: String,
        matched: String,
        observed: String,
    },

    /// Reading the stream failed
    #[error("read failed: {0}")]
    Io(#[from] io::Error),

    /// The reader was lost by a previous expect (read task panicked)
    #[error("output stream unavailable")]
    ReaderUnavailable,
}

/// Session and endpoint errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A login, command or logout step failed
    #[error("{host}:{port} - failure on {step}{} - details: {source}", fmt_context(.context))]
    StepFailed {
        host: String,
        port: u16,
        step: Step,
        context: Option<String>,
        #[source]
        source: Box<Error>,
    },

    /// The device explicitly rejected the credentials
    #[error("{host}:{port} - authentication failed: {matched:?} - seen: {observed:?}")]
    AuthenticationFailed {
        host: String,
        port: u16,
        matched: String,
        observed: String,
    },

    /// No usable session; connect first
    #[error("{host}:{port} - session is closed - call connect() first")]
    NotConnected { host: String, port: u16 },

    /// Connect called on a connected endpoint
    #[error("{host}:{port} - already connected")]
    AlreadyConnected { host: String, port: u16 },

    /// Endpoint was disconnected and must not be reused
    #[error("{host}:{port} - endpoint was disconnected and cannot be reused")]
    Terminated { host: String, port: u16 },
}

fn fmt_context(context: &Option<String>) -> String {
    context
        .as_ref()
        .map(|c| format!("({c})"))
        .unwrap_or_default()
}

/// Dialect definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid dialect definition
    #[error("Invalid dialect definition: {message}")]
    InvalidDefinition { message: String },

    /// A recognizer failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// The send or expect step a session failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Dial,
    OpenChannel,
    InitialPrompt,
    IdentityExpect,
    SecretExpect,
    ConfirmationExpect,
    ReadyExpect,
    EnterMode,
    Send,
    NestedIdentityExpect,
    NestedSecretExpect,
    NestedPromptExpect,
    CommandExpect,
    CommandExec,
    ExitExpect,
    Interrupt,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Dial => "dial",
            Step::OpenChannel => "open channel",
            Step::InitialPrompt => "initial prompt",
            Step::IdentityExpect => "identity prompt",
            Step::SecretExpect => "secret prompt",
            Step::ConfirmationExpect => "confirmation prompt",
            Step::ReadyExpect => "ready prompt",
            Step::EnterMode => "enter mode",
            Step::Send => "send",
            Step::NestedIdentityExpect => "nested identity prompt",
            Step::NestedSecretExpect => "nested secret prompt",
            Step::NestedPromptExpect => "nested prompt",
            Step::CommandExpect => "command prompt",
            Step::CommandExec => "command exec",
            Step::ExitExpect => "exit prompt",
            Step::Interrupt => "interrupt",
        };
        f.write_str(name)
    }
}

impl Error {
    /// The innermost error, looking through step wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Session(SessionError::StepFailed { source, .. }) => source.root(),
            other => other,
        }
    }

    /// The step that failed, if this is a step failure.
    pub fn step(&self) -> Option<Step> {
        match self {
            Error::Session(SessionError::StepFailed { step, .. }) => Some(*step),
            _ => None,
        }
    }

    /// Whether a deadline elapsed (expect or transport).
    pub fn is_timeout(&self) -> bool {
        matches!(
            self.root(),
            Error::Expect(ExpectError::Timeout { .. })
                | Error::Transport(TransportError::Timeout(_))
        )
    }

    /// Whether the peer closed the stream before a match.
    pub fn is_stream_closed(&self) -> bool {
        matches!(
            self.root(),
            Error::Expect(ExpectError::StreamClosed { .. }) | Error::Channel(ChannelError::Closed)
        )
    }

    /// Whether the credentials were rejected, at the CLI or SSH layer.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self.root(),
            Error::Session(SessionError::AuthenticationFailed { .. })
                | Error::Transport(TransportError::AuthenticationFailed { .. })
        )
    }

    /// Whether the endpoint has no usable session.
    pub fn is_not_connected(&self) -> bool {
        matches!(
            self.root(),
            Error::Session(SessionError::NotConnected { .. } | SessionError::Terminated { .. })
        )
    }
}

/// Result type alias using nelink's Error.
pub type Result<T> = std::result::Result<T, Error>;
