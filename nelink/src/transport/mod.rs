//! SSH transport layer wrapping russh.
//!
//! The session engine only sees the [`Connector`] and [`Transport`] traits:
//! dial, open an interactive shell, run a one-shot command, close. The russh
//! implementation lives in [`SshConnector`] / [`SshTransport`].

pub mod config;
mod pump;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::{SshConnector, SshTransport};

use std::future::Future;

use crate::channel::{PtyRequest, ShellChannel};
use crate::error::Result;

/// Opens transports.
pub trait Connector: Send + Sync {
    /// Transport produced by a successful dial.
    type Transport: Transport;

    /// Connect and authenticate.
    fn dial(&self, config: SshConfig) -> impl Future<Output = Result<Self::Transport>> + Send;
}

/// An authenticated connection to a device.
pub trait Transport: Send + Sync {
    /// Open a session channel, request a PTY and start the remote shell.
    fn open_shell(&mut self, pty: &PtyRequest) -> impl Future<Output = Result<ShellChannel>> + Send;

    /// Run one command on its own channel and return its standard output.
    fn run_one_shot(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Close the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Whether the connection is still usable.
    fn is_alive(&self) -> bool;
}
