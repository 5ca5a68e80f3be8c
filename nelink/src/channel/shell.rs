//! Interactive shell channel.
//!
//! The engine talks to the remote shell through an in-memory duplex pipe.
//! Whatever sits on the far end ([`RemoteShell`]) moves bytes between the pipe
//! and the real remote: the SSH pump in production, a scripted device in
//! tests.

use std::time::Duration;

use log::{debug, trace};
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::mpsc;

use super::patterns::Expectation;
use super::scanner::{ScanMatch, StreamScanner};
use crate::error::{ChannelError, ExpectError};

/// Capacity of the in-memory pipe in each direction.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Signals that can be delivered to the remote process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Ctrl-C on the foreground process.
    Interrupt,
}

/// Out-of-band requests from the engine to whatever owns the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelControl {
    Signal(Signal),
    Close,
}

/// Terminal requested for an interactive shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtyRequest {
    /// Terminal type.
    pub term: String,

    /// Whether the remote echoes input.
    pub echo: bool,

    /// Terminal width in columns.
    pub columns: u32,

    /// Terminal height in rows (0 lets the remote decide).
    pub rows: u32,

    /// Input and output baud rate.
    pub speed: u32,
}

impl Default for PtyRequest {
    fn default() -> Self {
        Self {
            term: "xterm".to_string(),
            echo: false,
            columns: 200,
            rows: 0,
            speed: 14400,
        }
    }
}

/// Engine-side handle of an interactive shell.
pub struct ShellChannel {
    scanner: StreamScanner<ReadHalf<DuplexStream>>,
    input: WriteHalf<DuplexStream>,
    control: mpsc::UnboundedSender<ChannelControl>,
    open: bool,
}

/// Remote-side end of a [`ShellChannel`].
pub struct RemoteShell {
    /// Bytes written here are read by the engine; bytes the engine sends
    /// arrive here.
    pub stream: DuplexStream,

    /// Signal and close requests issued by the engine.
    pub control: mpsc::UnboundedReceiver<ChannelControl>,
}

impl ShellChannel {
    /// Create a connected channel and its remote end.
    pub fn pair() -> (ShellChannel, RemoteShell) {
        let (local, remote) = tokio::io::duplex(PIPE_CAPACITY);
        let (reader, writer) = tokio::io::split(local);
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let channel = ShellChannel {
            scanner: StreamScanner::new(reader),
            input: writer,
            control: control_tx,
            open: true,
        };
        let remote = RemoteShell {
            stream: remote,
            control: control_rx,
        };
        (channel, remote)
    }

    /// Write `data` followed by a newline.
    pub async fn send_line(&mut self, data: &str) -> Result<(), ChannelError> {
        trace!("send: {:?}", data);
        self.write(data.as_bytes()).await?;
        self.write(b"\n").await?;
        self.input.flush().await.map_err(ChannelError::Write)
    }

    /// Write a line that must never show up in logs.
    pub async fn send_secret(&mut self, secret: &str) -> Result<(), ChannelError> {
        trace!("send: <hidden>");
        self.write(secret.as_bytes()).await?;
        self.write(b"\n").await?;
        self.input.flush().await.map_err(ChannelError::Write)
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }
        self.input.write_all(data).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                ChannelError::Closed
            } else {
                ChannelError::Write(e)
            }
        })
    }

    /// Wait for the expectation to be met on the shell's output.
    pub async fn expect(
        &mut self,
        expectation: &Expectation,
        timeout: Duration,
    ) -> Result<ScanMatch, ExpectError> {
        self.scanner.expect(expectation, timeout).await
    }

    /// Discard output until the shell has been quiet for `quiet`.
    pub async fn drain(&mut self, quiet: Duration) -> usize {
        self.scanner.drain(quiet).await
    }

    /// Deliver a signal to the remote process.
    pub fn signal(&self, signal: Signal) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }
        debug!("signal {:?}", signal);
        self.control
            .send(ChannelControl::Signal(signal))
            .map_err(|_| ChannelError::Closed)
    }

    /// Close the channel. Closing twice is a no-op.
    pub async fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let _ = self.control.send(ChannelControl::Close);
        let _ = self.input.shutdown().await;
        debug!("shell channel closed");
    }

    /// Whether the channel has not been closed.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl std::fmt::Debug for ShellChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellChannel")
            .field("open", &self.open)
            .field("scanner", &self.scanner)
            .finish()
    }
}

impl std::fmt::Debug for RemoteShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteShell").finish_non_exhaustive()
    }
}
