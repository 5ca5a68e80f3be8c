//! Scripted devices and an in-memory transport for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::mpsc;

use crate::channel::{ChannelControl, PtyRequest, RemoteShell, ShellChannel};
use crate::error::{ChannelError, Result, TransportError};
use crate::transport::{Connector, SshConfig, Transport};

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The device end of a shell, driven line by line from a test.
pub(crate) struct FakeDevice {
    input: BufReader<ReadHalf<DuplexStream>>,
    output: WriteHalf<DuplexStream>,
    control: mpsc::UnboundedReceiver<ChannelControl>,
}

impl FakeDevice {
    pub(crate) fn new(remote: RemoteShell) -> Self {
        let (input, output) = tokio::io::split(remote.stream);
        Self {
            input: BufReader::new(input),
            output,
            control: remote.control,
        }
    }

    /// Print text to the engine.
    pub(crate) async fn emit(&mut self, text: &str) {
        self.output.write_all(text.as_bytes()).await.unwrap();
        self.output.flush().await.unwrap();
    }

    /// Next line written by the engine, without its newline.
    pub(crate) async fn expect_line(&mut self) -> String {
        let mut line = Vec::new();
        let n = self.input.read_until(b'\n', &mut line).await.unwrap();
        assert!(n > 0, "engine closed its input");
        line.pop();
        String::from_utf8(line).unwrap()
    }

    /// Next signal or close request from the engine.
    pub(crate) async fn next_control(&mut self) -> Option<ChannelControl> {
        self.control.recv().await
    }
}

#[derive(Default)]
struct MockState {
    dials: Vec<SshConfig>,
    shells: VecDeque<ShellChannel>,
    ptys: Vec<PtyRequest>,
    one_shot: HashMap<String, std::result::Result<String, u32>>,
    executed: Vec<String>,
    refuse_dial: bool,
    closes: usize,
}

/// Connector handing out scripted shells and recording what it was asked.
#[derive(Clone, Default)]
pub(crate) struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a shell for the next `open_shell` and return its device end.
    pub(crate) fn add_shell(&self) -> FakeDevice {
        let (shell, remote) = ShellChannel::pair();
        self.state.lock().unwrap().shells.push_back(shell);
        FakeDevice::new(remote)
    }

    /// Output of a one-shot command.
    pub(crate) fn one_shot(&self, command: &str, output: &str) {
        self.state
            .lock()
            .unwrap()
            .one_shot
            .insert(command.to_string(), Ok(output.to_string()));
    }

    /// A one-shot command exiting with `status`.
    pub(crate) fn one_shot_failure(&self, command: &str, status: u32) {
        self.state
            .lock()
            .unwrap()
            .one_shot
            .insert(command.to_string(), Err(status));
    }

    pub(crate) fn refuse_dial(&self) {
        self.state.lock().unwrap().refuse_dial = true;
    }

    pub(crate) fn dials(&self) -> Vec<SshConfig> {
        self.state.lock().unwrap().dials.clone()
    }

    pub(crate) fn ptys(&self) -> Vec<PtyRequest> {
        self.state.lock().unwrap().ptys.clone()
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    pub(crate) fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }
}

pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
    alive: bool,
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn dial(&self, config: SshConfig) -> Result<MockTransport> {
        let mut state = self.state.lock().unwrap();
        let refuse = state.refuse_dial;
        let (host, port) = (config.host.clone(), config.port);
        state.dials.push(config);
        if refuse {
            return Err(TransportError::ConnectionFailed {
                host,
                port,
                source: std::io::ErrorKind::ConnectionRefused.into(),
            }
            .into());
        }
        Ok(MockTransport {
            state: self.state.clone(),
            alive: true,
        })
    }
}

impl Transport for MockTransport {
    async fn open_shell(&mut self, pty: &PtyRequest) -> Result<ShellChannel> {
        let mut state = self.state.lock().unwrap();
        state.ptys.push(pty.clone());
        state
            .shells
            .pop_front()
            .ok_or_else(|| ChannelError::Closed.into())
    }

    async fn run_one_shot(&mut self, command: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.executed.push(command.to_string());
        match state.one_shot.get(command) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(status)) => Err(ChannelError::NonZeroExit {
                command: command.to_string(),
                exit_status: *status,
                output: String::new(),
            }
            .into()),
            None => Err(ChannelError::NonZeroExit {
                command: command.to_string(),
                exit_status: 127,
                output: format!("{command}: command not found"),
            }
            .into()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().unwrap().closes += 1;
        self.alive = false;
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive
    }
}
