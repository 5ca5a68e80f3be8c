//! SSH transport implementation using russh.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg, Pty};
use secrecy::ExposeSecret;
use tokio::task::JoinHandle;

use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use super::{Connector, Transport, pump};
use crate::channel::{PtyRequest, ShellChannel, excerpt};
use crate::error::{ChannelError, Result, TransportError};

/// Dials devices over SSH.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

impl Connector for SshConnector {
    type Transport = SshTransport;

    async fn dial(&self, config: SshConfig) -> Result<SshTransport> {
        SshTransport::connect(config).await
    }
}

/// SSH transport wrapping russh client.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Configuration used for this connection.
    config: SshConfig,

    /// Pumps of the shells opened on this connection.
    pumps: Vec<JoinHandle<()>>,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("dialing {} (device {}:{})", config.socket_addr(), config.host, config.port);
        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.dial_host(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // A detailed host key error beats the generic russh::Error::UnknownKey
            if let Some(hk_err) = host_key_error.lock().ok().and_then(|mut slot| slot.take()) {
                return hk_err;
            }
            match e {
                russh::Error::IO(source) => TransportError::ConnectionFailed {
                    host: config.host.clone(),
                    port: config.port,
                    source,
                },
                other => TransportError::Ssh(other),
            }
        })?;

        tokio::time::timeout(config.timeout, Self::authenticate(&mut session, &config))
            .await
            .map_err(|_| TransportError::Timeout(config.timeout))??;

        info!("SSH connection to {}:{} established", config.host, config.port);
        Ok(Self {
            session,
            config,
            pumps: Vec::new(),
        })
    }

    /// Authenticate with the server.
    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::None => session
                .authenticate_none(&config.username)
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(e.to_string()))?;

                // Get the best RSA hash algorithm supported by the server
                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }
}

impl Transport for SshTransport {
    async fn open_shell(&mut self, pty: &PtyRequest) -> Result<ShellChannel> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(ChannelError::OpenFailed)?;

        let modes = [
            (Pty::ECHO, u32::from(pty.echo)),
            (Pty::TTY_OP_ISPEED, pty.speed),
            (Pty::TTY_OP_OSPEED, pty.speed),
        ];
        channel
            .request_pty(true, &pty.term, pty.columns, pty.rows, 0, 0, &modes)
            .await
            .map_err(ChannelError::PtyRequestFailed)?;

        channel
            .request_shell(true)
            .await
            .map_err(ChannelError::ShellRequestFailed)?;

        let (shell, remote) = ShellChannel::pair();
        self.pumps.retain(|pump| !pump.is_finished());
        self.pumps.push(tokio::spawn(pump::run(channel, remote)));
        debug!("shell opened on {}:{}", self.config.host, self.config.port);
        Ok(shell)
    }

    async fn run_one_shot(&mut self, command: &str) -> Result<String> {
        let mut channel = self
            .session
            .channel_open_session()
            .await
            .map_err(ChannelError::OpenFailed)?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| ChannelError::ExecFailed {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        collect_exec(&mut channel, command, self.config.timeout).await
    }

    async fn close(&mut self) -> Result<()> {
        for pump in self.pumps.drain(..) {
            pump.abort();
        }
        if self.session.is_closed() {
            return Ok(());
        }
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        info!("SSH connection to {}:{} closed", self.config.host, self.config.port);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        !self.session.is_closed()
    }
}

/// Messages of an exec channel, in arrival order.
trait ExecMessages: Send {
    fn next_message(&mut self) -> impl Future<Output = Option<ChannelMsg>> + Send;
}

impl ExecMessages for Channel<Msg> {
    async fn next_message(&mut self) -> Option<ChannelMsg> {
        self.wait().await
    }
}

/// Collect stdout until the channel closes, within `budget`.
///
/// A zero exit status yields the output; anything else is an error.
async fn collect_exec<M: ExecMessages>(
    messages: &mut M,
    command: &str,
    budget: Duration,
) -> Result<String> {
    let mut stdout = Vec::new();
    let mut exit_status = None;
    let collect = async {
        while let Some(msg) = messages.next_message().await {
            match msg {
                ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
                ChannelMsg::ExitStatus { exit_status: status } => exit_status = Some(status),
                ChannelMsg::Close => break,
                _ => {}
            }
        }
    };
    if tokio::time::timeout(budget, collect).await.is_err() {
        warn!("{:?} did not finish within {:?}", command, budget);
        return Err(TransportError::Timeout(budget).into());
    }

    let output = String::from_utf8_lossy(&stdout).into_owned();
    match exit_status {
        Some(0) => Ok(output),
        Some(status) => Err(ChannelError::NonZeroExit {
            command: command.to_string(),
            exit_status: status,
            output: excerpt(&output),
        }
        .into()),
        None => Err(ChannelError::ExecFailed {
            command: command.to_string(),
            reason: "channel closed without exit status".to_string(),
        }
        .into()),
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Stores a detailed host-key error so connect() can surface it
    /// instead of the generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found,
    /// `Err(TransportError::HostKeyChanged)` if key changed.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> std::result::Result<bool, TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::check_known_hosts(&self.host, self.port, pubkey)
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> std::result::Result<(), TransportError> {
        let result = if let Some(ref path) = self.known_hosts_path {
            russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey)
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        match self.host_key_verification {
            HostKeyVerification::Disabled => Ok(true),

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key: {}", e);
                    }
                    Ok(true)
                }
                Err(e) => Ok(self.reject(e)),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => Ok(self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                })),
                Err(e) => Ok(self.reject(e)),
            },
        }
    }
}
