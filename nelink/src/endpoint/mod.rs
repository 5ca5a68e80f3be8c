//! One remote device: identity, credentials, dialect and owned connection.
//!
//! ```rust,no_run
//! use nelink::{DeviceKind, Endpoint};
//!
//! # async fn example() -> Result<(), nelink::Error> {
//! let mut endpoint = Endpoint::builder("10.0.0.7")
//!     .username("admin")
//!     .password("secret")
//!     .kind(DeviceKind::VendorCliA)
//!     .build()?;
//!
//! endpoint.connect().await?;
//! let outputs = endpoint.run(["show version", "show card"]).await?;
//! for (command, output) in &outputs {
//!     println!("{command}:\n{output}");
//! }
//! endpoint.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
pub mod validate;


pub use builder::EndpointBuilder;
pub use config::EndpointConfig;

use std::path::PathBuf;

use indexmap::IndexMap;
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::channel::PtyRequest;
use crate::error::{Error, Result, SessionError, Step};
use crate::platform::{self, DeviceKind, Execution, StepTimeouts};
use crate::session::{Command, Session, SessionState};
use crate::transport::config::TUNNEL_HOST;
use crate::transport::{
    AuthMethod, Connector, HostKeyVerification, SshConfig, SshConnector, Transport,
};

/// Connection held by an endpoint.
enum Link<T> {
    /// Nothing open; `connect` may be called.
    Idle,

    /// Transport open. `session` is `None` for one-shot dialects.
    Connected {
        transport: T,
        session: Option<Session>,
    },

    /// Disconnected for good.
    Terminated,
}

/// A remote network element and its connection.
pub struct Endpoint<C: Connector = SshConnector> {
    address: String,
    port_input: String,
    port: u16,
    name: Option<String>,
    username: String,
    password: SecretString,
    kind: DeviceKind,
    via_tunnel: bool,
    timeouts: StepTimeouts,
    pty: PtyRequest,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    connection_timeout: std::time::Duration,
    connector: C,
    link: Link<C::Transport>,
}

impl Endpoint {
    /// Start building an endpoint for the device at `address`.
    pub fn builder(address: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(address)
    }

    /// Create an endpoint from a deserialized configuration record.
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        config.to_builder().build()
    }
}

impl<C: Connector> Endpoint<C> {
    /// Device address as given.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Port in use. Holds the validated value after `connect`.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Display name, given or discovered at login.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Whether the endpoint can run commands.
    pub fn is_connected(&self) -> bool {
        match &self.link {
            Link::Connected {
                transport,
                session: Some(session),
            } => transport.is_alive() && session.is_ready(),
            Link::Connected {
                transport,
                session: None,
            } => transport.is_alive(),
            _ => false,
        }
    }

    /// State of the interactive session, if one is open.
    pub fn session_state(&self) -> Option<SessionState> {
        match &self.link {
            Link::Connected { session: Some(session), .. } => Some(session.state()),
            _ => None,
        }
    }

    fn not_connected(&self) -> Error {
        match self.link {
            Link::Terminated => SessionError::Terminated {
                host: self.address.clone(),
                port: self.port,
            },
            _ => SessionError::NotConnected {
                host: self.address.clone(),
                port: self.port,
            },
        }
        .into()
    }

    fn step_error(&self, step: Step, context: Option<&str>, source: Error) -> Error {
        SessionError::StepFailed {
            host: self.address.clone(),
            port: self.port,
            step,
            context: context.map(str::to_string),
            source: Box::new(source),
        }
        .into()
    }

    /// Validate the endpoint, open the transport and log in.
    ///
    /// On failure everything opened so far is closed again and `connect` may
    /// be retried.
    pub async fn connect(&mut self) -> Result<()> {
        match self.link {
            Link::Idle => {}
            Link::Connected { .. } => {
                return Err(SessionError::AlreadyConnected {
                    host: self.address.clone(),
                    port: self.port,
                }
                .into());
            }
            Link::Terminated => return Err(self.not_connected()),
        }

        validate::address(&self.address)?;
        self.port = validate::port(&self.port_input);
        self.connection_timeout = validate::CONNECTION_TIMEOUT;

        let dialect = platform::dialect(self.kind)?;
        let (username, password) =
            dialect.transport_credentials(&self.username, self.password.expose_secret());

        let config = SshConfig {
            host: self.address.clone(),
            port: self.port,
            dial_host: self.via_tunnel.then(|| TUNNEL_HOST.to_string()),
            username: username.to_string(),
            auth: AuthMethod::Password(SecretString::from(password.to_string())),
            timeout: self.connection_timeout,
            host_key_verification: self.host_key_verification.clone(),
            known_hosts_path: self.known_hosts_path.clone(),
        };

        info!("connecting to {}:{} ({})", self.address, self.port, self.kind);
        let mut transport = self
            .connector
            .dial(config)
            .await
            .map_err(|e| self.step_error(Step::Dial, None, e))?;

        let session = match dialect.execution {
            Execution::OneShot => None,
            Execution::Interactive => match self.open_session(&mut transport, dialect).await {
                Ok(session) => Some(session),
                Err(e) => {
                    if let Err(close_err) = transport.close().await {
                        warn!("{}:{} - failed to close transport: {}", self.address, self.port, close_err);
                    }
                    return Err(e);
                }
            },
        };

        if self.name.is_none() {
            self.name = session
                .as_ref()
                .and_then(|s| s.discovered_name())
                .map(str::to_string);
        }

        self.link = Link::Connected { transport, session };
        info!("connected to {}:{}", self.address, self.port);
        Ok(())
    }

    async fn open_session(
        &self,
        transport: &mut C::Transport,
        dialect: &'static platform::Dialect,
    ) -> Result<Session> {
        let shell = transport
            .open_shell(&self.pty)
            .await
            .map_err(|e| self.step_error(Step::OpenChannel, None, e))?;

        let mut session = Session::new(dialect, shell, self.address.clone(), self.port)
            .with_timeouts(self.timeouts.clone());
        session.login(&self.username, &self.password).await?;
        Ok(session)
    }

    /// Run commands in order and collect their outputs by command line.
    ///
    /// Stops at the first failure; later commands are not sent.
    pub async fn run<I>(&mut self, commands: I) -> Result<IndexMap<String, String>>
    where
        I: IntoIterator,
        I::Item: Into<Command>,
    {
        let mut outputs = IndexMap::new();
        for command in commands {
            let command = command.into();
            let output = self.run_command(&command).await?;
            outputs.insert(command.line, output);
        }
        Ok(outputs)
    }

    /// Run a single command and return its output.
    pub async fn run_command(&mut self, command: &Command) -> Result<String> {
        let (host, port) = (self.address.clone(), self.port);
        let result = match &mut self.link {
            Link::Connected {
                transport,
                session: None,
            } => {
                debug!("{}:{} exec {:?}", host, port, command.line);
                transport
                    .run_one_shot(&command.line)
                    .await
                    .map_err(|e| SessionError::StepFailed {
                        host: host.clone(),
                        port,
                        step: Step::CommandExec,
                        context: Some(command.line.clone()),
                        source: Box::new(e),
                    })
                    .map_err(Error::from)
            }
            Link::Connected {
                session: Some(session),
                ..
            } if session.is_ready() => session.execute(command).await,
            _ => return Err(self.not_connected()),
        };

        // A session that closed itself takes the transport down with it.
        if let Link::Connected {
            session: Some(session),
            ..
        } = &self.link
        {
            if session.state() == SessionState::Closed {
                self.drop_link().await;
            }
        }
        result
    }

    /// Close whatever is open and go back to idle.
    async fn drop_link(&mut self) {
        if let Link::Connected {
            mut transport,
            session,
        } = std::mem::replace(&mut self.link, Link::Idle)
        {
            if let Some(mut session) = session {
                session.close().await;
            }
            if let Err(e) = transport.close().await {
                warn!("{}:{} - failed to close transport: {}", self.address, self.port, e);
            }
        }
    }

    /// Close the session and the transport. The endpoint cannot be reused.
    ///
    /// Calling this again is a no-op.
    pub async fn disconnect(&mut self) {
        match self.link {
            Link::Terminated => {
                debug!("{}:{} already disconnected", self.address, self.port);
                return;
            }
            Link::Connected { .. } => {
                self.drop_link().await;
                info!("disconnected from {}:{}", self.address, self.port);
            }
            Link::Idle => {}
        }
        self.link = Link::Terminated;
    }
}

impl<C: Connector> Drop for Endpoint<C> {
    fn drop(&mut self) {
        if matches!(self.link, Link::Connected { .. }) {
            warn!(
                "endpoint {}:{} dropped while connected, call disconnect() first",
                self.address, self.port
            );
        }
    }
}

impl<C: Connector> std::fmt::Debug for Endpoint<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<hidden>")
            .field("kind", &self.kind)
            .field("via_tunnel", &self.via_tunnel)
            .field("connected", &self.is_connected())
            .finish()
    }
}
