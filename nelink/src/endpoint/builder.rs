//! Builder for creating endpoints.

use std::path::PathBuf;

use secrecy::SecretString;

use super::validate::{CONNECTION_TIMEOUT, DEFAULT_PORT};
use super::{Endpoint, Link};
use crate::channel::PtyRequest;
use crate::error::{Result, ValidationError};
use crate::platform::{self, DeviceKind, StepTimeouts};
use crate::transport::{Connector, HostKeyVerification, SshConnector};

/// Builder for constructing endpoints.
///
/// Nothing is validated or dialed here; [`Endpoint::connect`] does both.
///
/// # Example
///
/// ```rust,no_run
/// use nelink::{DeviceKind, Endpoint};
///
/// # fn example() -> Result<(), nelink::Error> {
/// let endpoint = Endpoint::builder("10.0.0.7")
///     .port("2222")
///     .username("admin")
///     .password("secret")
///     .kind(DeviceKind::NestedOseShell)
///     .via_tunnel(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct EndpointBuilder {
    address: String,
    port: String,
    name: Option<String>,
    username: String,
    password: SecretString,
    kind: Option<DeviceKind>,
    via_tunnel: bool,
    timeouts: Option<StepTimeouts>,
    pty: PtyRequest,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl EndpointBuilder {
    /// Create a new builder for the device at `address`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: DEFAULT_PORT.to_string(),
            name: None,
            username: String::new(),
            password: SecretString::from(String::new()),
            kind: None,
            via_tunnel: false,
            timeouts: None,
            pty: PtyRequest::default(),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port as given by the user; checked at connect time.
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<SecretString>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the device kind.
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Dial the local end of a tunnel instead of the device address.
    pub fn via_tunnel(mut self, via_tunnel: bool) -> Self {
        self.via_tunnel = via_tunnel;
        self
    }

    /// Override the dialect's step deadlines.
    pub fn step_timeouts(mut self, timeouts: StepTimeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Set the terminal requested for interactive shells.
    pub fn pty(mut self, pty: PtyRequest) -> Self {
        self.pty = pty;
        self
    }

    /// Set host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Set a custom known_hosts file path.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Build an endpoint that connects over SSH.
    pub fn build(self) -> Result<Endpoint> {
        self.build_with(SshConnector)
    }

    /// Build an endpoint that connects through `connector`.
    pub fn build_with<C: Connector>(self, connector: C) -> Result<Endpoint<C>> {
        let kind = self
            .kind
            .ok_or(ValidationError::MissingField { field: "kind" })?;
        let timeouts = match self.timeouts {
            Some(timeouts) => timeouts,
            None => platform::dialect(kind)?.timeouts.clone(),
        };

        Ok(Endpoint {
            address: self.address,
            port: self.port.trim().parse().unwrap_or(DEFAULT_PORT),
            port_input: self.port,
            name: self.name,
            username: self.username,
            password: self.password,
            kind,
            via_tunnel: self.via_tunnel,
            timeouts,
            pty: self.pty,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
            connection_timeout: CONNECTION_TIMEOUT,
            connector,
            link: Link::Idle,
        })
    }
}

impl std::fmt::Debug for EndpointBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointBuilder")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<hidden>")
            .field("kind", &self.kind)
            .field("via_tunnel", &self.via_tunnel)
            .finish_non_exhaustive()
    }
}
