//! Serde representation of an endpoint, for inventories and config files.

use secrecy::SecretString;
use serde::Deserialize;

use super::builder::EndpointBuilder;
use super::validate::DEFAULT_PORT;
use crate::platform::DeviceKind;

/// Construction inputs of an [`Endpoint`](super::Endpoint).
///
/// `port` accepts a number or a string; a non-numeric port is kept as given
/// and replaced by the default at connect time.
///
/// ```json
/// {"address": "10.0.0.7", "port": 22, "username": "admin",
///  "password": "secret", "kind": "pss", "via_tunnel": false}
/// ```
#[derive(Clone, Deserialize)]
pub struct EndpointConfig {
    pub address: String,

    #[serde(default = "default_port", deserialize_with = "port_from_any")]
    pub port: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: SecretString,

    pub kind: DeviceKind,

    #[serde(default)]
    pub via_tunnel: bool,
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn port_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u64),
        Text(String),
    }

    Ok(match RawPort::deserialize(deserializer)? {
        RawPort::Number(n) => n.to_string(),
        RawPort::Text(s) => s,
    })
}

impl EndpointConfig {
    /// A builder preloaded with this configuration.
    pub fn to_builder(&self) -> EndpointBuilder {
        let builder = EndpointBuilder::new(self.address.clone())
            .port(self.port.clone())
            .username(self.username.clone())
            .password(self.password.clone())
            .kind(self.kind)
            .via_tunnel(self.via_tunnel);
        match &self.name {
            Some(name) => builder.name(name.clone()),
            None => builder,
        }
    }
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<hidden>")
            .field("kind", &self.kind)
            .field("via_tunnel", &self.via_tunnel)
            .finish()
    }
}
