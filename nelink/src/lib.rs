//! # nelink
//!
//! Async SSH session automation for network elements.
//!
//! nelink logs into a device over SSH, drives its command line by sending
//! lines and waiting for recognizable prompts, and collects the output of a
//! command list. Each device family is described by a data-only dialect:
//! which prompts to wait for, what to answer and in which order.
//!
//! ## Features
//!
//! - Async SSH connections via russh, optionally through a local tunnel
//! - Prompt scanning with deadlines that never lose shell output
//! - Credential rejection reported as such, not as a timeout
//! - Built-in dialects for a Linux shell, five vendor CLIs and a nested shell
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nelink::{DeviceKind, Endpoint};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nelink::Error> {
//!     let mut endpoint = Endpoint::builder("192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .kind(DeviceKind::VendorCliB)
//!         .build()?;
//!
//!     endpoint.connect().await?;
//!
//!     let outputs = endpoint.run(["show card"]).await?;
//!     println!("{}", outputs["show card"]);
//!
//!     endpoint.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod endpoint;
pub mod error;
pub mod platform;
pub mod session;
pub mod transport;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use endpoint::{Endpoint, EndpointBuilder, EndpointConfig};
pub use error::{Error, Result};
pub use platform::{DeviceKind, Dialect};
pub use session::{Command, Session, SessionState};
pub use transport::{AuthMethod, Connector, HostKeyVerification, SshConfig, Transport};
