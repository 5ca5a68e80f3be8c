//! Endpoint input checks run at connect time.

use std::time::Duration;

use log::warn;

use crate::error::ValidationError;

/// Port used when the given one is unusable.
pub const DEFAULT_PORT: u16 = 22;

/// Budget for dialing and authenticating the transport.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Check that `address` is four dot-separated decimal octets.
pub fn address(address: &str) -> Result<(), ValidationError> {
    let octets: Vec<&str> = address.split('.').collect();
    if octets.len() != 4 {
        return Err(ValidationError::InvalidAddress {
            address: address.to_string(),
            reason: "ip address is not formatted properly".to_string(),
        });
    }

    for octet in octets {
        let valid = !octet.is_empty()
            && octet.bytes().all(|b| b.is_ascii_digit())
            && octet.parse::<u8>().is_ok();
        if !valid {
            return Err(ValidationError::InvalidAddress {
                address: address.to_string(),
                reason: format!("ip address includes wrong values: {octet}"),
            });
        }
    }
    Ok(())
}

/// Parse `port`, falling back to [`DEFAULT_PORT`] with a warning.
pub fn port(port: &str) -> u16 {
    match port.trim().parse::<u16>() {
        Ok(p) if p != 0 => p,
        _ => {
            warn!("provided port: {} - wrong port number, defaulting to {}", port, DEFAULT_PORT);
            DEFAULT_PORT
        }
    }
}
