//! Linux shell dialect.
//!
//! No interactive login at all: the SSH transport authenticates with the
//! caller's credentials and every command runs on its own exec channel.

use super::PROMPT;
use crate::error::PlatformError;
use crate::platform::{DeviceKind, Dialect, Execution, PatternSet};

/// Create the Linux shell dialect.
pub fn dialect() -> Result<Dialect, PlatformError> {
    Ok(Dialect::new(
        DeviceKind::ShellLinux,
        Execution::OneShot,
        PatternSet::new(PROMPT)?,
    ))
}
