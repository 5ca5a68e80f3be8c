//! Vendor CLI dialects.
//!
//! All of them authenticate the SSH transport with the `cli` service account
//! and then run their own login on the shell.
//!
//! # Prompt Examples
//!
//! ```text
//! Username: admin                  # identity
//! Password:                        # secret
//! Do you acknowledge? (Y/N)?       # agreement banner (A, C, E)
//! NODE-7#                          # command prompt
//! gmre[1]#                         # nested control plane shell (C)
//! A:admin@node-9#                  # router prompt (D)
//! ```

use super::{AGREEMENT, AUTH_FAILURE, LEGACY_PROMPT, LEGACY_PROMPT_NAME, PASSWORD, PROMPT, USERNAME};
use crate::error::PlatformError;
use crate::platform::{CredentialPolicy, DeviceKind, Dialect, Execution, NestedLogin, PatternSet};

/// Account the SSH transport authenticates with.
const SERVICE_ACCOUNT: CredentialPolicy = CredentialPolicy::ServiceAccount {
    username: "cli",
    password: "cli",
};

/// Turns off `--More--` paging for the session.
const PAGING_DISABLE: &str = "paging status disable";

/// Leaves the nested shell or the current CLI context.
const QUIT: &str = "quit\r";

fn login_patterns() -> Result<PatternSet, PlatformError> {
    PatternSet::new(PROMPT)?
        .with_credentials(USERNAME, PASSWORD)?
        .with_auth_failure(AUTH_FAILURE)
}

fn cli_dialect(kind: DeviceKind, patterns: PatternSet) -> Dialect {
    Dialect::new(kind, Execution::Interactive, patterns)
        .with_credentials(SERVICE_ACCOUNT)
        .with_paging_command(PAGING_DISABLE)
        .with_ready_check()
}

/// Photonic switch CLI.
pub fn vendor_a() -> Result<Dialect, PlatformError> {
    Ok(cli_dialect(
        DeviceKind::VendorCliA,
        login_patterns()?.with_agreement(AGREEMENT)?,
    ))
}

/// Packet switch CLI. No agreement banner; every command is followed by
/// `quit` to leave whatever context it opened.
pub fn vendor_b() -> Result<Dialect, PlatformError> {
    Ok(cli_dialect(DeviceKind::VendorCliB, login_patterns()?).with_exit_command(QUIT))
}

/// Control plane shell reached from the photonic switch CLI with
/// `tools gmre`. Logged into and out of around every command.
pub fn vendor_c() -> Result<Dialect, PlatformError> {
    Ok(cli_dialect(
        DeviceKind::VendorCliC,
        login_patterns()?.with_agreement(AGREEMENT)?,
    )
    .with_nested_login(NestedLogin {
        enter_command: "tools gmre",
        username: "gmre\r",
        password: "gmre\r",
    })
    .with_command_suffix("\r")
    .with_exit_command(QUIT))
}

/// Router CLI. The service account lands directly on the prompt, which also
/// carries the device name.
pub fn vendor_d() -> Result<Dialect, PlatformError> {
    Dialect::new(
        DeviceKind::VendorCliD,
        Execution::Interactive,
        PatternSet::new(LEGACY_PROMPT)?,
    )
    .with_credentials(SERVICE_ACCOUNT)
    .with_initial_prompt()
    .with_name_discovery(LEGACY_PROMPT_NAME)
}

/// Photonic switch CLI, 23.6 release line. Same login as [`vendor_a`].
pub fn vendor_e() -> Result<Dialect, PlatformError> {
    Ok(cli_dialect(
        DeviceKind::VendorCliE,
        login_patterns()?.with_agreement(AGREEMENT)?,
    ))
}
