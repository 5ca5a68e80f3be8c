//! OSE shell dialect.
//!
//! The transport logs in with the caller's credentials and lands on a Linux
//! shell. `ose` starts the OSE shell, a couple of blank lines flush its
//! banner, and the `ACT-OSE $` prompt marks it ready.
//!
//! ```text
//! root@shelf-1# ose
//!
//! ACT-OSE $
//! ```
//!
//! Commands started in the OSE shell may keep running after printing their
//! output, so every command is followed by an interrupt.

use super::PROMPT;
use crate::error::PlatformError;
use crate::platform::{DeviceKind, Dialect, Execution, PatternSet};

/// Create the OSE shell dialect.
pub fn dialect() -> Result<Dialect, PlatformError> {
    Ok(Dialect::new(
        DeviceKind::NestedOseShell,
        Execution::Interactive,
        PatternSet::new(PROMPT)?,
    )
    .with_initial_prompt()
    .with_enter_mode(&["ose", "\n \n"])
    .with_interrupt_after_command())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::CredentialPolicy;

    #[test]
    fn test_ose_dialect() {
        let dialect = dialect().unwrap();
        assert_eq!(dialect.credentials, CredentialPolicy::Caller);
        assert!(dialect.await_initial_prompt);
        assert_eq!(dialect.enter_mode, vec!["ose", "\n \n"]);
        assert!(dialect.interrupt_after_command);
        assert!(dialect.patterns.username.is_none());
        assert!(dialect.wraps_commands());
    }

    #[test]
    fn test_ose_prompt_match() {
        let dialect = dialect().unwrap();
        assert!(dialect.patterns.prompt.is_match(b"ACT-OSE $ "));
        assert!(dialect.patterns.prompt.is_match(b"root@shelf-1# "));
        assert!(!dialect.patterns.prompt.is_match(b"OSE $ "));
    }
}
