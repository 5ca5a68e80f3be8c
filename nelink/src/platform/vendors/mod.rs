//! Built-in dialects.
//!
//! The recognizers below are shared by most dialects; each vendor module
//! picks the steps its devices need.

pub mod cli;
pub mod linux;
pub mod ose;

/// Command prompt of the vendor CLIs and of the OSE shell.
pub const PROMPT: &str = r"([\w\-\#\+\%\/\(\d\)\[\d\]]+#\s)|(ACT-OSE \$)";

/// Identity prompt.
pub const USERNAME: &str = r"(?i)(user( ?name)?)\s?:";

/// Secret prompt.
pub const PASSWORD: &str = r"(?i)(pass( ?word)?)\s?:";

/// Yes/no banner shown after a successful login.
pub const AGREEMENT: &str = r"\(\s?(?i:yes|y)\s?\/\s?(?i:no|n)\s?\)\s?[:?]?";

/// Explicit login rejection.
pub const AUTH_FAILURE: &str = r"(?i)(failed\.)";

/// `A:user@name# ` router prompt.
pub const LEGACY_PROMPT: &str = r"(\w+\:\w+\@[\w\-\#\+\%\/\(\d\)\[\d\]]+#\s)";

/// Router prompt with the device name captured.
pub const LEGACY_PROMPT_NAME: &str = r"\w+:\w+@(?P<name>[\w\-\#\+\%\/\(\d\)\[\d\]]+)#\s";
