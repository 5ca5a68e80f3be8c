//! Channel layer: prompt recognition over the interactive shell stream.
//!
//! This module holds the accumulating pattern buffer, the stream scanner that
//! races recognizers against a deadline, and the shell channel handle the
//! session engine sends and expects through.

mod buffer;
mod patterns;
mod scanner;
mod shell;

pub use buffer::{MAX_EXCERPT_LEN, PatternBuffer, excerpt};
pub use patterns::Expectation;
pub use scanner::{ScanMatch, StreamScanner};
pub use shell::{ChannelControl, PtyRequest, RemoteShell, ShellChannel, Signal};
