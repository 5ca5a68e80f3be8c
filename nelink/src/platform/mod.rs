//! Platform definitions for the supported device kinds.
//!
//! Each device kind maps to a [`Dialect`]: its prompt recognizers, which
//! login steps apply, and what wraps every command. The session engine runs
//! one shared procedure driven by this data.

mod definition;
mod kind;
mod registry;
pub mod vendors;

pub use definition::{
    CredentialPolicy, Dialect, Execution, NestedLogin, PatternSet, StepTimeouts,
};
pub use kind::DeviceKind;
pub use registry::dialect;
