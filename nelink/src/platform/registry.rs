//! Dialect lookup table keyed by device kind.

use std::sync::LazyLock;

use indexmap::IndexMap;

use super::definition::Dialect;
use super::kind::DeviceKind;
use super::vendors;
use crate::error::PlatformError;

/// Built-in dialects, compiled once on first use.
static REGISTRY: LazyLock<Result<IndexMap<DeviceKind, Dialect>, PlatformError>> =
    LazyLock::new(builtin_dialects);

fn builtin_dialects() -> Result<IndexMap<DeviceKind, Dialect>, PlatformError> {
    let dialects = [
        vendors::linux::dialect()?,
        vendors::cli::vendor_a()?,
        vendors::cli::vendor_b()?,
        vendors::cli::vendor_c()?,
        vendors::cli::vendor_d()?,
        vendors::cli::vendor_e()?,
        vendors::ose::dialect()?,
    ];
    Ok(dialects
        .into_iter()
        .map(|dialect| (dialect.kind, dialect))
        .collect())
}

/// Look up the dialect for a device kind.
pub fn dialect(kind: DeviceKind) -> Result<&'static Dialect, PlatformError> {
    let table = REGISTRY
        .as_ref()
        .map_err(|e| PlatformError::InvalidDefinition {
            message: e.to_string(),
        })?;
    table
        .get(&kind)
        .ok_or_else(|| PlatformError::InvalidDefinition {
            message: format!("no dialect registered for '{kind}'"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_dialect() {
        for kind in DeviceKind::ALL {
            let dialect = dialect(kind).unwrap();
            assert_eq!(dialect.kind, kind);
        }
    }

    #[test]
    fn test_lookup_returns_same_instance() {
        let a = dialect(DeviceKind::VendorCliA).unwrap();
        let b = dialect(DeviceKind::VendorCliA).unwrap();
        assert!(std::ptr::eq(a, b));
    }
}
