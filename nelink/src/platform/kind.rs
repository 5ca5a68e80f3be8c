//! Device kind selectors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The login and prompt dialect an endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceKind {
    /// Plain Linux shell, one exec channel per command.
    ShellLinux,
    /// Photonic switch CLI with the agreement banner.
    VendorCliA,
    /// Packet switch CLI, left with `quit` after every command.
    VendorCliB,
    /// Control plane shell nested inside the photonic switch CLI.
    VendorCliC,
    /// Router CLI with `A:user@name#` prompts.
    VendorCliD,
    /// Photonic switch CLI, 23.6 release line.
    VendorCliE,
    /// OSE shell entered from a Linux login.
    NestedOseShell,
}

impl DeviceKind {
    /// Every kind, in declaration order.
    pub const ALL: [DeviceKind; 7] = [
        DeviceKind::ShellLinux,
        DeviceKind::VendorCliA,
        DeviceKind::VendorCliB,
        DeviceKind::VendorCliC,
        DeviceKind::VendorCliD,
        DeviceKind::VendorCliE,
        DeviceKind::NestedOseShell,
    ];

    /// Short selector used on the command line and in configuration files.
    pub fn selector(&self) -> &'static str {
        match self {
            DeviceKind::ShellLinux => "bash",
            DeviceKind::VendorCliA => "pss",
            DeviceKind::VendorCliB => "psd",
            DeviceKind::VendorCliC => "gmre",
            DeviceKind::VendorCliD => "sros",
            DeviceKind::VendorCliE => "pss23.6",
            DeviceKind::NestedOseShell => "ose",
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            DeviceKind::ShellLinux => "shell_linux",
            DeviceKind::VendorCliA => "vendor_cli_a",
            DeviceKind::VendorCliB => "vendor_cli_b",
            DeviceKind::VendorCliC => "vendor_cli_c",
            DeviceKind::VendorCliD => "vendor_cli_d",
            DeviceKind::VendorCliE => "vendor_cli_e",
            DeviceKind::NestedOseShell => "nested_ose_shell",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for DeviceKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DeviceKind::ALL
            .into_iter()
            .find(|kind| {
                kind.selector().eq_ignore_ascii_case(wanted)
                    || kind.variant_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ValidationError::UnknownDeviceKind {
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for DeviceKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeviceKind> for String {
    fn from(kind: DeviceKind) -> Self {
        kind.selector().to_string()
    }
}
