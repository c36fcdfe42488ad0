use crate::protocol::{PID, VID};

/// Driver settings. `Default` targets the NOLO CV1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Applied to the hidapi context on macOS only. Off by default.
    pub open_exclusive: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            vendor_id: VID,
            product_id: PID,
            open_exclusive: false,
        }
    }
}

impl DriverConfig {
    /// Defaults overridden by `NOLO_VENDOR_ID`, `NOLO_PRODUCT_ID` and
    /// `NOLO_OPEN_EXCLUSIVE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            vendor_id: read_hex_u16(&lookup, "NOLO_VENDOR_ID", defaults.vendor_id),
            product_id: read_hex_u16(&lookup, "NOLO_PRODUCT_ID", defaults.product_id),
            open_exclusive: read_bool(&lookup, "NOLO_OPEN_EXCLUSIVE", defaults.open_exclusive),
        }
    }
}

fn read_bool<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        other => {
            log::warn!("Ignoring {}='{}', using {}", name, other, default);
            default
        }
    }
}

fn read_hex_u16<F>(lookup: &F, name: &str, default: u16) -> u16
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return default;
    };
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    match u16::from_str_radix(digits, 16) {
        Ok(v) => v,
        Err(_) => {
            log::warn!("Ignoring {}='{}', using 0x{:04X}", name, trimmed, default);
            default
        }
    }
}
