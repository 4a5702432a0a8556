// ── Row normalizer ──
//
// Turns one loosely typed CSV row into typed identity / WAN fragments.
// Pure: bad values are logged and omitted, never fatal, and the caller
// decides what to do with the result.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::model::{DeviceConfig, DeviceIdentity, DeviceWan, Serial, WanConfig, WanEnabled, WanPort};

/// One CSV row: column name to raw cell text.
pub type Row = HashMap<String, String>;

/// Recognized CSV column names.
pub mod columns {
    pub const SERIAL: &str = "deviceSerial";
    pub const NAME: &str = "deviceName";
    pub const TAGS: &str = "deviceTags";
    pub const NOTES: &str = "deviceNotes";
    pub const ADDRESS: &str = "deviceAddress";
    pub const LATITUDE: &str = "deviceLatitude";
    pub const LONGITUDE: &str = "deviceLongitude";

    // Per-uplink suffixes, prefixed with `w1` / `w2`.
    pub const WAN_ENABLED: &str = "Enabled";
    pub const WAN_STATIC: &str = "Static";
    pub const WAN_STATIC_IP: &str = "StaticIp";
    pub const WAN_SUBNET: &str = "Subnet";
    pub const WAN_GATEWAY: &str = "Gateway";
    pub const WAN_DNS: &str = "Dns";
    pub const WAN_VLAN: &str = "Vlan";
}

/// Highest valid 802.1Q VLAN id.
const VLAN_MAX: u16 = 4095;

// ── Tri-state flag ───────────────────────────────────────────────────

/// Result of reading a boolean-like cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    True,
    False,
    /// Spelling outside the accepted set; callers must not treat it as `False`.
    Undetermined,
}

impl Flag {
    /// Parse `yes/true/y/1` and `no/false/f/n/0`, case-insensitively.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "y" | "1" => Self::True,
            "no" | "false" | "f" | "n" | "0" => Self::False,
            _ => Self::Undetermined,
        }
    }
}

impl From<Flag> for WanEnabled {
    fn from(flag: Flag) -> Self {
        match flag {
            Flag::True => Self::Enabled,
            Flag::False => Self::Disabled,
            Flag::Undetermined => Self::NotConfigured,
        }
    }
}

// ── Cell helpers ─────────────────────────────────────────────────────

/// Trimmed cell value, or `None` when the column is absent or blank.
fn field(row: &Row, column: &str) -> Option<String> {
    row.get(column)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Split a comma-delimited cell into an ordered list. No deduplication.
/// A cell with no non-blank entries (`","`) yields `None`, never an empty
/// list that would clear the remote value.
fn split_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect();
    (!items.is_empty()).then_some(items)
}

/// Parse a VLAN id. Out-of-range or non-numeric values yield `None`.
pub fn parse_vlan(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u16>()
        .ok()
        .filter(|vlan| (1..=VLAN_MAX).contains(vlan))
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// ── Normalization ────────────────────────────────────────────────────

/// Normalize one row into its identity and WAN fragments.
///
/// Returns `None` when the row has no valid serial or nothing to update.
pub fn normalize(row: &Row) -> Option<DeviceConfig> {
    let Some(raw_serial) = field(row, columns::SERIAL) else {
        warn!("row has no {} value, skipping", columns::SERIAL);
        return None;
    };
    let Some(serial) = Serial::find(&raw_serial) else {
        warn!(value = %raw_serial, "no valid device serial found, skipping row");
        return None;
    };

    let identity = normalize_identity(row, &serial);
    let wan = normalize_wan(row);

    if identity.is_none() && wan.is_none() {
        debug!(serial = %serial, "no fields to update");
        return None;
    }

    Some(DeviceConfig {
        serial,
        identity,
        wan,
    })
}

/// Build the identity fragment, or `None` if only the serial would be set.
pub fn normalize_identity(row: &Row, serial: &Serial) -> Option<DeviceIdentity> {
    let mut identity = DeviceIdentity::new(serial.clone());

    identity.name = field(row, columns::NAME);
    identity.tags = field(row, columns::TAGS).and_then(|raw| split_list(&raw));
    identity.notes = field(row, columns::NOTES);
    identity.address = field(row, columns::ADDRESS);
    identity.lat = coordinate(row, columns::LATITUDE, serial);
    identity.lng = coordinate(row, columns::LONGITUDE, serial);

    if identity.has_changes() {
        Some(identity)
    } else {
        debug!(serial = %serial, "no device info fields to update");
        None
    }
}

fn coordinate(row: &Row, column: &str, serial: &Serial) -> Option<f64> {
    let raw = field(row, column)?;
    let value = parse_coordinate(&raw);
    if value.is_none() {
        debug!(serial = %serial, column, value = %raw, "ignoring non-numeric coordinate");
    }
    value
}

/// Build the WAN fragment, or `None` if neither uplink carries a setting.
pub fn normalize_wan(row: &Row) -> Option<DeviceWan> {
    let mut wan = DeviceWan::default();
    for port in WanPort::ALL {
        wan.set_port(port, normalize_port(row, port));
    }
    (!wan.is_empty()).then_some(wan)
}

fn normalize_port(row: &Row, port: WanPort) -> Option<WanConfig> {
    let prefix = port.column_prefix();
    let cell = |suffix: &str| field(row, &format!("{prefix}{suffix}"));

    let mut config = WanConfig::default();

    if let Some(raw) = cell(columns::WAN_ENABLED) {
        let flag = Flag::parse(&raw);
        if flag == Flag::Undetermined {
            debug!(port = port.key(), value = %raw, "undetermined enabled flag, treating as not configured");
        }
        config.wan_enabled = flag.into();
    }
    if let Some(raw) = cell(columns::WAN_STATIC) {
        config.using_static_ip = Flag::parse(&raw) == Flag::True;
    }
    config.static_ip = cell(columns::WAN_STATIC_IP);
    config.static_subnet_mask = cell(columns::WAN_SUBNET);
    config.static_gateway_ip = cell(columns::WAN_GATEWAY);
    config.static_dns = cell(columns::WAN_DNS).and_then(|raw| split_list(&raw));
    if let Some(raw) = cell(columns::WAN_VLAN) {
        config.vlan = parse_vlan(&raw);
        if config.vlan.is_none() {
            debug!(port = port.key(), value = %raw, "ignoring invalid VLAN");
        }
    }

    (!config.is_empty()).then_some(config)
}

/// Normalize every row, dropping the ones with nothing to send.
pub fn normalize_rows<'a>(rows: impl IntoIterator<Item = &'a Row>) -> Vec<DeviceConfig> {
    rows.into_iter().filter_map(normalize).collect()
}
