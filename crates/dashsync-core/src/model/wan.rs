// ── WAN uplink configuration ──
//
// Payload shapes for the `managementInterface` endpoint. `wanEnabled` and
// `usingStaticIp` are always serialized; every other field is optional.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::device::overlay;

/// Administrative state of a WAN uplink.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum WanEnabled {
    #[serde(rename = "enabled")]
    #[strum(serialize = "enabled")]
    Enabled,
    #[serde(rename = "disabled")]
    #[strum(serialize = "disabled")]
    Disabled,
    #[default]
    #[serde(rename = "not configured")]
    #[strum(serialize = "not configured")]
    NotConfigured,
}

/// Which uplink a [`WanConfig`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WanPort {
    Wan1,
    Wan2,
}

impl WanPort {
    pub const ALL: [Self; 2] = [Self::Wan1, Self::Wan2];

    /// Key of this uplink in the endpoint payload.
    pub fn key(self) -> &'static str {
        match self {
            Self::Wan1 => "wan1",
            Self::Wan2 => "wan2",
        }
    }

    /// Prefix of this uplink's CSV columns (`w1Enabled`, `w2Vlan`, ...).
    pub fn column_prefix(self) -> &'static str {
        match self {
            Self::Wan1 => "w1",
            Self::Wan2 => "w2",
        }
    }
}

/// Settings for a single WAN uplink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WanConfig {
    #[serde(default)]
    pub wan_enabled: WanEnabled,
    #[serde(default)]
    pub using_static_ip: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_subnet_mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_gateway_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<u16>,
}

impl WanConfig {
    /// `true` when nothing beyond the two always-present defaults is set.
    ///
    /// Empty configs would only produce no-op WAN updates and are dropped.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overlay a later config. Default `wanEnabled` / `usingStaticIp` values
    /// count as unset and never replace an explicit earlier value.
    pub fn merge(&mut self, later: Self) {
        if later.wan_enabled != WanEnabled::NotConfigured {
            self.wan_enabled = later.wan_enabled;
        }
        if later.using_static_ip {
            self.using_static_ip = true;
        }
        overlay(&mut self.static_ip, later.static_ip);
        overlay(&mut self.static_subnet_mask, later.static_subnet_mask);
        overlay(&mut self.static_gateway_ip, later.static_gateway_ip);
        overlay(&mut self.static_dns, later.static_dns);
        overlay(&mut self.vlan, later.vlan);
    }
}

/// WAN fragment of a device: up to two uplinks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceWan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wan1: Option<WanConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wan2: Option<WanConfig>,
}

impl DeviceWan {
    pub fn port(&self, port: WanPort) -> Option<&WanConfig> {
        match port {
            WanPort::Wan1 => self.wan1.as_ref(),
            WanPort::Wan2 => self.wan2.as_ref(),
        }
    }

    pub fn set_port(&mut self, port: WanPort, config: Option<WanConfig>) {
        match port {
            WanPort::Wan1 => self.wan1 = config,
            WanPort::Wan2 => self.wan2 = config,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wan1.is_none() && self.wan2.is_none()
    }

    pub fn merge(&mut self, later: Self) {
        merge_port(&mut self.wan1, later.wan1);
        merge_port(&mut self.wan2, later.wan2);
    }
}

fn merge_port(slot: &mut Option<WanConfig>, later: Option<WanConfig>) {
    match (slot.as_mut(), later) {
        (Some(current), Some(later)) => current.merge(later),
        (None, Some(later)) => *slot = Some(later),
        (_, None) => {}
    }
}
