// ── Device identity and per-row config ──

use serde::{Deserialize, Serialize};

use super::serial::Serial;
use super::wan::DeviceWan;

/// Wire name of the identifier field in identity payloads.
pub const SERIAL_KEY: &str = "serial";

/// Identity fields of a device (`devices/{serial}` endpoint).
///
/// Only `serial` is required. Unset fields mean "no intent to change" and
/// are omitted from the JSON payload, never sent as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub serial: Serial,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl DeviceIdentity {
    pub fn new(serial: Serial) -> Self {
        Self {
            serial,
            name: None,
            tags: None,
            notes: None,
            address: None,
            lat: None,
            lng: None,
        }
    }

    /// `true` when at least one field besides the serial is set.
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.tags.is_some()
            || self.notes.is_some()
            || self.address.is_some()
            || self.lat.is_some()
            || self.lng.is_some()
    }

    /// Overlay a later fragment: its set fields win, its unset fields
    /// leave ours untouched.
    pub fn merge(&mut self, later: Self) {
        overlay(&mut self.name, later.name);
        overlay(&mut self.tags, later.tags);
        overlay(&mut self.notes, later.notes);
        overlay(&mut self.address, later.address);
        overlay(&mut self.lat, later.lat);
        overlay(&mut self.lng, later.lng);
    }
}

pub(crate) fn overlay<T>(slot: &mut Option<T>, later: Option<T>) {
    if later.is_some() {
        *slot = later;
    }
}

/// Everything one CSV row asks for, keyed by serial.
///
/// Transient: built by the normalizer, split into queue messages, and
/// consumed by the reconciler. At least one of the two fragments is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceConfig {
    pub serial: Serial,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<DeviceIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan: Option<DeviceWan>,
}

impl DeviceConfig {
    pub fn into_parts(self) -> (Option<DeviceIdentity>, Option<DeviceWan>) {
        (self.identity, self.wan)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn serial() -> Serial {
        "Q2AA-BBBB-CCCC".parse().unwrap()
    }

    #[test]
    fn unset_fields_are_omitted() {
        let mut identity = DeviceIdentity::new(serial());
        identity.name = Some("Lobby".into());

        assert_eq!(
            serde_json::to_value(&identity).unwrap(),
            json!({ "serial": "Q2AA-BBBB-CCCC", "name": "Lobby" })
        );
    }

    #[test]
    fn serial_alone_has_no_changes() {
        assert!(!DeviceIdentity::new(serial()).has_changes());
    }

    #[test]
    fn merge_prefers_later_set_fields() {
        let mut earlier = DeviceIdentity::new(serial());
        earlier.name = Some("Old".into());
        earlier.notes = Some("keep me".into());

        let mut later = DeviceIdentity::new(serial());
        later.name = Some("New".into());
        later.tags = Some(vec!["a".into()]);

        earlier.merge(later);

        assert_eq!(earlier.name.as_deref(), Some("New"));
        assert_eq!(earlier.notes.as_deref(), Some("keep me"));
        assert_eq!(earlier.tags, Some(vec!["a".to_owned()]));
    }
}
