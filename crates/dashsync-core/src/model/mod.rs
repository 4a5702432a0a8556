// ── Domain model ──
//
// Typed payload fragments produced by the normalizer and the read-only
// remote snapshot they are diffed against.

pub mod device;
pub mod serial;
pub mod wan;

use serde::Serialize;
use serde_json::Value;

use dashsync_api::JsonObject;

pub use device::{DeviceConfig, DeviceIdentity, SERIAL_KEY};
pub use serial::Serial;
pub use wan::{DeviceWan, WanConfig, WanEnabled, WanPort};

/// Current configuration of one device endpoint, as reported by the API.
///
/// A snapshot for a single reconciliation pass; never cached across passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteDeviceState(JsonObject);

impl RemoteDeviceState {
    pub fn new(fields: JsonObject) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Nested object under `key` (e.g. `wan1`), if present.
    pub fn object(&self, key: &str) -> Option<&JsonObject> {
        self.0.get(key).and_then(Value::as_object)
    }
}

impl From<JsonObject> for RemoteDeviceState {
    fn from(fields: JsonObject) -> Self {
        Self(fields)
    }
}

/// Serialize a payload struct into a JSON object.
///
/// Payload types are plain structs with string keys, so a non-object
/// result only happens for unit-like values and maps to an empty object.
pub(crate) fn to_object<T: Serialize>(value: &T) -> JsonObject {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => JsonObject::new(),
    }
}
