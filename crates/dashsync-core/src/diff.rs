// ── Change-set builder ──
//
// Compares a desired fragment against the remote snapshot and keeps only
// what differs. The policy is deliberately conservative: a small real
// change may be skipped (false negative) rather than risk an update call
// triggered by default-field noise (false positive). The thresholds below
// decide which real updates get dropped; keep them exact.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use dashsync_api::{Endpoint, JsonObject};

use crate::model::{
    DeviceIdentity, DeviceWan, RemoteDeviceState, SERIAL_KEY, Serial, WanConfig, WanPort, to_object,
};

/// A WAN uplink is only sent when at least this many of its non-default
/// fields differ.
pub const WAN_FIELD_THRESHOLD: usize = 2;

/// A change set needs at least this many entries, the identifier included.
/// The identifier always counts once, whether it travels in the body
/// (identity endpoint) or only in the URL (WAN endpoint).
pub const MIN_CHANGE_SET_ENTRIES: usize = 2;

/// The minimal update for one device endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSet {
    pub serial: Serial,
    pub endpoint: Endpoint,
    pub body: JsonObject,
}

impl ChangeSet {
    /// Names of the changed top-level fields, identifier excluded.
    pub fn changed_fields(&self) -> Vec<String> {
        self.body
            .keys()
            .filter(|k| k.as_str() != SERIAL_KEY)
            .cloned()
            .collect()
    }
}

/// Diff an identity fragment against the `devices/{serial}` snapshot.
///
/// `serial` is always kept in the body because the update is routed by it,
/// but it never counts as a change.
pub fn diff_identity(desired: &DeviceIdentity, current: &RemoteDeviceState) -> Option<ChangeSet> {
    let mut body = JsonObject::new();

    for (key, value) in to_object(desired) {
        if key == SERIAL_KEY {
            body.insert(key, value);
            continue;
        }
        if current.get(&key).is_some_and(|remote| values_match(&value, remote)) {
            continue;
        }
        body.insert(key, value);
    }

    finish(desired.serial.clone(), Endpoint::Device, body)
}

/// Diff a WAN fragment against the `managementInterface` snapshot.
///
/// Each uplink is compared field by field with the remote uplink of the
/// same name and carries only its differing fields. Fields still at their
/// `WanConfig` default (`not configured`, `usingStaticIp: false`) were never
/// set by the row, so they are neither sent nor counted. Uplinks with fewer
/// than [`WAN_FIELD_THRESHOLD`] remaining differences are dropped.
pub fn diff_wan(
    serial: &Serial,
    desired: &DeviceWan,
    current: &RemoteDeviceState,
) -> Option<ChangeSet> {
    let defaults = to_object(&WanConfig::default());
    let mut body = JsonObject::new();

    for port in WanPort::ALL {
        let Some(wan) = desired.port(port) else {
            continue;
        };
        let remote = current.object(port.key());

        let changed: JsonObject = to_object(wan)
            .into_iter()
            .filter(|(key, value)| defaults.get(key) != Some(value))
            .filter(|(key, value)| {
                !remote
                    .and_then(|r| r.get(key))
                    .is_some_and(|r| values_match(value, r))
            })
            .collect();

        if changed.len() < WAN_FIELD_THRESHOLD {
            debug!(
                serial = %serial,
                port = port.key(),
                differing = changed.len(),
                "WAN uplink below change threshold, skipping"
            );
            continue;
        }
        body.insert(port.key().to_owned(), Value::Object(changed));
    }

    finish(serial.clone(), Endpoint::ManagementInterface, body)
}

fn finish(serial: Serial, endpoint: Endpoint, body: JsonObject) -> Option<ChangeSet> {
    let changes = body.keys().filter(|k| k.as_str() != SERIAL_KEY).count();
    if changes + 1 < MIN_CHANGE_SET_ENTRIES {
        debug!(serial = %serial, %endpoint, "no attributes to update");
        return None;
    }
    Some(ChangeSet {
        serial,
        endpoint,
        body,
    })
}

/// Structural equality where numbers compare by value (`37` == `37.0`).
fn values_match(desired: &Value, remote: &Value) -> bool {
    match (desired, remote) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() <= f64::EPSILON * a.abs().max(1.0),
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_match(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| values_match(v, w)))
        }
        _ => desired == remote,
    }
}
