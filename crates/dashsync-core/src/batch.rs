// ── Per-batch context ──
//
// Folds a batch of fragments into one desired state per serial. Owned by a
// single reconcile invocation and dropped afterwards.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{DeviceConfig, DeviceIdentity, DeviceWan, Serial};
use crate::queue::{Channel, QueueMessage};

/// Desired identity and WAN state for every serial in a batch.
///
/// Fragments for the same serial merge in arrival order: later set fields
/// overwrite, later unset fields never clear earlier ones.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    arrival: IndexSet<Serial>,
    identities: IndexMap<Serial, DeviceIdentity>,
    wans: IndexMap<Serial, DeviceWan>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from queued messages.
    ///
    /// A message whose body does not decode is skipped with a warning; it
    /// never poisons the rest of the batch.
    pub fn from_messages<'a>(messages: impl IntoIterator<Item = &'a QueueMessage>) -> Self {
        let mut batch = Self::new();
        for message in messages {
            if let Err(e) = batch.push_message(message) {
                warn!(channel = %message.channel, error = %e, "skipping undecodable queue message");
            }
        }
        batch
    }

    pub fn from_configs(configs: impl IntoIterator<Item = DeviceConfig>) -> Self {
        let mut batch = Self::new();
        for config in configs {
            batch.push_config(config);
        }
        batch
    }

    pub fn push_message(&mut self, message: &QueueMessage) -> Result<(), CoreError> {
        match message.channel {
            Channel::DeviceInfo => {
                for (key, mut identity) in message.decode::<DeviceIdentity>()? {
                    let Some(serial) = canonical_key(&key) else {
                        continue;
                    };
                    identity.serial = serial;
                    self.push_identity(identity);
                }
            }
            Channel::DeviceWan => {
                for (key, wan) in message.decode::<DeviceWan>()? {
                    let Some(serial) = canonical_key(&key) else {
                        continue;
                    };
                    self.push_wan(serial, wan);
                }
            }
        }
        Ok(())
    }

    pub fn push_config(&mut self, config: DeviceConfig) {
        let serial = config.serial.clone();
        let (identity, wan) = config.into_parts();
        if let Some(identity) = identity {
            self.push_identity(identity);
        }
        if let Some(wan) = wan {
            self.push_wan(serial, wan);
        }
    }

    pub fn push_identity(&mut self, identity: DeviceIdentity) {
        self.arrival.insert(identity.serial.clone());
        match self.identities.get_mut(&identity.serial) {
            Some(existing) => {
                debug!(serial = %identity.serial, "merging identity fragment");
                existing.merge(identity);
            }
            None => {
                self.identities.insert(identity.serial.clone(), identity);
            }
        }
    }

    pub fn push_wan(&mut self, serial: Serial, wan: DeviceWan) {
        self.arrival.insert(serial.clone());
        match self.wans.get_mut(&serial) {
            Some(existing) => {
                debug!(serial = %serial, "merging WAN fragment");
                existing.merge(wan);
            }
            None => {
                self.wans.insert(serial, wan);
            }
        }
    }

    /// Distinct serials in first-seen order across both fragment kinds.
    pub fn serials(&self) -> Vec<Serial> {
        self.arrival.iter().cloned().collect()
    }

    pub fn identity(&self, serial: &Serial) -> Option<&DeviceIdentity> {
        self.identities.get(serial)
    }

    pub fn wan(&self, serial: &Serial) -> Option<&DeviceWan> {
        self.wans.get(serial)
    }

    pub fn is_empty(&self) -> bool {
        self.arrival.is_empty()
    }

    /// Number of distinct serials.
    pub fn len(&self) -> usize {
        self.arrival.len()
    }
}

fn canonical_key(key: &str) -> Option<Serial> {
    let serial = Serial::find(key);
    if serial.is_none() {
        warn!(key, "queue message keyed by an invalid serial, skipping");
    }
    serial
}
