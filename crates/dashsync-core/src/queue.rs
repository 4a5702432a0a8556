// ── Queue codec and local spool ──
//
// A queued message carries one fragment keyed by serial, as a JSON string,
// with its logical channel beside it. The spool is a JSON-lines file that
// stands in for a managed queue between `enqueue` and `reconcile`.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use dashsync_api::JsonObject;

use crate::error::CoreError;
use crate::model::{DeviceConfig, DeviceIdentity, DeviceWan, Serial};

/// Logical message group. Identity and WAN fragments travel separately.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Channel {
    DeviceInfo,
    DeviceWan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub channel: Channel,
    /// JSON object `{ "<serial>": <fragment> }`, encoded as a string.
    pub body: String,
}

impl QueueMessage {
    pub fn identity(identity: &DeviceIdentity) -> Result<Self, CoreError> {
        Self::encode(Channel::DeviceInfo, &identity.serial, identity)
    }

    pub fn wan(serial: &Serial, wan: &DeviceWan) -> Result<Self, CoreError> {
        Self::encode(Channel::DeviceWan, serial, wan)
    }

    /// Split a normalized row into one message per fragment it carries.
    pub fn from_config(config: &DeviceConfig) -> Result<Vec<Self>, CoreError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(identity) = &config.identity {
            messages.push(Self::identity(identity)?);
        }
        if let Some(wan) = &config.wan {
            messages.push(Self::wan(&config.serial, wan)?);
        }
        Ok(messages)
    }

    fn encode<T: Serialize>(channel: Channel, serial: &Serial, fragment: &T) -> Result<Self, CoreError> {
        let mut body = JsonObject::new();
        body.insert(serial.to_string(), serde_json::to_value(fragment)?);
        Ok(Self {
            channel,
            body: serde_json::to_string(&body)?,
        })
    }

    /// Decode the body into `(serial key, fragment)` pairs.
    ///
    /// Keys are returned as written; the caller validates them.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<Vec<(String, T)>, CoreError> {
        let body: JsonObject = serde_json::from_str(&self.body)?;
        body.into_iter()
            .map(|(key, value)| Ok((key, serde_json::from_value(value)?)))
            .collect()
    }
}

// ── Spool ────────────────────────────────────────────────────────────

/// JSON-lines file of [`QueueMessage`]s.
#[derive(Debug, Clone)]
pub struct Spool {
    path: PathBuf,
}

impl Spool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append messages, creating the file and its parent directory as needed.
    pub fn append(&self, messages: &[QueueMessage]) -> Result<usize, CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        for message in messages {
            let line = serde_json::to_string(message)?;
            writeln!(file, "{line}")?;
        }
        file.flush()?;

        debug!(path = %self.path.display(), count = messages.len(), "appended to spool");
        Ok(messages.len())
    }

    /// Read every message. A missing spool is empty; undecodable lines are
    /// logged and skipped.
    pub fn read(&self) -> Result<Vec<QueueMessage>, CoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut messages = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(message) => messages.push(message),
                Err(e) => warn!(line = index + 1, error = %e, "skipping undecodable spool entry"),
            }
        }
        Ok(messages)
    }

    /// Drop every message. A missing spool is already clear.
    pub fn clear(&self) -> Result<(), CoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{WanConfig, WanEnabled};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn serial() -> Serial {
        "ABCD-1234-WXYZ".parse().unwrap()
    }

    fn config() -> DeviceConfig {
        let mut identity = DeviceIdentity::new(serial());
        identity.name = Some("Lobby".into());
        DeviceConfig {
            serial: serial(),
            identity: Some(identity),
            wan: Some(DeviceWan {
                wan1: Some(WanConfig {
                    wan_enabled: WanEnabled::Enabled,
                    vlan: Some(100),
                    ..WanConfig::default()
                }),
                wan2: None,
            }),
        }
    }

    #[test]
    fn each_fragment_gets_its_own_channel() {
        let messages = QueueMessage::from_config(&config()).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].channel, Channel::DeviceInfo);
        assert_eq!(messages[1].channel, Channel::DeviceWan);

        let identity: Value = serde_json::from_str(&messages[0].body).unwrap();
        assert_eq!(
            identity,
            json!({ "ABCD-1234-WXYZ": { "serial": "ABCD-1234-WXYZ", "name": "Lobby" } })
        );
        let wan: Value = serde_json::from_str(&messages[1].body).unwrap();
        assert_eq!(
            wan,
            json!({ "ABCD-1234-WXYZ": {
                "wan1": { "wanEnabled": "enabled", "usingStaticIp": false, "vlan": 100 }
            } })
        );
    }

    #[test]
    fn identity_only_row_yields_one_message() {
        let mut config = config();
        config.wan = None;
        let messages = QueueMessage::from_config(&config).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].channel, Channel::DeviceInfo);
    }

    #[test]
    fn message_envelope_wire_shape() {
        let message = QueueMessage {
            channel: Channel::DeviceWan,
            body: "{}".into(),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({ "channel": "DeviceWan", "body": "{}" })
        );
    }

    #[test]
    fn decode_returns_keyed_fragments() {
        let message = QueueMessage::wan(&serial(), config().wan.as_ref().unwrap()).unwrap();
        let decoded: Vec<(String, DeviceWan)> = message.decode().unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].0, "ABCD-1234-WXYZ");
        assert_eq!(decoded[0].1.wan1.as_ref().unwrap().vlan, Some(100));
    }

    #[test]
    fn decode_rejects_non_object_body() {
        let message = QueueMessage {
            channel: Channel::DeviceInfo,
            body: "[1, 2]".into(),
        };
        assert!(message.decode::<DeviceIdentity>().is_err());
    }

    #[test]
    fn spool_appends_reads_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let spool = Spool::new(dir.path().join("nested").join("queue.jsonl"));

        assert!(spool.read().unwrap().is_empty());

        let messages = QueueMessage::from_config(&config()).unwrap();
        assert_eq!(spool.append(&messages).unwrap(), 2);
        assert_eq!(spool.append(&messages[..1]).unwrap(), 1);

        let read = spool.read().unwrap();
        assert_eq!(read.len(), 3);
        assert_eq!(read[0], messages[0]);
        assert_eq!(read[2], messages[0]);

        spool.clear().unwrap();
        assert!(spool.read().unwrap().is_empty());
        spool.clear().unwrap();
    }

    #[test]
    fn spool_skips_garbage_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.jsonl");
        fs::write(
            &path,
            "not json\n\n{\"channel\":\"DeviceInfo\",\"body\":\"{}\"}\n{\"channel\":\"Nope\",\"body\":\"{}\"}\n",
        )
        .unwrap();

        let read = Spool::new(&path).read().unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].channel, Channel::DeviceInfo);
    }
}
