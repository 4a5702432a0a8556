// ── Device serial ──
//
// Every fragment, queue message, and API call is keyed by the canonical
// serial. Raw CSV values are searched for the 4-4-4 token and upper-cased.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

static SERIAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[A-Za-z0-9]{4}-){2}[A-Za-z0-9]{4}").expect("serial pattern is valid")
});

/// Canonical device serial, e.g. `Q2AB-CD34-EF56`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Serial(String);

impl Serial {
    /// Search `raw` for a serial token and return it upper-cased.
    ///
    /// Surrounding text is ignored, so `"sn: q2ab-cd34-ef56"` yields
    /// `Q2AB-CD34-EF56`.
    pub fn find(raw: &str) -> Option<Self> {
        SERIAL_PATTERN
            .find(raw)
            .map(|m| Self(m.as_str().to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Serial {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::find(s).ok_or_else(|| CoreError::InvalidSerial { value: s.to_owned() })
    }
}

impl TryFrom<String> for Serial {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Serial> for String {
    fn from(serial: Serial) -> Self {
        serial.0
    }
}

impl AsRef<str> for Serial {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serial_is_upper_cased() {
        let serial = Serial::find("abcd-1234-wxyz").unwrap();
        assert_eq!(serial.as_str(), "ABCD-1234-WXYZ");
    }

    #[test]
    fn serial_found_inside_surrounding_text() {
        let serial = Serial::find("  SN: q2xx-aaaa-bbbb (lobby)").unwrap();
        assert_eq!(serial.to_string(), "Q2XX-AAAA-BBBB");
    }

    #[test]
    fn serial_rejects_short_groups() {
        assert!(Serial::find("abc-1234-wxyz").is_none());
        assert!(Serial::find("abcd-1234").is_none());
        assert!(Serial::find("").is_none());
    }

    #[test]
    fn serial_rejects_non_alphanumeric() {
        assert!(Serial::find("ab_d-1234-wxyz").is_none());
    }

    #[test]
    fn serial_from_str_reports_value() {
        let err = "not-a-serial".parse::<Serial>().unwrap_err();
        assert!(err.to_string().contains("not-a-serial"));
    }

    #[test]
    fn serial_serde_round_trip_canonicalizes() {
        let serial: Serial = serde_json::from_str("\"abcd-1234-wxyz\"").unwrap();
        assert_eq!(serde_json::to_string(&serial).unwrap(), "\"ABCD-1234-WXYZ\"");
    }
}
