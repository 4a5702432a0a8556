// ── CSV input ──
//
// Reads an uploaded device sheet into rows for the normalizer. Content
// problems that make the whole file untrustworthy (not UTF-8, not CSV,
// no serial column) reject the batch; an empty file is simply no rows.

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::normalize::{Row, columns};

const UTF8_BOM: char = '\u{feff}';

/// Parse raw file bytes. A leading UTF-8 BOM is ignored.
pub fn parse_csv_bytes(bytes: &[u8]) -> Result<Vec<Row>, CoreError> {
    let content = std::str::from_utf8(bytes).map_err(|e| CoreError::MalformedInput {
        reason: format!("file is not UTF-8 text: {e}"),
    })?;
    parse_csv(content)
}

/// Parse CSV text with a header row into column-keyed rows.
pub fn parse_csv(content: &str) -> Result<Vec<Row>, CoreError> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    if content.trim().is_empty() {
        warn!("input is empty, nothing to process");
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == columns::SERIAL) {
        return Err(CoreError::MalformedInput {
            reason: format!("header row has no '{}' column", columns::SERIAL),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(column, value)| (column.to_owned(), value.to_owned()))
            .collect();
        rows.push(row);
    }

    debug!(rows = rows.len(), "parsed CSV input");
    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_keyed_rows() {
        let rows = parse_csv(
            "deviceSerial,deviceName,w1Vlan\n\
             abcd-1234-wxyz,Lobby,10\n\
             q2aa-bbbb-cccc,\"Back, Office\",\n",
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["deviceSerial"], "abcd-1234-wxyz");
        assert_eq!(rows[1]["deviceName"], "Back, Office");
        assert_eq!(rows[1]["w1Vlan"], "");
    }

    #[test]
    fn strips_utf8_bom() {
        let rows = parse_csv_bytes(b"\xef\xbb\xbfdeviceSerial,deviceName\nabcd-1234-wxyz,Lobby\n").unwrap();
        assert_eq!(rows[0]["deviceSerial"], "abcd-1234-wxyz");
    }

    #[test]
    fn header_whitespace_is_trimmed() {
        let rows = parse_csv("deviceSerial , deviceName\nabcd-1234-wxyz,Lobby\n").unwrap();
        assert_eq!(rows[0]["deviceName"], "Lobby");
    }

    #[test]
    fn empty_input_is_no_rows() {
        assert!(parse_csv("").unwrap().is_empty());
        assert!(parse_csv("\u{feff}\n  \n").unwrap().is_empty());
    }

    #[test]
    fn header_only_is_no_rows() {
        assert!(parse_csv("deviceSerial,deviceName\n").unwrap().is_empty());
    }

    #[test]
    fn missing_serial_column_is_malformed() {
        let err = parse_csv("name,notes\nLobby,x\n").unwrap_err();
        assert!(matches!(err, CoreError::MalformedInput { .. }), "{err:?}");
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let err = parse_csv("deviceSerial,deviceName\nabcd-1234-wxyz,Lobby,extra\n").unwrap_err();
        assert!(err.is_input_error(), "{err:?}");
    }

    #[test]
    fn binary_content_is_malformed() {
        let err = parse_csv_bytes(&[0xff, 0xfe, 0x00, 0x41]).unwrap_err();
        assert!(matches!(err, CoreError::MalformedInput { .. }), "{err:?}");
    }
}
