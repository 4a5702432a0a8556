// ── Core error types ──
//
// Errors surfaced by dashsync-core. Per-row and per-field problems are
// never errors (they are logged and skipped); these cover whole-batch
// failures and the per-device failures recorded in a reconcile report.
// `From<dashsync_api::Error>` translates transport-layer errors.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid serial '{value}': expected a XXXX-XXXX-XXXX token")]
    InvalidSerial { value: String },

    // ── Queue errors ─────────────────────────────────────────────────
    #[error("Queue message error: {0}")]
    Queue(#[from] serde_json::Error),

    // ── Remote errors ────────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Cannot connect to dashboard at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited; gave up after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Returns `true` for errors caused by the input file rather than the remote.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput { .. } | Self::Csv(_) | Self::InvalidSerial { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dashsync_api::Error> for CoreError {
    fn from(err: dashsync_api::Error) -> Self {
        match err {
            dashsync_api::Error::InvalidApiKey => CoreError::AuthenticationFailed {
                message: "Invalid API key".into(),
            },
            dashsync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            dashsync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            dashsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            dashsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            dashsync_api::Error::RateLimited { retry_after_secs } => CoreError::Api {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                status: Some(429),
            },
            dashsync_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            dashsync_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Unexpected response body: {message}"),
                status: None,
            },
        }
    }
}
