//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use dashsync_config::ConfigError;
use dashsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const INPUT: i32 = 4;
    pub const RATE_LIMIT: i32 = 5;
    pub const PARTIAL: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the dashboard at {url}")]
    #[diagnostic(
        code(dashsync::connection_failed),
        help(
            "Check network access to the API.\n\
             URL: {url}\n\
             Override it with --api-url or the profile's api_url."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(dashsync::timeout),
        help("Increase the timeout with --timeout or the profile's timeout.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(dashsync::auth_failed),
        help(
            "Verify the API key and that API access is enabled for the organization.\n\
             Pass it with --api-key, DASHSYNC_API_KEY, or the profile's api_key_env."
        )
    )]
    AuthFailed { message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(dashsync::no_credentials),
        help(
            "Set DASHSYNC_API_KEY, pass --api-key, or add api_key_env to the profile.\n\
             Config file: dashsync config path"
        )
    )]
    NoCredentials { profile: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Malformed input: {reason}")]
    #[diagnostic(
        code(dashsync::malformed_input),
        help("Expected a UTF-8 CSV with a header row containing 'deviceSerial'.")
    )]
    MalformedInput { reason: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dashsync::validation))]
    Validation { field: String, reason: String },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("API error ({status}): {message}")]
    #[diagnostic(code(dashsync::api_error))]
    Api { status: String, message: String },

    #[error("Rate limited; gave up after {attempts} attempts")]
    #[diagnostic(
        code(dashsync::rate_limited),
        help("Raise max_retries in the profile or retry later.")
    )]
    RateLimited { attempts: u32 },

    #[error("{failed} of {total} device updates failed")]
    #[diagnostic(
        code(dashsync::partial_failure),
        help("Failed devices are listed in the report; rerun with -v for details.")
    )]
    PartialFailure { failed: usize, total: usize },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dashsync::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(dashsync::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Queue message error: {0}")]
    #[diagnostic(
        code(dashsync::queue),
        help("The queue spool may be corrupt; inspect or remove it.")
    )]
    Queue(#[from] serde_json::Error),

    #[error("Failed to render config: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::MalformedInput { .. } => exit_code::INPUT,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            Self::RateLimited { .. } => exit_code::RATE_LIMIT,
            Self::PartialFailure { .. } => exit_code::PARTIAL,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MalformedInput { reason } => CliError::MalformedInput { reason },
            CoreError::Csv(e) => CliError::MalformedInput {
                reason: e.to_string(),
            },
            CoreError::InvalidSerial { value } => CliError::Validation {
                field: "serial".into(),
                reason: format!("'{value}' is not a XXXX-XXXX-XXXX serial"),
            },
            CoreError::Queue(e) => CliError::Queue(e),
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Timeout => CliError::Timeout,
            CoreError::RetriesExhausted { attempts } => CliError::RateLimited { attempts },
            CoreError::Api { message, status } => CliError::Api {
                status: status.map_or_else(|| "-".into(), |s| s.to_string()),
                message,
            },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Io(e) => CliError::Io(e),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Figment(e) => CliError::Config(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_map_to_input_exit_code() {
        let err = CliError::from(CoreError::MalformedInput {
            reason: "no header".into(),
        });
        assert_eq!(err.exit_code(), exit_code::INPUT);
    }

    #[test]
    fn retry_exhaustion_keeps_attempt_count() {
        let err = CliError::from(CoreError::RetriesExhausted { attempts: 4 });
        assert!(matches!(err, CliError::RateLimited { attempts: 4 }));
        assert_eq!(err.exit_code(), exit_code::RATE_LIMIT);
    }

    #[test]
    fn missing_credentials_is_auth_error() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "lab".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
