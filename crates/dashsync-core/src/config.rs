// ── Runtime connection configuration ──
//
// Describes how to reach the dashboard. Built by the CLI from resolved
// profile values; core never reads config files itself.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use dashsync_api::{DEFAULT_BASE_URL, DashboardClient, TlsMode, TransportConfig};

use crate::error::CoreError;
use crate::reconcile::RetryPolicy;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// API root, e.g. `https://api.meraki.com/api/v1`.
    pub base_url: Url,
    pub api_key: SecretString,
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl DashboardConfig {
    /// Defaults for everything except the credential.
    pub fn new(api_key: SecretString) -> Result<Self, CoreError> {
        let base_url = Url::parse(DEFAULT_BASE_URL).map_err(|e| CoreError::Config {
            message: format!("invalid default URL: {e}"),
        })?;
        Ok(Self {
            base_url,
            api_key,
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        })
    }

    /// Build an HTTP client for this configuration.
    pub fn connect(&self) -> Result<DashboardClient, CoreError> {
        let transport = TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        };
        Ok(DashboardClient::from_api_key(
            self.base_url.as_str(),
            &self.api_key,
            &transport,
        )?)
    }
}
