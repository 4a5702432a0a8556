// Hand-crafted async HTTP client for the device-management dashboard API.
//
// Base path: /api/v1/
// Auth: X-Cisco-Meraki-API-Key header

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Header carrying the dashboard API key.
pub const API_KEY_HEADER: &str = "X-Cisco-Meraki-API-Key";

/// Public dashboard API root.
pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";

/// Interval assumed when a 429 response carries no usable `Retry-After`.
const FALLBACK_RETRY_AFTER_SECS: u64 = 1;

const BODY_PREVIEW_CHARS: usize = 200;

/// A JSON object as returned by the dashboard.
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

// ── Endpoints ────────────────────────────────────────────────────────

/// The per-device resources this client reads and updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    /// `devices/{serial}`: name, tags, notes, address, coordinates.
    Device,
    /// `devices/{serial}/managementInterface`: `wan1` / `wan2` uplinks.
    ManagementInterface,
}

impl Endpoint {
    /// Relative path for this endpoint on the given device.
    pub fn path(self, serial: &str) -> String {
        match self {
            Self::Device => format!("devices/{serial}"),
            Self::ManagementInterface => format!("devices/{serial}/managementInterface"),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => f.write_str("device"),
            Self::ManagementInterface => f.write_str("management-interface"),
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the dashboard device endpoints.
///
/// Every call is a single request: rate-limit responses surface as
/// [`Error::RateLimited`] and retry policy is left to the caller.
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DashboardClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects the API key as a sensitive default header on every request.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL ends with `/` so relative joins append rather
    /// than replace the last path segment.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn put<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview = body_preview(&body);
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::InvalidApiKey;
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(FALLBACK_RETRY_AFTER_SECS);
            warn!(retry_after_secs, "received rate limit");
            return Error::RateLimited { retry_after_secs };
        }

        let raw = resp.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) if !err.errors.is_empty() => err.errors.join("; "),
            _ if raw.is_empty() => status.to_string(),
            _ => raw,
        };

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Read the current state of one endpoint for a device.
    pub async fn fetch(&self, endpoint: Endpoint, serial: &str) -> Result<JsonObject, Error> {
        self.get(&endpoint.path(serial)).await
    }

    /// Send a partial update to one endpoint for a device.
    pub async fn update(
        &self,
        endpoint: Endpoint,
        serial: &str,
        body: &JsonObject,
    ) -> Result<(), Error> {
        self.put(&endpoint.path(serial), body).await
    }

    // ── Devices ──────────────────────────────────────────────────────

    pub async fn get_device(&self, serial: &str) -> Result<JsonObject, Error> {
        self.fetch(Endpoint::Device, serial).await
    }

    pub async fn update_device(&self, serial: &str, body: &JsonObject) -> Result<(), Error> {
        self.update(Endpoint::Device, serial, body).await
    }

    // ── Management interface ─────────────────────────────────────────

    pub async fn get_management_interface(&self, serial: &str) -> Result<JsonObject, Error> {
        self.fetch(Endpoint::ManagementInterface, serial).await
    }

    pub async fn update_management_interface(
        &self,
        serial: &str,
        body: &JsonObject,
    ) -> Result<(), Error> {
        self.update(Endpoint::ManagementInterface, serial, body).await
    }
}

/// At most the first 200 characters of a response body, cut on a
/// character boundary.
fn body_preview(body: &str) -> &str {
    body.char_indices()
        .nth(BODY_PREVIEW_CHARS)
        .map_or(body, |(i, _)| &body[..i])
}
