//! Configuration for the dashsync CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `dashsync_core::DashboardConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dashsync_core::{DEFAULT_BASE_URL, DashboardConfig, RetryPolicy, TlsMode};

/// Environment variable that points at an alternate config file.
pub const CONFIG_PATH_ENV: &str = "DASHSYNC_CONFIG";

const KEYRING_SERVICE: &str = "dashsync";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named dashboard profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The profile named `name`, or the default profile, or an empty one.
    ///
    /// Returns the name the profile was resolved under.
    pub fn profile(&self, name: Option<&str>) -> (String, Profile) {
        let name = name
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into());
        let profile = self.profiles.get(&name).cloned().unwrap_or_default();
        (name, profile)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_padding")]
    pub retry_padding_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            retry_padding_secs: default_retry_padding(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    RetryPolicy::DEFAULT_MAX_RETRIES
}
fn default_retry_padding() -> u64 {
    RetryPolicy::DEFAULT_PADDING.as_secs()
}

/// A named dashboard profile. Unset fields fall back to [`Defaults`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API root (defaults to the public dashboard API).
    pub api_url: Option<String>,

    /// API key (plaintext, prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// JSON-lines spool file used by `enqueue` / `reconcile`.
    pub queue: Option<PathBuf>,

    /// Where processed CSV files are moved.
    pub archive_dir: Option<PathBuf>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub timeout: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_padding_secs: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "dashsync", "dashsync")
}

/// Resolve the config file path. `DASHSYNC_CONFIG` wins over the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn data_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".local");
    p.push("share");
    p.push("dashsync");
    p
}

/// Spool location when the profile names none.
pub fn default_queue_path() -> PathBuf {
    data_dir().join("queue.jsonl")
}

/// Archive location when the profile names none.
pub fn default_archive_dir() -> PathBuf {
    data_dir().join("completed")
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the resolved path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. `DASHSYNC_` variables override file values;
/// nested keys use `__`, e.g. `DASHSYNC_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DASHSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve an API key from the credential chain (no CLI flag step).
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(val) = profile
        .api_key_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Some(secret) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
        .ok()
        .and_then(|entry| entry.get_password().ok())
    {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

// ── Profile translation ─────────────────────────────────────────────

/// Parse and validate the profile's API root.
pub fn api_url(profile: &Profile) -> Result<url::Url, ConfigError> {
    let raw = profile.api_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Retry policy from the profile, falling back to global defaults.
pub fn retry_policy(profile: &Profile, defaults: &Defaults) -> RetryPolicy {
    RetryPolicy {
        max_retries: profile.max_retries.unwrap_or(defaults.max_retries),
        padding: Duration::from_secs(
            profile
                .retry_padding_secs
                .unwrap_or(defaults.retry_padding_secs),
        ),
    }
}

/// Build a `DashboardConfig` from a profile and an already resolved key.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    api_key: SecretString,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let base_url = api_url(profile)?;

    let tls = profile
        .ca_cert
        .clone()
        .map_or(TlsMode::System, TlsMode::CustomCa);

    Ok(DashboardConfig {
        base_url,
        api_key,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        retry: retry_policy(profile, defaults),
    })
}

/// Spool file for a profile.
pub fn queue_path(profile: &Profile) -> PathBuf {
    profile.queue.clone().unwrap_or_else(default_queue_path)
}

/// Archive directory for a profile.
pub fn archive_dir(profile: &Profile) -> PathBuf {
    profile.archive_dir.clone().unwrap_or_else(default_archive_dir)
}
