//! CLI-side configuration: `GlobalOpts` overrides on top of the shared
//! `dashsync-config` crate.
//!
//! This is the single boundary where CLI flags and profile values become a
//! core `DashboardConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

use dashsync_config::{Config, Profile};
use dashsync_core::DashboardConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Loaded configuration plus the active profile.
#[derive(Debug)]
pub struct Settings {
    pub config: Config,
    pub profile_name: String,
    pub profile: Profile,
}

impl Settings {
    /// Load config from disk and select the active profile.
    ///
    /// An explicitly requested profile must exist; the default profile may
    /// be absent, in which case flags and environment carry everything.
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = dashsync_config::load_config()?;
        Self::from_config(config, global)
    }

    pub fn from_config(config: Config, global: &GlobalOpts) -> Result<Self, CliError> {
        if let Some(name) = global.profile.as_deref() {
            if !config.profiles.contains_key(name) {
                let available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
                return Err(CliError::ProfileNotFound {
                    name: name.into(),
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                });
            }
        }
        let (profile_name, profile) = config.profile(global.profile.as_deref());
        Ok(Self {
            config,
            profile_name,
            profile,
        })
    }

    /// `--output`, else the config default, else table.
    pub fn output_format(&self, global: &GlobalOpts) -> OutputFormat {
        global.output.unwrap_or_else(|| {
            OutputFormat::from_str(&self.config.defaults.output, true).unwrap_or(OutputFormat::Table)
        })
    }

    pub fn queue_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map_or_else(|| dashsync_config::queue_path(&self.profile), Path::to_path_buf)
    }

    pub fn archive_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map_or_else(|| dashsync_config::archive_dir(&self.profile), Path::to_path_buf)
    }

    /// Translate profile + flags into a core `DashboardConfig`.
    pub fn dashboard_config(&self, global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
        // API root (flag > env > profile > default)
        let mut profile = self.profile.clone();
        if let Some(ref url) = global.api_url {
            profile.api_url = Some(url.clone());
        }

        // API key (flag > profile chain)
        let api_key = match global.api_key {
            Some(ref key) => SecretString::from(key.clone()),
            None => dashsync_config::resolve_api_key(&profile, &self.profile_name)?,
        };

        let mut dashboard =
            dashsync_config::profile_to_dashboard_config(&profile, api_key, &self.config.defaults)?;
        if let Some(secs) = global.timeout {
            dashboard.timeout = Duration::from_secs(secs);
        }
        Ok(dashboard)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["dashsync"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["config", "path"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.defaults.output = "yaml".into();
        config.profiles.insert(
            "lab".into(),
            Profile {
                api_url: Some("http://127.0.0.1:9/api/v1".into()),
                api_key: Some("profile-key".into()),
                timeout: Some(10),
                ..Profile::default()
            },
        );
        config
    }

    #[test]
    fn unknown_explicit_profile_is_an_error() {
        let err = Settings::from_config(config(), &global(&["--profile", "nope"])).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { ref available, .. } if available == "lab"));
    }

    #[test]
    fn flags_override_profile() {
        let g = global(&[
            "--profile",
            "lab",
            "--api-url",
            "http://10.0.0.1/api/v1",
            "--api-key",
            "flag-key",
            "--timeout",
            "3",
        ]);
        let settings = Settings::from_config(config(), &g).unwrap();
        let dashboard = settings.dashboard_config(&g).unwrap();

        assert_eq!(dashboard.base_url.as_str(), "http://10.0.0.1/api/v1");
        assert_eq!(dashboard.api_key.expose_secret(), "flag-key");
        assert_eq!(dashboard.timeout, Duration::from_secs(3));
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let g = global(&["--profile", "lab"]);
        let settings = Settings::from_config(config(), &g).unwrap();
        let dashboard = settings.dashboard_config(&g).unwrap();

        assert_eq!(dashboard.base_url.as_str(), "http://127.0.0.1:9/api/v1");
        assert_eq!(dashboard.timeout, Duration::from_secs(10));
        assert_eq!(dashboard.retry.max_retries, 3);
    }

    #[test]
    fn output_format_falls_back_to_config_default() {
        let settings = Settings::from_config(config(), &global(&[])).unwrap();
        assert_eq!(settings.output_format(&global(&[])), OutputFormat::Yaml);
        assert_eq!(
            settings.output_format(&global(&["-o", "json"])),
            OutputFormat::Json
        );
    }

    #[test]
    fn queue_flag_wins() {
        let settings = Settings::from_config(config(), &global(&[])).unwrap();
        assert_eq!(
            settings.queue_path(Some(Path::new("/tmp/q.jsonl"))),
            PathBuf::from("/tmp/q.jsonl")
        );
    }
}
