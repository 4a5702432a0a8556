//! Config subcommand handlers.

use dashsync_config::{Config, config_path};

use crate::cli::{ConfigArgs, ConfigCommand};
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

/// Copy of the config with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("****".into());
        }
    }
    cfg
}

pub fn handle(args: &ConfigArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = redacted(&ctx.settings.config);
            let toml = toml::to_string_pretty(&cfg)?;
            let out = output::render_single(
                ctx.format,
                &cfg,
                |_| {
                    format!(
                        "# {}\n# active profile: {}\n# queue: {}\n# archive: {}\n\n{}",
                        config_path().display(),
                        ctx.settings.profile_name,
                        ctx.settings.queue_path(None).display(),
                        ctx.settings.archive_dir(None).display(),
                        toml.trim_end()
                    )
                },
                |_| toml.trim_end().to_owned(),
            );
            ctx.print(&out);
        }
        ConfigCommand::Path => {
            ctx.print(&config_path().display().to_string());
        }
    }
    Ok(())
}
