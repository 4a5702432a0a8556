//! Command dispatch: bridges CLI args -> core pipeline -> output formatting.

pub mod apply;
pub mod config_cmd;
pub mod enqueue;
pub mod normalize;
pub mod reconcile;
pub mod util;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

/// Everything a handler needs besides its own arguments.
pub struct Context<'a> {
    pub global: &'a GlobalOpts,
    pub settings: Settings,
    pub format: OutputFormat,
    pub color: bool,
}

impl<'a> Context<'a> {
    pub fn new(global: &'a GlobalOpts, settings: Settings) -> Self {
        let format = settings.output_format(global);
        Self {
            global,
            settings,
            format,
            color: output::should_color(global.color),
        }
    }

    pub fn print(&self, out: &str) {
        output::print_output(out, self.global.quiet);
    }
}

/// Dispatch a pipeline command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Normalize(args) => normalize::handle(&args, ctx),
        Command::Enqueue(args) => enqueue::handle(&args, ctx),
        Command::Reconcile(args) => reconcile::handle(&args, ctx).await,
        Command::Apply(args) => apply::handle(&args, ctx).await,
        Command::Config(args) => config_cmd::handle(&args, ctx),
        // Completions are handled before settings are loaded
        Command::Completions(_) => Ok(()),
    }
}
