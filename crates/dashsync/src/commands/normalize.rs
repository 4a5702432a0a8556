//! `normalize`: show what a CSV would send, without touching the queue or API.

use dashsync_core::normalize_rows;

use crate::cli::NormalizeArgs;
use crate::commands::{Context, util};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &NormalizeArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let rows = util::read_csv_file(&args.file)?;
    let configs = normalize_rows(&rows);
    tracing::info!(rows = rows.len(), devices = configs.len(), "normalized input");

    ctx.print(&output::render_fragments(ctx.format, &configs));
    Ok(())
}
