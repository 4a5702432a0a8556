//! `apply`: local mode. CSV → batch → dashboard, no queue in between.

use tracing::info;

use dashsync_core::{Batch, ReconcileReport, normalize_rows};

use crate::cli::ApplyArgs;
use crate::commands::{Context, util};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &ApplyArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let rows = util::read_csv_file(&args.file)?;
    let batch = Batch::from_configs(normalize_rows(&rows));
    info!(rows = rows.len(), devices = batch.len(), dry_run = args.dry_run, "applying input");

    let report = if batch.is_empty() {
        ReconcileReport::default()
    } else {
        let dashboard = ctx.settings.dashboard_config(ctx.global)?;
        util::reconcile_batch(&dashboard, &batch, args.dry_run).await?
    };
    ctx.print(&output::render_report(ctx.format, &report, ctx.color));

    if !args.dry_run && !args.archive.no_archive {
        let dir = ctx.settings.archive_dir(args.archive.archive_dir.as_deref());
        util::archive_csv(&args.file, &dir)?;
    }
    util::check_report(&report)
}
