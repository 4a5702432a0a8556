//! `reconcile`: consumer side. Drain the local queue as one batch.

use tracing::{info, warn};

use dashsync_core::{Batch, ReconcileReport, Spool};

use crate::cli::ReconcileArgs;
use crate::commands::{Context, util};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &ReconcileArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let spool = Spool::new(ctx.settings.queue_path(args.queue.as_deref()));
    let messages = spool.read()?;

    let batch = Batch::from_messages(&messages);
    if batch.is_empty() {
        warn!(queue = %spool.path().display(), "queue is empty, nothing to process");
        ctx.print(&output::render_report(
            ctx.format,
            &ReconcileReport::default(),
            ctx.color,
        ));
        return Ok(());
    }
    info!(messages = messages.len(), devices = batch.len(), "reconciling queued batch");

    let dashboard = ctx.settings.dashboard_config(ctx.global)?;
    let report = util::reconcile_batch(&dashboard, &batch, args.dry_run).await?;
    ctx.print(&output::render_report(ctx.format, &report, ctx.color));

    // Per-device failures were reported above; retrying them means
    // enqueueing the CSV again.
    if !args.dry_run && !args.keep {
        spool.clear()?;
    }
    util::check_report(&report)
}
