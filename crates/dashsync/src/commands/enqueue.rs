//! `enqueue`: producer side. CSV → normalized fragments → local queue.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use dashsync_core::{QueueMessage, Spool, normalize_rows};

use crate::cli::EnqueueArgs;
use crate::commands::{Context, util};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct EnqueueSummary {
    devices: usize,
    messages: usize,
    queue: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    archived_to: Option<PathBuf>,
}

pub fn handle(args: &EnqueueArgs, ctx: &Context<'_>) -> Result<(), CliError> {
    let rows = util::read_csv_file(&args.file)?;
    let configs = normalize_rows(&rows);

    let mut messages = Vec::with_capacity(configs.len() * 2);
    for config in &configs {
        messages.extend(QueueMessage::from_config(config)?);
    }

    let spool = Spool::new(ctx.settings.queue_path(args.queue.as_deref()));
    let queued = spool.append(&messages)?;
    info!(devices = configs.len(), messages = queued, queue = %spool.path().display(), "enqueued");

    let archived_to = if args.archive.no_archive {
        None
    } else {
        let dir = ctx.settings.archive_dir(args.archive.archive_dir.as_deref());
        Some(util::archive_csv(&args.file, &dir)?)
    };

    let summary = EnqueueSummary {
        devices: configs.len(),
        messages: queued,
        queue: spool.path().to_path_buf(),
        archived_to,
    };
    let out = output::render_single(
        ctx.format,
        &summary,
        |s| {
            let mut line = format!(
                "Queued {} messages for {} devices to {}",
                s.messages,
                s.devices,
                s.queue.display()
            );
            if let Some(ref archived) = s.archived_to {
                line.push_str(&format!("\nArchived input to {}", archived.display()));
            }
            line
        },
        |s| s.queue.display().to_string(),
    );
    ctx.print(&out);
    Ok(())
}
