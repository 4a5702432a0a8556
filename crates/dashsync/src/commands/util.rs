//! Shared helpers for command handlers.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use dashsync_core::{Batch, DashboardConfig, ReconcileReport, Reconciler, Row, parse_csv_bytes};

use crate::error::CliError;

/// Read a device CSV file into rows.
pub fn read_csv_file(path: &Path) -> Result<Vec<Row>, CliError> {
    let bytes = fs::read(path)?;
    let rows = parse_csv_bytes(&bytes)?;
    debug!(path = %path.display(), rows = rows.len(), "read device CSV");
    Ok(rows)
}

/// Move a processed CSV into `dir` as `YYYYmmdd_HHMMSS-<file name>` (UTC).
pub fn archive_csv(path: &Path, dir: &Path) -> Result<PathBuf, CliError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::Validation {
            field: "file".into(),
            reason: format!("'{}' has no file name", path.display()),
        })?
        .to_string_lossy();

    fs::create_dir_all(dir)?;
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let target = dir.join(format!("{stamp}-{file_name}"));

    if fs::rename(path, &target).is_err() {
        // rename fails across filesystems
        fs::copy(path, &target)?;
        fs::remove_file(path)?;
    }

    info!(from = %path.display(), to = %target.display(), "archived input file");
    Ok(target)
}

/// Run one reconciliation pass with the resolved dashboard settings.
pub async fn reconcile_batch(
    dashboard: &DashboardConfig,
    batch: &Batch,
    dry_run: bool,
) -> Result<ReconcileReport, CliError> {
    let client = dashboard.connect()?;
    let report = Reconciler::new(&client)
        .with_retry(dashboard.retry)
        .dry_run(dry_run)
        .run(batch)
        .await;
    Ok(report)
}

/// Turn per-device failures into a non-zero exit after the report is shown.
pub fn check_report(report: &ReconcileReport) -> Result<(), CliError> {
    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::PartialFailure {
            failed: report.failed(),
            total: report.outcomes.len(),
        })
    }
}
