//! CSV-to-dashboard reconciliation engine behind the `dashsync` CLI.
//!
//! The pipeline runs in three stages:
//!
//! - **Normalization** ([`normalize`]): loosely-typed CSV rows become typed
//!   [`DeviceIdentity`] / [`DeviceWan`] fragments keyed by a canonical
//!   [`Serial`]. Bad fields are dropped, bad rows skipped, never fatal.
//!
//! - **Dispatch** ([`queue`], [`batch`]): fragments travel as
//!   [`QueueMessage`]s on the `DeviceInfo` / `DeviceWan` channels and are
//!   folded into a per-invocation [`Batch`] with defined merge precedence.
//!
//! - **Reconciliation** ([`reconcile`], [`diff`]): for each serial the
//!   [`Reconciler`] fetches the live endpoint state, builds a minimal
//!   [`ChangeSet`], and issues at most one update. Rate limits are retried
//!   within a bounded [`RetryPolicy`]; failures stay per device and land in
//!   the [`ReconcileReport`].

pub mod batch;
pub mod config;
pub mod diff;
pub mod error;
pub mod input;
pub mod model;
pub mod normalize;
pub mod queue;
pub mod reconcile;

// ── Primary re-exports ──────────────────────────────────────────────
pub use batch::Batch;
pub use config::DashboardConfig;
pub use diff::{ChangeSet, diff_identity, diff_wan};
pub use error::CoreError;
pub use input::{parse_csv, parse_csv_bytes};
pub use model::{
    DeviceConfig, DeviceIdentity, DeviceWan, RemoteDeviceState, Serial, WanConfig, WanEnabled,
    WanPort,
};
pub use normalize::{Row, normalize, normalize_rows};
pub use queue::{Channel, QueueMessage, Spool};
pub use reconcile::{
    DeviceApi, DeviceOutcome, OutcomeStatus, ReconcileReport, Reconciler, RetryPolicy,
};

// Transport types the CLI needs without depending on dashsync-api directly.
pub use dashsync_api::{DEFAULT_BASE_URL, DashboardClient, Endpoint, JsonObject, TlsMode};
