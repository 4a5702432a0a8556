// ── Reconciliation driver ──
//
// Walks a batch one serial at a time: fetch the endpoint's current state,
// diff, and issue at most one update. A failure stays with its serial and
// endpoint; the rest of the batch proceeds.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use dashsync_api::{DashboardClient, Endpoint, JsonObject};

use crate::batch::Batch;
use crate::diff::{ChangeSet, diff_identity, diff_wan};
use crate::error::CoreError;
use crate::model::{RemoteDeviceState, Serial};

// ── Remote seam ──────────────────────────────────────────────────────

/// Remote side of reconciliation: read and write one device endpoint.
pub trait DeviceApi {
    fn fetch_state(
        &self,
        endpoint: Endpoint,
        serial: &Serial,
    ) -> impl Future<Output = Result<JsonObject, dashsync_api::Error>> + Send;

    fn apply_update(
        &self,
        endpoint: Endpoint,
        serial: &Serial,
        body: &JsonObject,
    ) -> impl Future<Output = Result<(), dashsync_api::Error>> + Send;
}

impl DeviceApi for DashboardClient {
    async fn fetch_state(
        &self,
        endpoint: Endpoint,
        serial: &Serial,
    ) -> Result<JsonObject, dashsync_api::Error> {
        self.fetch(endpoint, serial.as_str()).await
    }

    async fn apply_update(
        &self,
        endpoint: Endpoint,
        serial: &Serial,
        body: &JsonObject,
    ) -> Result<(), dashsync_api::Error> {
        self.update(endpoint, serial.as_str(), body).await
    }
}

// ── Retry policy ─────────────────────────────────────────────────────

/// Bounded retry for rate-limited calls.
///
/// Each retry waits the advertised `Retry-After` plus `padding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub padding: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_PADDING: Duration = Duration::from_secs(2);

    pub fn wait_for(&self, retry_after_secs: u64) -> Duration {
        Duration::from_secs(retry_after_secs) + self.padding
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            padding: Self::DEFAULT_PADDING,
        }
    }
}

// ── Report ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Updated { fields: Vec<String> },
    Unchanged,
    DryRun { fields: Vec<String> },
    Failed { reason: String },
}

impl OutcomeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::Unchanged => "unchanged",
            Self::DryRun { .. } => "dry-run",
            Self::Failed { .. } => "failed",
        }
    }

    /// Changed fields or the failure reason, for display.
    pub fn detail(&self) -> String {
        match self {
            Self::Updated { fields } | Self::DryRun { fields } => fields.join(", "),
            Self::Unchanged => String::new(),
            Self::Failed { reason } => reason.clone(),
        }
    }
}

/// Result for one (serial, endpoint) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceOutcome {
    pub serial: Serial,
    pub endpoint: Endpoint,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub outcomes: Vec<DeviceOutcome>,
}

impl ReconcileReport {
    fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn updated(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Updated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Unchanged))
    }

    pub fn dry_run(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::DryRun { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, serial: &Serial, endpoint: Endpoint) -> Option<&OutcomeStatus> {
        self.outcomes
            .iter()
            .find(|o| &o.serial == serial && o.endpoint == endpoint)
            .map(|o| &o.status)
    }
}

// ── Driver ───────────────────────────────────────────────────────────

/// Sequential reconciler over one [`Batch`].
pub struct Reconciler<'a, A> {
    api: &'a A,
    retry: RetryPolicy,
    dry_run: bool,
}

impl<'a, A: DeviceApi> Reconciler<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
            dry_run: false,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch and diff, but never call the update endpoint.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reconcile every serial in arrival order, identity before WAN.
    pub async fn run(&self, batch: &Batch) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for serial in batch.serials() {
            if let Some(identity) = batch.identity(&serial) {
                let status = self
                    .reconcile_endpoint(&serial, Endpoint::Device, |current| {
                        diff_identity(identity, current)
                    })
                    .await;
                report.outcomes.push(DeviceOutcome {
                    serial: serial.clone(),
                    endpoint: Endpoint::Device,
                    status,
                });
            }
            if let Some(wan) = batch.wan(&serial) {
                let status = self
                    .reconcile_endpoint(&serial, Endpoint::ManagementInterface, |current| {
                        diff_wan(&serial, wan, current)
                    })
                    .await;
                report.outcomes.push(DeviceOutcome {
                    serial: serial.clone(),
                    endpoint: Endpoint::ManagementInterface,
                    status,
                });
            }
        }

        info!(
            updated = report.updated(),
            unchanged = report.unchanged(),
            dry_run = report.dry_run(),
            failed = report.failed(),
            "reconciliation finished"
        );
        report
    }

    async fn reconcile_endpoint(
        &self,
        serial: &Serial,
        endpoint: Endpoint,
        diff: impl FnOnce(&RemoteDeviceState) -> Option<ChangeSet>,
    ) -> OutcomeStatus {
        match self.try_reconcile(serial, endpoint, diff).await {
            Ok(status) => status,
            Err(e) => {
                warn!(serial = %serial, %endpoint, error = %e, "device reconciliation failed");
                OutcomeStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_reconcile(
        &self,
        serial: &Serial,
        endpoint: Endpoint,
        diff: impl FnOnce(&RemoteDeviceState) -> Option<ChangeSet>,
    ) -> Result<OutcomeStatus, CoreError> {
        let api = self.api;
        let current = self
            .call_with_retry(serial, endpoint, || api.fetch_state(endpoint, serial))
            .await?;

        let Some(change) = diff(&RemoteDeviceState::new(current)) else {
            debug!(serial = %serial, %endpoint, "already up to date");
            return Ok(OutcomeStatus::Unchanged);
        };
        let fields = change.changed_fields();

        if self.dry_run {
            info!(serial = %serial, %endpoint, fields = ?fields, "dry run, update skipped");
            return Ok(OutcomeStatus::DryRun { fields });
        }

        let body = &change.body;
        self.call_with_retry(serial, endpoint, || api.apply_update(endpoint, serial, body))
            .await?;
        info!(serial = %serial, %endpoint, fields = ?fields, "device updated");
        Ok(OutcomeStatus::Updated { fields })
    }

    /// Run `call`, sleeping and retrying on rate limits until the policy's
    /// retry budget is spent. Other errors return immediately.
    async fn call_with_retry<T, F, Fut>(
        &self,
        serial: &Serial,
        endpoint: Endpoint,
        mut call: F,
    ) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, dashsync_api::Error>>,
    {
        let mut retries = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(dashsync_api::Error::RateLimited { retry_after_secs }) => {
                    if retries >= self.retry.max_retries {
                        return Err(CoreError::RetriesExhausted {
                            attempts: retries + 1,
                        });
                    }
                    retries += 1;
                    let wait = self.retry.wait_for(retry_after_secs);
                    warn!(
                        serial = %serial,
                        %endpoint,
                        retry = retries,
                        wait_secs = wait.as_secs(),
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
