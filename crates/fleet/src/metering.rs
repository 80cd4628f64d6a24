//! Metering loop: charges every active resource once per cycle.
//!
//! One instance runs for the life of the process and is the sole writer of
//! recurring charges; the orchestrator only writes the one-time initial
//! charge. The loop is an explicit service with a shutdown signal, and a
//! single cycle is callable on its own so tests never sleep on a real clock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use rig_ledger::{LedgerEntry, LedgerStore, ResourceStatus, StoreError};

/// Tuning knobs for the metering loop.
#[derive(Debug, Clone)]
pub struct MeteringConfig {
    /// Metering granularity: one charge per active resource per period.
    pub period: Duration,
    /// How long to wait before retrying after a failed cycle.
    pub retry_backoff: Duration,
}

impl Default for MeteringConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(3600),
            retry_backoff: Duration::from_secs(60),
        }
    }
}

/// Outcome of one metering cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleReport {
    /// Resources observed in status `active`.
    pub resources_seen: usize,
    /// Charges actually appended.
    pub charges_applied: usize,
}

/// The billing reconciliation service.
pub struct Metering {
    store: Arc<dyn LedgerStore>,
    config: MeteringConfig,
}

impl Metering {
    /// Create a metering service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, config: MeteringConfig) -> Self {
        Self { store, config }
    }

    /// Run a single metering cycle.
    ///
    /// Appends one charge per active resource at that resource's fixed
    /// price. A failed insert is logged and skipped so one bad row cannot
    /// starve the rest of the fleet of charges.
    ///
    /// # Errors
    /// Returns an error if the active-resource query fails; no charges are
    /// applied in that case.
    pub async fn run_once(&self) -> Result<CycleReport, StoreError> {
        let active = self
            .store
            .resources_by_status(ResourceStatus::Active)
            .await?;

        let mut report = CycleReport {
            resources_seen: active.len(),
            charges_applied: 0,
        };

        for resource in active {
            let entry = LedgerEntry::charge(resource.owner, resource.price, resource.id);
            match self.store.insert_entry(entry).await {
                Ok(()) => report.charges_applied += 1,
                Err(e) => {
                    warn!(
                        resource_id = %resource.id,
                        error = %e,
                        "charge insert failed, skipping resource this cycle"
                    );
                }
            }
        }

        debug!(
            resources_seen = report.resources_seen,
            charges_applied = report.charges_applied,
            "metering cycle complete"
        );
        Ok(report)
    }

    /// Run cycles until the shutdown signal fires.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            period_secs = self.config.period.as_secs(),
            "metering loop started"
        );

        loop {
            let delay = match self.run_once().await {
                Ok(_) => self.config.period,
                Err(e) => {
                    warn!(error = %e, "metering cycle aborted, retrying after backoff");
                    self.config.retry_backoff
                }
            };

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    info!("metering loop stopping");
                    return;
                }
            }
        }
    }

    /// Spawn the loop on the current runtime.
    #[must_use]
    pub fn start(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
