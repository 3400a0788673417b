//! Stop/start sequencing against the external service.
//!
//! The reconcile cycle guarantees the running service always reflects the
//! on-disk env file and manifest: the old instance is torn down before the
//! new one starts, so a node never runs with a mix of old and new
//! configuration. Files already written stay in place on failure; the
//! operator retries the reconcile, nothing is rolled back automatically.

use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::{CoreError, Result};
use crate::manifest::restore_manifest;
use crate::runner::{ServiceController, ServiceState};

const DEFAULT_VERIFY_ATTEMPTS: u32 = 10;
const DEFAULT_VERIFY_INTERVAL: Duration = Duration::from_secs(3);

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Whether an existing instance was torn down.
    pub stopped: bool,
    /// Whether the start command succeeded.
    pub started: bool,
    /// Post-start liveness result; `None` when verification was skipped.
    pub verified: Option<bool>,
    pub warnings: Vec<String>,
}

/// Drives the external service to match the on-disk configuration.
pub struct Reconciler<C> {
    controller: C,
    verify_attempts: u32,
    verify_interval: Duration,
}

impl<C: ServiceController> Reconciler<C> {
    pub fn new(controller: C) -> Self {
        Self {
            controller,
            verify_attempts: DEFAULT_VERIFY_ATTEMPTS,
            verify_interval: DEFAULT_VERIFY_INTERVAL,
        }
    }

    /// Override the bounded post-start liveness polling. Zero attempts
    /// disables verification.
    pub fn with_verification(mut self, attempts: u32, interval: Duration) -> Self {
        self.verify_attempts = attempts;
        self.verify_interval = interval;
        self
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Check the manifest with the controller; on failure restore the
    /// previous manifest from `backup` before propagating, so a broken
    /// definition is never left in effect.
    pub async fn validate_manifest(
        &self,
        manifest_path: &Path,
        backup: Option<&Path>,
    ) -> Result<()> {
        match self.controller.validate().await {
            Ok(_) => Ok(()),
            Err(e) => {
                if let Some(previous) = backup {
                    warn!(
                        "Manifest rejected, restoring previous manifest from {}",
                        previous.display()
                    );
                    restore_manifest(manifest_path, previous)?;
                }
                Err(e)
            }
        }
    }

    /// Full stop-then-start cycle.
    ///
    /// Stopping an absent service is a no-op; a stop failure on a present
    /// service aborts before start is ever attempted. Start failure is
    /// fatal but leaves the on-disk files in place. Liveness polling only
    /// produces a report entry, never a retry.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        match self.controller.state().await? {
            ServiceState::Absent => {
                debug!("Service absent, nothing to stop");
            }
            state @ (ServiceState::Running | ServiceState::Stopped) => {
                info!("Stopping service (was {})", state.as_str());
                self.controller
                    .down()
                    .await
                    .map_err(|e| CoreError::StopFailed(e.to_string()))?;
                report.stopped = true;
            }
        }

        info!("Starting service");
        self.controller.up().await?;
        report.started = true;

        if self.verify_attempts > 0 {
            let live = self.verify().await;
            if !live {
                report.warnings.push(format!(
                    "service not confirmed running after {} checks",
                    self.verify_attempts
                ));
            }
            report.verified = Some(live);
        }

        Ok(report)
    }

    /// Poll the service state a bounded number of times.
    async fn verify(&self) -> bool {
        for attempt in 1..=self.verify_attempts {
            match self.controller.state().await {
                Ok(ServiceState::Running) => {
                    debug!("Service confirmed running on check {}", attempt);
                    return true;
                }
                Ok(state) => {
                    debug!("Check {}: service {}", attempt, state.as_str());
                }
                Err(e) => {
                    debug!("Check {}: status query failed: {}", attempt, e);
                }
            }
            if attempt < self.verify_attempts {
                sleep(self.verify_interval).await;
            }
        }
        false
    }
}
