//! One backup cycle: create a snapshot, list, classify, delete the excess.
//!
//! # Ordering
//!
//! 1. Resolve the volume by name
//! 2. Create `{prefix}{volume}-{YYYYmmdd}-{HHMMSS}` (skipped on dry runs)
//! 3. List snapshots, re-listing until the new snapshot is visible
//! 4. Classify at a single captured instant
//! 5. Delete each excess snapshot (skipped on dry runs)
//!
//! A failed deletion is recorded and the remaining deletions still run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::classifier::SlotClassifier;
use crate::config::Config;
use crate::error::Result;
use crate::policy::RetentionPolicy;
use crate::provider::{SnapshotSink, SnapshotSource};
use crate::retry::RetryPolicy;
use crate::snapshot::{Snapshot, Volume, snapshot_name};

/// What to back up and how to retain it.
#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub volume: String,
    pub prefix: String,
    pub policy: RetentionPolicy,
}

impl BackupSettings {
    /// Extract settings from a loaded config. Requires a volume name.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            volume: config.volume()?.to_string(),
            prefix: config.backup.prefix.clone(),
            policy: config.backup.thresholds.clone(),
        })
    }
}

/// Knobs for a single cycle.
#[derive(Debug, Clone)]
pub struct CycleOptions {
    /// Classify only; create and delete nothing.
    pub dry_run: bool,
    /// How long to wait for a new snapshot to appear in listings.
    pub visibility_retry: RetryPolicy,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            visibility_retry: RetryPolicy::listing_visibility(),
        }
    }
}

/// A snapshot kept in a tier.
#[derive(Debug, Clone, Serialize)]
pub struct RetainedSnapshot {
    pub tier: usize,
    /// Tier threshold in humantime form, e.g. `"2days"`.
    pub threshold: String,
    pub snapshot: Snapshot,
}

/// A deletion that failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedDeletion {
    pub snapshot_id: String,
    pub error: String,
}

/// Everything one cycle observed and did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub volume: Volume,
    pub dry_run: bool,
    pub created: Option<Snapshot>,
    pub evaluated_at: DateTime<Utc>,
    pub listed: usize,
    /// True when the cycle stopped at the "fewer snapshots than tiers" guard.
    pub short_circuited: bool,
    pub retained: Vec<RetainedSnapshot>,
    pub excess: Vec<Snapshot>,
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDeletion>,
}

impl CycleReport {
    /// No deletion failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives a backup cycle against a provider.
pub struct BackupCycle<'a, P: ?Sized> {
    provider: &'a P,
    settings: BackupSettings,
    options: CycleOptions,
}

impl<'a, P> BackupCycle<'a, P>
where
    P: SnapshotSource + SnapshotSink + ?Sized,
{
    #[must_use]
    pub fn new(provider: &'a P, settings: BackupSettings) -> Self {
        Self {
            provider,
            settings,
            options: CycleOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CycleOptions) -> Self {
        self.options = options;
        self
    }

    /// Run against the wall clock.
    pub async fn run(&self) -> Result<CycleReport> {
        self.execute(Utc::now).await
    }

    /// Run with every timestamp pinned to `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        self.execute(|| now).await
    }

    async fn execute(&self, clock: impl Fn() -> DateTime<Utc>) -> Result<CycleReport> {
        let settings = &self.settings;
        let dry_run = self.options.dry_run;

        let volume = self.provider.find_volume(&settings.volume).await?;

        let created = if dry_run {
            info!(volume = %volume.name, "Dry run, not creating a snapshot");
            None
        } else {
            let name = snapshot_name(&settings.prefix, &volume.name, clock());
            Some(self.provider.create_snapshot(&volume.id, &name).await?)
        };

        let snapshots = match &created {
            Some(created) => self.list_until_visible(&volume.id, created).await?,
            None => self.provider.list_snapshots(&volume.id).await?,
        };

        let evaluated_at = clock();
        let classification = SlotClassifier::new(&settings.policy)
            .with_prefix(settings.prefix.as_str())
            .classify_at(&snapshots, evaluated_at);

        let retained = classification
            .retained()
            .map(|(tier, snapshot)| RetainedSnapshot {
                tier,
                threshold: settings
                    .policy
                    .threshold(tier)
                    .and_then(|t| t.to_std().ok())
                    .map(|t| humantime::format_duration(t).to_string())
                    .unwrap_or_default(),
                snapshot: snapshot.clone(),
            })
            .collect();
        let excess: Vec<Snapshot> = classification.excess().iter().map(|s| (*s).clone()).collect();

        info!(
            volume = %volume.name,
            listed = snapshots.len(),
            excess = excess.len(),
            dry_run,
            "Classified snapshots"
        );

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        if !dry_run {
            for snapshot in &excess {
                match self.provider.delete_snapshot(&snapshot.id).await {
                    Ok(()) => {
                        info!(
                            snapshot_id = %snapshot.id,
                            snapshot_name = %snapshot.name,
                            "Deleted excess snapshot"
                        );
                        deleted.push(snapshot.id.clone());
                    }
                    Err(e) => {
                        warn!(
                            snapshot_id = %snapshot.id,
                            snapshot_name = %snapshot.name,
                            error = %e,
                            "Failed to delete excess snapshot"
                        );
                        failed.push(FailedDeletion {
                            snapshot_id: snapshot.id.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        Ok(CycleReport {
            volume,
            dry_run,
            created,
            evaluated_at,
            listed: snapshots.len(),
            short_circuited: classification.short_circuited(),
            retained,
            excess,
            deleted,
            failed,
        })
    }

    /// List snapshots, retrying until `created` shows up or the policy runs out.
    async fn list_until_visible(&self, volume_id: &str, created: &Snapshot) -> Result<Vec<Snapshot>> {
        let policy = &self.options.visibility_retry;
        let mut attempt = 0u32;

        loop {
            let snapshots = self.provider.list_snapshots(volume_id).await?;
            if snapshots.iter().any(|s| s.id == created.id) {
                return Ok(snapshots);
            }

            attempt += 1;
            if attempt >= policy.max_attempts {
                warn!(
                    snapshot_id = %created.id,
                    attempts = attempt,
                    "New snapshot not visible in listing, classifying without it"
                );
                return Ok(snapshots);
            }
            tokio::time::sleep(policy.delay_for_attempt(attempt - 1)).await;
        }
    }
}
