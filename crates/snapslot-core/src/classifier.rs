//! Slot classification: decide which snapshots fill the retention tiers and
//! which are excess.
//!
//! # Algorithm
//!
//! Snapshots are processed in input order (order matters). Each one walks the
//! tiers from 0 upward:
//!
//! 1. Too old for the tier (`age >= threshold`): move to the next tier.
//! 2. Tier empty: take it.
//! 3. Tier 0 occupied: newest wins. A strictly newer snapshot evicts the
//!    occupant into the excess list; otherwise keep walking.
//! 4. Tier >= 1 occupied: oldest wins. A strictly older snapshot evicts the
//!    occupant; otherwise keep walking.
//!
//! A snapshot that falls off the end of the walk is excess. Losing a tie-break
//! never marks a snapshot excess on its own; it cascades to the looser tiers
//! first.
//!
//! When there are fewer snapshots than tiers (counted before the name filter)
//! nothing is excess and no tier walk happens at all.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::policy::RetentionPolicy;
use crate::snapshot::Snapshot;

/// Tier where the newest snapshot is kept. All other tiers keep the oldest.
pub const NEWEST_WINS_TIER: usize = 0;

/// Outcome of one classification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<'s> {
    slots: Vec<Option<&'s Snapshot>>,
    excess: Vec<&'s Snapshot>,
    short_circuited: bool,
}

impl<'s> Classification<'s> {
    /// Snapshots eligible for deletion, in the order they became excess.
    #[must_use]
    pub fn excess(&self) -> &[&'s Snapshot] {
        &self.excess
    }

    #[must_use]
    pub fn into_excess(self) -> Vec<&'s Snapshot> {
        self.excess
    }

    /// Final occupant of each tier, indexed by tier.
    #[must_use]
    pub fn slots(&self) -> &[Option<&'s Snapshot>] {
        &self.slots
    }

    /// Occupied tiers as `(tier, snapshot)` pairs, tightest first.
    pub fn retained(&self) -> impl Iterator<Item = (usize, &'s Snapshot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(tier, slot)| slot.map(|snapshot| (tier, snapshot)))
    }

    /// Tier currently holding the snapshot with `id`, if any.
    #[must_use]
    pub fn tier_of(&self, id: &str) -> Option<usize> {
        self.retained()
            .find(|(_, snapshot)| snapshot.id == id)
            .map(|(tier, _)| tier)
    }

    /// True when the run stopped at the "fewer snapshots than tiers" guard.
    #[must_use]
    pub fn short_circuited(&self) -> bool {
        self.short_circuited
    }
}

/// Assigns snapshots to the tiers of a [`RetentionPolicy`].
#[derive(Debug, Clone)]
pub struct SlotClassifier<'p> {
    policy: &'p RetentionPolicy,
    name_prefix: Option<String>,
}

impl<'p> SlotClassifier<'p> {
    #[must_use]
    pub fn new(policy: &'p RetentionPolicy) -> Self {
        Self {
            policy,
            name_prefix: None,
        }
    }

    /// Only consider snapshots whose name starts with `prefix`.
    ///
    /// An empty prefix disables filtering.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.name_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// Classify against the current wall-clock time.
    #[must_use]
    pub fn classify<'s>(&self, snapshots: &'s [Snapshot]) -> Classification<'s> {
        self.classify_at(snapshots, Utc::now())
    }

    /// Classify with ages measured from `now`.
    #[must_use]
    pub fn classify_at<'s>(
        &self,
        snapshots: &'s [Snapshot],
        now: DateTime<Utc>,
    ) -> Classification<'s> {
        let thresholds = self.policy.thresholds();
        let mut slots: Vec<Option<&'s Snapshot>> = vec![None; thresholds.len()];
        let mut excess: Vec<&'s Snapshot> = Vec::new();

        // Raw count on purpose: the prefix filter has not run yet.
        if snapshots.len() < thresholds.len() {
            debug!(
                snapshots = snapshots.len(),
                tiers = thresholds.len(),
                "Fewer snapshots than tiers, nothing to prune"
            );
            return Classification {
                slots,
                excess,
                short_circuited: true,
            };
        }

        'snapshots: for snapshot in snapshots {
            if let Some(prefix) = self.name_prefix.as_deref() {
                if !snapshot.matches_prefix(prefix) {
                    trace!(snapshot_name = %snapshot.name, "Skipping snapshot outside prefix");
                    continue;
                }
            }

            let age = snapshot.age_at(now);
            for (tier, threshold) in thresholds.iter().enumerate() {
                if age >= *threshold {
                    continue;
                }

                let Some(held) = slots[tier] else {
                    trace!(snapshot_id = %snapshot.id, tier, "Tier free, assigned");
                    slots[tier] = Some(snapshot);
                    continue 'snapshots;
                };

                let wins = if tier == NEWEST_WINS_TIER {
                    snapshot.created_at > held.created_at
                } else {
                    snapshot.created_at < held.created_at
                };

                if wins {
                    trace!(
                        snapshot_id = %snapshot.id,
                        evicted_id = %held.id,
                        tier,
                        "Tie-break won, occupant evicted"
                    );
                    excess.push(held);
                    slots[tier] = Some(snapshot);
                    continue 'snapshots;
                }
                trace!(snapshot_id = %snapshot.id, tier, "Tie-break lost, cascading");
            }

            trace!(snapshot_id = %snapshot.id, "No tier available, marked excess");
            excess.push(snapshot);
        }

        debug!(
            snapshots = snapshots.len(),
            retained = slots.iter().flatten().count(),
            excess = excess.len(),
            "Classification complete"
        );

        Classification {
            slots,
            excess,
            short_circuited: false,
        }
    }
}

/// Snapshots under `policy` that no tier retains.
///
/// Shorthand for [`SlotClassifier::classify_at`] with an optional prefix.
#[must_use]
pub fn classify<'s>(
    snapshots: &'s [Snapshot],
    policy: &RetentionPolicy,
    name_prefix: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<&'s Snapshot> {
    let mut classifier = SlotClassifier::new(policy);
    if let Some(prefix) = name_prefix {
        classifier = classifier.with_prefix(prefix);
    }
    classifier.classify_at(snapshots, now).into_excess()
}
