//! Age-based retention tiers.
//!
//! A [`RetentionPolicy`] is an ordered list of thresholds, tightest first. Tier
//! `i` accepts a snapshot whose age is strictly below `threshold(i)`.

use std::fmt;
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default tiers: under 18 hours, under 2 days, under 7 days, under 14 days.
pub const DEFAULT_THRESHOLDS: [Duration; 4] = [
    Duration::from_secs(3600 * 18),
    Duration::from_secs(3600 * 24 * 2),
    Duration::from_secs(3600 * 24 * 7),
    Duration::from_secs(3600 * 24 * 14),
];

/// Ordered age thresholds defining retention tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TierThreshold>", into = "Vec<TierThreshold>")]
pub struct RetentionPolicy {
    thresholds: Vec<TimeDelta>,
}

impl RetentionPolicy {
    /// Build a policy from thresholds ordered tightest first.
    ///
    /// Rejects an empty list, zero durations, durations too large to represent,
    /// and lists that are not strictly increasing.
    pub fn new(thresholds: impl IntoIterator<Item = Duration>) -> Result<Self> {
        let thresholds = thresholds
            .into_iter()
            .enumerate()
            .map(|(tier, threshold)| {
                if threshold.is_zero() {
                    return Err(Error::InvalidPolicy(format!(
                        "tier {tier} threshold must be positive"
                    )));
                }
                TimeDelta::from_std(threshold).map_err(|_| {
                    Error::InvalidPolicy(format!("tier {tier} threshold is out of range"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if thresholds.is_empty() {
            return Err(Error::InvalidPolicy(
                "at least one retention tier is required".to_string(),
            ));
        }

        if let Some(tier) = thresholds.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(Error::InvalidPolicy(format!(
                "thresholds must be strictly increasing: tier {} ({}) is not below tier {} ({})",
                tier,
                humanize(thresholds[tier]),
                tier + 1,
                humanize(thresholds[tier + 1]),
            )));
        }

        Ok(Self { thresholds })
    }

    /// Number of tiers.
    #[must_use]
    pub fn tier_count(&self) -> usize {
        self.thresholds.len()
    }

    /// Threshold for `tier`, or `None` past the last tier.
    #[must_use]
    pub fn threshold(&self, tier: usize) -> Option<TimeDelta> {
        self.thresholds.get(tier).copied()
    }

    /// All thresholds, tightest first.
    #[must_use]
    pub fn thresholds(&self) -> &[TimeDelta] {
        &self.thresholds
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS
                .iter()
                .map(|d| TimeDelta::seconds(d.as_secs() as i64))
                .collect(),
        }
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.thresholds.iter().copied().map(humanize).collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

/// One threshold in its serialized form, e.g. `"18h"` or `"7days"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierThreshold(#[serde(with = "humantime_serde")] pub Duration);

impl TryFrom<Vec<TierThreshold>> for RetentionPolicy {
    type Error = Error;

    fn try_from(value: Vec<TierThreshold>) -> Result<Self> {
        Self::new(value.into_iter().map(|t| t.0))
    }
}

impl From<RetentionPolicy> for Vec<TierThreshold> {
    fn from(policy: RetentionPolicy) -> Self {
        policy
            .thresholds
            .into_iter()
            .map(|t| TierThreshold(t.to_std().unwrap_or_default()))
            .collect()
    }
}

fn humanize(delta: TimeDelta) -> String {
    delta
        .to_std()
        .map(|d| humantime::format_duration(d).to_string())
        .unwrap_or_else(|_| format!("{}s", delta.num_seconds()))
}
