//! Snapshot and volume records as reported by the storage provider.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A point-in-time snapshot of a volume.
///
/// Owned by the provider; the classifier only ever borrows these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Opaque provider identifier.
    pub id: String,
    /// Human-readable name, used for prefix filtering.
    pub name: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at,
        }
    }

    /// Age relative to `now`. Negative for snapshots stamped in the future.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.created_at
    }

    /// Whether the name starts with `prefix`. An empty prefix matches everything.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.name.starts_with(prefix)
    }
}

/// A block storage volume that snapshots are taken of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
}

/// Name for a snapshot created at `at`: `{prefix}{volume}-{YYYYmmdd}-{HHMMSS}`.
#[must_use]
pub fn snapshot_name(prefix: &str, volume_name: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}{volume_name}{}", at.format("-%Y%m%d-%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn snapshot_name_uses_utc_stamp() {
        let at = Utc.with_ymd_and_hms(2016, 3, 7, 6, 0, 9).single().unwrap();
        assert_eq!(
            snapshot_name("auto-", "volume-fra1-01", at),
            "auto-volume-fra1-01-20160307-060009"
        );
    }

    #[test]
    fn age_is_now_minus_created() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).single().unwrap();
        let snap = Snapshot::new("1", "auto-a", now - TimeDelta::hours(5));
        assert_eq!(snap.age_at(now), TimeDelta::hours(5));
    }

    #[test]
    fn empty_prefix_matches_everything() {
        let snap = Snapshot::new("1", "manual-a", Utc::now());
        assert!(snap.matches_prefix(""));
        assert!(!snap.matches_prefix("auto-"));
    }

    #[test]
    fn deserializes_provider_timestamp() {
        let snap: Snapshot = serde_json::from_str(
            r#"{"id":"7","name":"auto-x","created_at":"2020-01-01T06:00:00Z","size_gigabytes":1}"#,
        )
        .unwrap();
        assert_eq!(snap.created_at, Utc.with_ymd_and_hms(2020, 1, 1, 6, 0, 0).single().unwrap());
    }
}
