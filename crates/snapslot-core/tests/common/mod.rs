//! Shared test infrastructure for snapslot-core integration tests.
//!
//! Import from integration test files with:
//! ```ignore
//! mod common;
//! use common::MemoryProvider;
//! ```

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use snapslot_core::provider::{SnapshotSink, SnapshotSource};
use snapslot_core::{ProviderError, Result, Snapshot, Volume};

/// Fixed evaluation instant for deterministic tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).single().unwrap()
}

/// Snapshot named `{prefix}{id}` created `hours` before [`fixed_now`].
pub fn aged(id: &str, prefix: &str, hours: i64) -> Snapshot {
    Snapshot::new(id, format!("{prefix}{id}"), fixed_now() - TimeDelta::hours(hours))
}

#[derive(Default)]
struct State {
    snapshots: Vec<Snapshot>,
    created: Vec<String>,
    deleted: Vec<String>,
    delete_calls: Vec<String>,
    list_calls: usize,
    /// Listings that still omit newly created snapshots.
    hidden_listings: usize,
}

/// In-memory provider with a single volume.
pub struct MemoryProvider {
    volume: Volume,
    failing_deletes: HashSet<String>,
    state: Mutex<State>,
}

impl MemoryProvider {
    pub fn new(volume_name: &str, snapshots: Vec<Snapshot>) -> Self {
        Self {
            volume: Volume {
                id: format!("vol-{volume_name}"),
                name: volume_name.to_string(),
            },
            failing_deletes: HashSet::new(),
            state: Mutex::new(State {
                snapshots,
                ..State::default()
            }),
        }
    }

    /// Deleting `id` fails with a server error.
    pub fn fail_delete(mut self, id: &str) -> Self {
        self.failing_deletes.insert(id.to_string());
        self
    }

    /// The first `count` listings after a create do not show the new snapshot.
    pub fn hide_new_snapshots_for(self, count: usize) -> Self {
        self.state.lock().unwrap().hidden_listings = count;
        self
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn remaining_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.snapshots.iter().map(|s| s.id.clone()).collect()
    }

    pub fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().delete_calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }
}

#[async_trait]
impl SnapshotSource for MemoryProvider {
    async fn find_volume(&self, name: &str) -> Result<Volume> {
        if name == self.volume.name {
            Ok(self.volume.clone())
        } else {
            Err(ProviderError::NotFound(format!("volume {name}")).into())
        }
    }

    async fn list_snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>> {
        if volume_id != self.volume.id {
            return Err(ProviderError::NotFound(format!("volume {volume_id}")).into());
        }
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if state.hidden_listings > 0 {
            state.hidden_listings -= 1;
            let hidden: HashSet<&String> = state.created.iter().collect();
            return Ok(state
                .snapshots
                .iter()
                .filter(|s| !hidden.contains(&s.id))
                .cloned()
                .collect());
        }
        Ok(state.snapshots.clone())
    }
}

#[async_trait]
impl SnapshotSink for MemoryProvider {
    async fn create_snapshot(&self, volume_id: &str, name: &str) -> Result<Snapshot> {
        if volume_id != self.volume.id {
            return Err(ProviderError::NotFound(format!("volume {volume_id}")).into());
        }
        let mut state = self.state.lock().unwrap();
        let snapshot = Snapshot::new(format!("new-{}", state.created.len()), name, fixed_now());
        state.created.push(snapshot.id.clone());
        state.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push(snapshot_id.to_string());
        if self.failing_deletes.contains(snapshot_id) {
            return Err(ProviderError::Api {
                status: 500,
                body: "internal error".into(),
            }
            .into());
        }
        state.snapshots.retain(|s| s.id != snapshot_id);
        state.deleted.push(snapshot_id.to_string());
        Ok(())
    }
}
