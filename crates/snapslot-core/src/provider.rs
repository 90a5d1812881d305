//! Seams to the storage provider.
//!
//! The classifier never touches these; only [`crate::orchestrator`] does.

use async_trait::async_trait;

use crate::error::Result;
use crate::snapshot::{Snapshot, Volume};

/// Read side: volume lookup and snapshot listing.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Look a volume up by its name. Missing volumes are `ProviderError::NotFound`.
    async fn find_volume(&self, name: &str) -> Result<Volume>;

    /// Every snapshot of the volume, in whatever order the provider returns.
    async fn list_snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>>;
}

/// Write side: snapshot creation and deletion.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn create_snapshot(&self, volume_id: &str, name: &str) -> Result<Snapshot>;

    /// Deleting a snapshot that is already gone succeeds.
    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<()>;
}
