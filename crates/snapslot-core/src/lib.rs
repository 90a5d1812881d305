//! snapslot-core: Core library for snapslot
//!
//! Keeps one snapshot per age tier and marks everything else as excess.
//!
//! # Architecture
//!
//! ```text
//! Config → BackupCycle ─┬─ SnapshotSink::create_snapshot
//!                       ├─ SnapshotSource::list_snapshots
//!                       ├─ SlotClassifier (pure, no I/O)
//!                       └─ SnapshotSink::delete_snapshot (per excess snapshot)
//! ```
//!
//! # Modules
//!
//! - `policy`: Ordered age thresholds defining the tiers
//! - `classifier`: Tier assignment with newest-wins / oldest-wins cascade
//! - `snapshot`: Snapshot and volume records
//! - `provider`: Source/sink traits for the storage provider
//! - `digitalocean`: DigitalOcean v2 implementation of the provider traits
//! - `orchestrator`: Create → list → classify → delete cycle
//! - `retry`: Exponential backoff for provider calls
//! - `config`: Configuration loading and validation
//! - `logging`: Structured logging setup
//! - `error`: Error types with remediation hints
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod classifier;
pub mod config;
pub mod digitalocean;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod policy;
pub mod provider;
pub mod retry;
pub mod snapshot;

pub use classifier::{Classification, SlotClassifier, classify};
pub use error::{ConfigError, Error, ProviderError, Result};
pub use policy::RetentionPolicy;
pub use snapshot::{Snapshot, Volume};

/// Version of the snapslot-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
