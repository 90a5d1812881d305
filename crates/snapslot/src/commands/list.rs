//! List command - show every snapshot of the configured volume.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use snapslot_core::Snapshot;
use snapslot_core::config::Config;
use snapslot_core::provider::SnapshotSource;

use super::{connect, format_age};
use crate::{OutputFormat, Outcome};

#[derive(Debug, Serialize)]
struct ListedSnapshot<'a> {
    #[serde(flatten)]
    snapshot: &'a Snapshot,
    managed: bool,
}

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or the API request fails.
pub async fn execute(config: &Config, format: OutputFormat) -> Result<Outcome> {
    let client = connect(config)?;
    let volume_name = config.volume()?;
    let prefix = config.backup.prefix.as_str();

    let volume = client
        .find_volume(volume_name)
        .await
        .with_context(|| format!("Failed to resolve volume {volume_name}"))?;
    let mut snapshots = client
        .list_snapshots(&volume.id)
        .await
        .context("Failed to list snapshots")?;
    snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let listed: Vec<ListedSnapshot<'_>> = snapshots
        .iter()
        .map(|snapshot| ListedSnapshot {
            snapshot,
            managed: prefix.is_empty() || snapshot.matches_prefix(prefix),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&listed)?);
        }
        OutputFormat::Text => {
            if listed.is_empty() {
                println!("No snapshots for volume {}", volume.name);
                return Ok(Outcome::Clean);
            }

            let now = Utc::now();
            println!("Snapshots of {} ({}), newest first:", volume.name, volume.id);
            println!();
            for entry in &listed {
                let marker = if entry.managed { '*' } else { ' ' };
                println!(
                    "{marker} {}  {}  {}  age {}",
                    entry.snapshot.id,
                    entry.snapshot.name,
                    entry.snapshot.created_at.format("%Y-%m-%d %H:%M:%S"),
                    format_age(entry.snapshot.age_at(now))
                );
            }
            println!();
            println!("* managed by snapslot (prefix {prefix:?})");
        }
    }
    Ok(Outcome::Clean)
}
