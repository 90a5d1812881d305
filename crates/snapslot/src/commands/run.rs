//! Run and plan commands - one backup cycle, optionally without mutations.

use anyhow::{Context, Result};
use clap::Args;
use snapslot_core::config::Config;
use snapslot_core::orchestrator::{BackupCycle, BackupSettings, CycleOptions, CycleReport};

use super::{connect, format_age};
use crate::{OutputFormat, Outcome};

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Classify only; create and delete nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute a backup cycle.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete, the volume cannot be
/// resolved, or snapshot creation or listing fails. Failed deletions are
/// reported through [`Outcome::PartialFailure`] instead.
pub async fn execute(args: &RunArgs, config: &Config, format: OutputFormat) -> Result<Outcome> {
    let client = connect(config)?;
    let settings = BackupSettings::from_config(config)?;
    let options = CycleOptions {
        dry_run: args.dry_run,
        ..CycleOptions::default()
    };

    let report = BackupCycle::new(&client, settings)
        .with_options(options)
        .run()
        .await
        .context("Backup cycle failed")?;

    print_report(&report, format)?;

    if report.is_clean() {
        Ok(Outcome::Clean)
    } else {
        Ok(Outcome::PartialFailure)
    }
}

/// Execute the plan command: a dry run.
pub async fn plan(config: &Config, format: OutputFormat) -> Result<Outcome> {
    execute(&RunArgs { dry_run: true }, config, format).await
}

fn print_report(report: &CycleReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            let now = report.evaluated_at;
            println!(
                "Volume {} ({}), evaluated at {}",
                report.volume.name,
                report.volume.id,
                now.format("%Y-%m-%d %H:%M:%S UTC")
            );
            match &report.created {
                Some(created) => println!("Created {} ({})", created.name, created.id),
                None if report.dry_run => println!("Dry run: no snapshot created"),
                None => {}
            }
            println!("Listed {} snapshots", report.listed);

            if report.short_circuited {
                println!("Fewer snapshots than tiers, nothing to prune");
                return Ok(());
            }

            println!();
            println!("Retained:");
            for kept in &report.retained {
                println!(
                    "  tier {} (< {})  {}  {}  age {}",
                    kept.tier,
                    kept.threshold,
                    kept.snapshot.id,
                    kept.snapshot.name,
                    format_age(kept.snapshot.age_at(now))
                );
            }

            println!();
            if report.excess.is_empty() {
                println!("No excess snapshots");
            } else {
                let verb = if report.dry_run { "Would delete" } else { "Excess" };
                println!("{verb}:");
                for snapshot in &report.excess {
                    println!(
                        "  {}  {}  age {}",
                        snapshot.id,
                        snapshot.name,
                        format_age(snapshot.age_at(now))
                    );
                }
            }

            if !report.dry_run {
                println!();
                println!(
                    "Deleted {}, failed {}",
                    report.deleted.len(),
                    report.failed.len()
                );
                for failure in &report.failed {
                    println!("  {}: {}", failure.snapshot_id, failure.error);
                }
            }
        }
    }
    Ok(())
}
