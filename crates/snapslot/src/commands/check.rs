//! Check command - validate configuration without touching the network.

use anyhow::{Context, Result};
use serde::Serialize;
use snapslot_core::config::Config;

use crate::{OutputFormat, Outcome};

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    api_url: &'a str,
    volume: &'a str,
    prefix: &'a str,
    timeout: String,
    token_set: bool,
    tiers: Vec<Tier>,
}

#[derive(Debug, Serialize)]
struct Tier {
    tier: usize,
    max_age: String,
    keeps: &'static str,
}

/// Execute the check command.
///
/// # Errors
///
/// Returns an error if a required setting is missing or invalid.
pub fn execute(config: &Config, format: OutputFormat) -> Result<Outcome> {
    config.validate().context("Configuration is invalid")?;

    let policy = &config.backup.thresholds;
    let tiers = policy
        .thresholds()
        .iter()
        .enumerate()
        .map(|(tier, threshold)| Tier {
            tier,
            max_age: threshold
                .to_std()
                .map(|d| humantime::format_duration(d).to_string())
                .unwrap_or_default(),
            keeps: if tier == snapslot_core::classifier::NEWEST_WINS_TIER {
                "newest"
            } else {
                "oldest"
            },
        })
        .collect();

    let report = CheckReport {
        api_url: &config.provider.api_url,
        volume: config.volume()?,
        prefix: &config.backup.prefix,
        timeout: humantime::format_duration(config.provider.timeout).to_string(),
        token_set: config.token().is_ok(),
        tiers,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Configuration OK");
            println!();
            println!("  api_url: {}", report.api_url);
            println!("  volume:  {}", report.volume);
            println!("  prefix:  {:?}", report.prefix);
            println!("  timeout: {}", report.timeout);
            println!();
            println!("Retention tiers ({}):", policy.tier_count());
            for tier in &report.tiers {
                println!(
                    "  tier {}: younger than {}, keeps the {}",
                    tier.tier, tier.max_age, tier.keeps
                );
            }
        }
    }
    Ok(Outcome::Clean)
}
