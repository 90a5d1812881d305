//! Subcommand implementations.

pub mod check;
pub mod list;
pub mod run;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use snapslot_core::config::Config;
use snapslot_core::digitalocean::DigitalOceanClient;

/// Validate the config and build an API client from it.
fn connect(config: &Config) -> Result<DigitalOceanClient> {
    config.validate().context("Configuration is incomplete")?;
    let client =
        DigitalOceanClient::new(&config.provider).context("Failed to create API client")?;
    tracing::debug!(api_url = %client.base_url(), "API client ready");
    Ok(client)
}

/// Age rounded down to whole minutes, e.g. `1day 2h 5m`. Future timestamps show as `0s`.
fn format_age(age: TimeDelta) -> String {
    let minutes = u64::try_from(age.num_minutes()).unwrap_or(0);
    humantime::format_duration(std::time::Duration::from_secs(minutes * 60)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_age_rounds_to_minutes() {
        assert_eq!(format_age(TimeDelta::seconds(3_725)), "1h 2m");
        assert_eq!(format_age(TimeDelta::hours(26)), "1day 2h");
        assert_eq!(format_age(TimeDelta::seconds(-30)), "0s");
    }
}
