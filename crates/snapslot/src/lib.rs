//! # snapslot
//!
//! Command-line interface for tiered volume snapshot backups.
//!
//! ## Commands
//!
//! - `snapslot run` - Create a snapshot and prune the excess
//! - `snapslot plan` - Show what `run` would keep and delete, without changes
//! - `snapslot list` - List the volume's snapshots
//! - `snapslot check` - Validate configuration offline
//!
//! ## Configuration
//!
//! Settings come from `snapslot.toml`, overridden by flags or environment:
//!
//! - `SNAPSLOT_CONFIG` - Config file path
//! - `SNAPSLOT_TOKEN` - API token
//! - `SNAPSLOT_VOLUME` - Volume name
//! - `SNAPSLOT_PREFIX` - Snapshot name prefix
//! - `SNAPSLOT_API_URL` - API root URL

#![forbid(unsafe_code)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use snapslot_core::config::{Config, LogFormat};
use snapslot_core::logging::LogConfig;

/// snapslot - tiered snapshot backups.
#[derive(Debug, Parser)]
#[command(name = "snapslot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/snapslot/snapslot.toml).
    #[arg(long, global = true, env = "SNAPSLOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// API token.
    #[arg(long, global = true, env = "SNAPSLOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Volume to back up.
    #[arg(long, global = true, env = "SNAPSLOT_VOLUME")]
    pub volume: Option<String>,

    /// Snapshot name prefix, used for naming and filtering.
    #[arg(long, global = true, env = "SNAPSLOT_PREFIX")]
    pub prefix: Option<String>,

    /// API root URL.
    #[arg(long, global = true, env = "SNAPSLOT_API_URL")]
    pub api_url: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Log level filter (RUST_LOG takes precedence).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format on stderr (pretty or json).
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Load the config file and apply flag and environment overrides.
    pub fn load_config(&self) -> snapslot_core::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(token) = &self.token {
            config.provider.token = Some(token.clone());
        }
        if let Some(volume) = &self.volume {
            config.backup.volume = Some(volume.clone());
        }
        if let Some(prefix) = &self.prefix {
            config.backup.prefix.clone_from(prefix);
        }
        if let Some(api_url) = &self.api_url {
            config.provider.api_url.clone_from(api_url);
        }
        Ok(config)
    }

    /// Logging settings from the config, with flag overrides.
    #[must_use]
    pub fn log_config(&self, config: &Config) -> LogConfig {
        let mut logging = config.logging.clone();
        if let Some(level) = &self.log_level {
            logging.level.clone_from(level);
        }
        if let Some(format) = self.log_format {
            logging.format = format;
        }
        logging
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a snapshot, then delete snapshots no tier retains.
    Run(commands::run::RunArgs),
    /// Classify existing snapshots without creating or deleting anything.
    Plan,
    /// List the volume's snapshots.
    List,
    /// Validate configuration and print the retention tiers.
    Check,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// How a successful command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Everything succeeded.
    Clean,
    /// The run completed but some deletions failed.
    PartialFailure,
}

impl Outcome {
    /// Process exit code: 0 clean, 2 partial failure. Errors exit with 1.
    #[must_use]
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Clean => ExitCode::SUCCESS,
            Self::PartialFailure => ExitCode::from(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "snapslot",
            "run",
            "--dry-run",
            "--token",
            "tok",
            "--volume",
            "data",
            "--format",
            "json",
            "--log-format",
            "json",
        ]);

        assert!(matches!(cli.command, Commands::Run(ref args) if args.dry_run));
        assert_eq!(cli.token.as_deref(), Some("tok"));
        assert_eq!(cli.volume.as_deref(), Some("data"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapslot.toml");
        std::fs::write(
            &path,
            "[provider]\ntoken = \"from-file\"\n[backup]\nvolume = \"file-vol\"\nprefix = \"nightly-\"\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "snapslot",
            "--config",
            path.to_str().unwrap(),
            "--volume",
            "flag-vol",
            "--api-url",
            "http://127.0.0.1:9/v2/",
            "--log-level",
            "debug",
            "check",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.volume().unwrap(), "flag-vol");
        assert_eq!(config.backup.prefix, "nightly-");
        assert_eq!(config.provider.api_url, "http://127.0.0.1:9/v2/");
        assert_eq!(cli.log_config(&config).level, "debug");
        assert!(matches!(cli.command, Commands::Check));
    }

    #[test]
    fn rejects_unknown_output_format() {
        let result = Cli::try_parse_from(["snapslot", "--format", "xml", "list"]);
        assert!(result.is_err());
    }
}
