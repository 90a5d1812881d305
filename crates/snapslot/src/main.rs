//! snapslot CLI - tiered snapshot backups.
//!
//! The main entry point for the `snapslot` binary.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use snapslot::{Cli, Commands, Outcome};
use snapslot_core::logging::init_logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(remediation) = err
                .downcast_ref::<snapslot_core::Error>()
                .and_then(snapslot_core::Error::remediation)
            {
                eprintln!();
                eprintln!("{}", remediation.render_plain());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    let config = cli.load_config()?;
    init_logging(&cli.log_config(&config)).context("Failed to initialize logging")?;

    // Create runtime and execute
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let format = cli.format;
    runtime.block_on(async {
        match &cli.command {
            Commands::Run(args) => snapslot::commands::run::execute(args, &config, format).await,
            Commands::Plan => snapslot::commands::run::plan(&config, format).await,
            Commands::List => snapslot::commands::list::execute(&config, format).await,
            Commands::Check => snapslot::commands::check::execute(&config, format),
        }
    })
}
