//! Ticketing CLI
//!
//! Boundary for the ticketing core: each command runs one operation on behalf
//! of an already-authenticated caller and prints the result as JSON. Domain
//! errors print `{"error": <kind>, "message": ...}` to stderr and exit with a
//! per-kind status.

use std::process::ExitCode;

use clap::Parser;
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_ticketing::TicketingError;
use eyre::Result;
use serde_json::json;

mod cli;
mod commands;
mod config;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match commands::run(cli.command, &config).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(report) => match report.downcast_ref::<TicketingError>() {
            Some(error) => {
                let kind = error.kind();
                eprintln!("{}", json!({ "error": kind, "message": error.to_string() }));
                Ok(ExitCode::from(commands::exit_code(kind)))
            }
            None => Err(report),
        },
    }
}
