mod cli;
mod config;
mod credentials;
mod error;
mod install;
mod manager;
mod models;
mod process;
mod shell;
mod state;
#[cfg(test)]
mod testing;
mod utils;

use anyhow::{Context, Result};
use cli::Cli;
use config::Config;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    // Diagnostics go to stderr; stdout carries the human-facing report
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    if let Err(err) = run() {
        utils::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    match Cli::new(config) {
        Some(cli) => cli.run().map_err(anyhow::Error::from),
        None => Ok(()),
    }
}
