use crate::config::Config;
use crate::credentials::{EnvSnapshot, PromptConsent};
use crate::error::Result;
use crate::manager::Manager;
use crate::process::SystemRunner;
use crate::utils::print_warning;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "habitat-manager")]
#[command(about = "Install, uninstall and inspect the claude-habitat CLI", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Source tree to build from (defaults to the current directory)
    #[arg(long, global = true, env = "HABITAT_SOURCE_DIR", value_name = "DIR")]
    source: Option<PathBuf>,

    #[arg(skip)]
    config: Config,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Build the source tree and install the CLI globally
    Install,

    /// Remove the global package, legacy shell variables and install state
    Uninstall,

    /// Uninstall, then install again
    Reinstall,

    /// Show installation state and the credentials in force
    Status,
}

impl Cli {
    /// Parse arguments; `None` means usage was printed and there is nothing to run.
    pub fn new(config: Config) -> Option<Self> {
        let mut cli = match Self::try_parse() {
            Ok(cli) => cli,
            Err(err) if matches!(err.kind(), ErrorKind::InvalidSubcommand | ErrorKind::UnknownArgument) => {
                print_warning("Unknown command");
                print_usage();
                return None;
            }
            Err(err) => err.exit(),
        };

        if cli.command.is_none() {
            print_usage();
            return None;
        }

        cli.config = config;
        Some(cli)
    }

    pub fn run(self) -> Result<()> {
        let Some(command) = self.command else {
            print_usage();
            return Ok(());
        };

        let source = match self.source {
            Some(dir) => PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).to_string()),
            None => std::env::current_dir()?,
        };

        let runner = SystemRunner::new(self.config.command_timeout());
        let consent = PromptConsent;
        let manager = Manager::new(&self.config, &runner, &consent, EnvSnapshot::from_process(), source);

        match command {
            Commands::Install => manager.install().map(|_| ()),
            Commands::Uninstall => manager.uninstall().map(|_| ()),
            Commands::Reinstall => manager.reinstall().map(|_| ()),
            Commands::Status => manager.status().map(|_| ()),
        }
    }
}

pub fn print_usage() {
    let mut command = Cli::command();
    if command.print_help().is_err() {
        println!("Usage: habitat-manager <install|uninstall|reinstall|status>");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_each_subcommand() {
        for (arg, expected) in [
            ("install", Commands::Install),
            ("uninstall", Commands::Uninstall),
            ("reinstall", Commands::Reinstall),
            ("status", Commands::Status),
        ] {
            let cli = Cli::try_parse_from(["habitat-manager", arg]).unwrap();
            assert_eq!(cli.command, Some(expected));
        }
    }

    #[test]
    fn test_source_option_is_global() {
        let cli = Cli::try_parse_from(["habitat-manager", "install", "--source", "/tmp/habitat"]).unwrap();
        assert_eq!(cli.source, Some(PathBuf::from("/tmp/habitat")));
    }

    #[test]
    fn test_unknown_subcommand_kind() {
        let err = Cli::try_parse_from(["habitat-manager", "frobnicate"]).err().unwrap();
        assert!(matches!(err.kind(), ErrorKind::InvalidSubcommand | ErrorKind::UnknownArgument));
    }
}
