//! The four top-level operations.
//!
//! Install state is never stored as a field: it is derived on each call from
//! the state file and whether the CLI resolves on PATH.

use crate::config::Config;
use crate::credentials::{self, ConsentProvider, CredentialDiscovery, EnvSnapshot};
use crate::error::{HabitatError, Result};
use crate::install::Installer;
use crate::models::{CredentialSource, Credentials, InstallRecord, InstallState};
use crate::process::ToolRunner;
use crate::shell;
use crate::state::StateStore;
use crate::utils::{print_heading, print_info, print_success, print_warning};
use colored::*;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum InstallOutcome {
    Installed(InstallRecord),
    AlreadyInstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallOutcome {
    Removed,
    NothingToRemove,
}

/// Everything `status` shows, gathered without mutating anything
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub state: InstallState,
    pub record: Option<InstallRecord>,
    pub bin_path: Option<PathBuf>,
    pub cli_version: Option<String>,
    pub effective: Option<(Credentials, CredentialSource)>,
}

impl StatusReport {
    pub fn print(&self) {
        match self.state {
            InstallState::Installed => {
                print_success("Installed");
                println!();
                self.print_record();
                if let Some(bin) = &self.bin_path {
                    println!("  Command path: {}", bin.display());
                }
                println!("  CLI version: {}", self.cli_version.as_deref().unwrap_or("N/A"));
            }
            InstallState::Orphaned => {
                print_warning("Install record exists but the command is unavailable (a reinstall may be needed)");
                println!();
                self.print_record();
            }
            InstallState::NotInstalled => print_info("Not installed"),
        }

        println!();
        match &self.effective {
            Some((creds, source)) => {
                print_success(&format!("API key: {} ({})", creds.masked_key().dimmed(), source));
                if let Some(url) = &creds.base_url {
                    print_success(&format!("Base URL: {} ({})", url.dimmed(), source));
                }
            }
            None => print_warning(&format!("{} is not set", credentials::API_KEY_VAR)),
        }
        println!();
    }

    fn print_record(&self) {
        match &self.record {
            Some(record) => {
                for line in record.to_display_json().lines() {
                    println!("  {}", line.dimmed());
                }
                println!();
            }
            None => print_warning("Install record could not be read"),
        }
    }
}

pub struct Manager<'a> {
    config: &'a Config,
    runner: &'a dyn ToolRunner,
    consent: &'a dyn ConsentProvider,
    env: EnvSnapshot,
    store: StateStore,
    source_dir: PathBuf,
}

impl<'a> Manager<'a> {
    pub fn new(
        config: &'a Config,
        runner: &'a dyn ToolRunner,
        consent: &'a dyn ConsentProvider,
        env: EnvSnapshot,
        source_dir: PathBuf,
    ) -> Self {
        let store = StateStore::new(config.state_file.clone(), config.legacy_state_file.clone());
        Self {
            config,
            runner,
            consent,
            env,
            store,
            source_dir,
        }
    }

    fn installer(&self) -> Installer<'_> {
        Installer::new(self.config, self.runner)
    }

    pub fn state(&self) -> InstallState {
        InstallState::derive(self.store.exists(), self.installer().resolve_binary().is_some())
    }

    pub fn install(&self) -> Result<InstallOutcome> {
        print_heading("claude-habitat install");

        if self.state() == InstallState::Installed {
            let version = self
                .store
                .read()
                .map(|record| record.version)
                .unwrap_or_else(|| "?".to_string());
            print_warning(&format!(
                "v{} is already installed; use `habitat-manager reinstall` to reinstall",
                version
            ));
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let installer = self.installer();
        let npm = installer.find_npm()?;
        let source = std::fs::canonicalize(&self.source_dir).map_err(|err| {
            HabitatError::Config(format!("source directory {}: {}", self.source_dir.display(), err))
        })?;
        let version = Installer::package_version(&source);
        print_info(&format!("Version: {}", version));
        print_info(&format!("Source: {}", source.display()));

        installer.build_and_install(&npm, &source)?;

        let bin_path = installer.resolve_binary().ok_or_else(|| {
            HabitatError::PostInstallVerification(format!("{} command not found", self.config.bin_name))
        })?;
        print_success(&format!("Installed: {}", bin_path.display()));

        let credentials = if self.env.credentials().is_some() {
            print_success("API key already set in the environment");
            None
        } else {
            CredentialDiscovery::new(self.config.settings_file()).discover(self.consent)
        };

        let record = InstallRecord::new(
            version,
            source.display().to_string(),
            bin_path.display().to_string(),
            credentials,
        );
        self.store.write(&record)?;
        print_success(&format!("Install record written to {}", self.store.path().display()));

        println!("\n{}", "Installation complete!".green().bold());
        println!("\nUsage:");
        println!("  {} init        # initialise a project", self.config.bin_name);
        println!("  {} bootstrap   # AI design team", self.config.bin_name);
        println!("  {} status      # show status", self.config.bin_name);
        println!();

        Ok(InstallOutcome::Installed(record))
    }

    pub fn uninstall(&self) -> Result<UninstallOutcome> {
        print_heading("claude-habitat uninstall");

        if self.state() == InstallState::NotInstalled && !self.store.legacy_exists() {
            print_warning("Not installed, nothing to uninstall");
            return Ok(UninstallOutcome::NothingToRemove);
        }

        let installer = self.installer();
        if installer.resolve_binary().is_some() {
            let npm = installer.find_npm()?;
            installer.uninstall_package(&npm)?;
            print_success("Global package removed");
        }

        for rc in shell::clean_legacy_env(self.config, self.runner) {
            print_success(&format!("Removed managed environment variables from {}", rc.display()));
        }

        if self.store.remove()? {
            print_success(&format!("Removed {}", self.store.path().display()));
        }
        if self.store.remove_legacy()? {
            print_success(&format!("Removed legacy state file {}", self.store.legacy_path().display()));
        }

        println!("\n{}\n", "Uninstall complete".green().bold());
        Ok(UninstallOutcome::Removed)
    }

    pub fn reinstall(&self) -> Result<InstallOutcome> {
        print_heading("claude-habitat reinstall");
        self.uninstall()?;
        self.install()
    }

    /// Gather the status report; performs no mutation.
    pub fn status_report(&self) -> StatusReport {
        let state = self.state();
        let record = match state {
            InstallState::NotInstalled => None,
            _ => self.store.read(),
        };
        let bin_path = self.installer().resolve_binary();

        let cli_version = match (state, &bin_path) {
            (InstallState::Installed, Some(bin)) => self
                .runner
                .run(bin, &["--help"], None)
                .ok()
                .and_then(|output| output.first_line().map(str::to_string)),
            _ => None,
        };

        let persisted = record.as_ref().and_then(|r| r.credentials.as_ref());
        let effective = credentials::resolve(&self.env, persisted);

        StatusReport {
            state,
            record,
            bin_path,
            cli_version,
            effective,
        }
    }

    pub fn status(&self) -> Result<StatusReport> {
        print_heading("claude-habitat status");
        let report = self.status_report();
        report.print();
        Ok(report)
    }
}
