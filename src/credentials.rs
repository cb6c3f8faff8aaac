//! Credential discovery and resolution.
//!
//! Discovery reads the Claude settings file and asks the operator before
//! handing the key back; resolution decides which credentials are in force
//! when the environment and the install record disagree.

use crate::models::{CredentialSource, Credentials};
use crate::utils::{print_info, print_warning};
use colored::*;
use serde_json::Value;
use std::collections::HashMap;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing::warn;

pub const AUTH_TOKEN_VAR: &str = "ANTHROPIC_AUTH_TOKEN";
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";

/// Asks the operator whether discovered credentials may be recorded
pub trait ConsentProvider {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Interactive prompt on a terminal; otherwise reads one answer line from
/// stdin, and answers yes when stdin is closed.
pub struct PromptConsent;

impl ConsentProvider for PromptConsent {
    fn confirm(&self, prompt: &str) -> bool {
        use dialoguer::Confirm;

        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            return match Confirm::new().with_prompt(prompt).default(true).interact() {
                Ok(answer) => answer,
                Err(_) => {
                    println!("Y (auto)");
                    true
                }
            };
        }

        print!("{} [Y/n] ", prompt);
        let _ = std::io::stdout().flush();
        match read_answer(stdin.lock()) {
            Some(answer) => {
                println!();
                answer
            }
            None => {
                println!("Y (auto)");
                true
            }
        }
    }
}

/// Parse one answer line. An empty line means yes; `None` when the reader is
/// exhausted or unreadable.
fn read_answer(mut reader: impl BufRead) -> Option<bool> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let answer = line.trim();
            Some(answer.is_empty() || answer.eq_ignore_ascii_case("y"))
        }
    }
}

/// Snapshot of the credential-related environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub fn from_process() -> Self {
        let vars = [AUTH_TOKEN_VAR, API_KEY_VAR, BASE_URL_VAR]
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| (name.to_string(), value)))
            .collect();
        Self { vars }
    }

    #[cfg(test)]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Credentials provided by the environment, auth token first
    pub fn credentials(&self) -> Option<Credentials> {
        let key = self.get(AUTH_TOKEN_VAR).or_else(|| self.get(API_KEY_VAR))?;
        Some(Credentials::new(key, self.get(BASE_URL_VAR).map(str::to_string)))
    }
}

/// Effective credentials: the environment wins over the install record.
pub fn resolve(
    env: &EnvSnapshot,
    persisted: Option<&Credentials>,
) -> Option<(Credentials, CredentialSource)> {
    if let Some(credentials) = env.credentials() {
        return Some((credentials, CredentialSource::Environment));
    }

    persisted
        .cloned()
        .map(|credentials| (credentials, CredentialSource::InstallRecord))
}

/// Pull credentials out of a parsed settings document.
pub fn extract_credentials(settings: &Value) -> Option<Credentials> {
    let env = settings.get("env")?;
    let field = |name: &str| {
        env.get(name)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let key = field(AUTH_TOKEN_VAR).or_else(|| field(API_KEY_VAR))?;
    Some(Credentials::new(key, field(BASE_URL_VAR)))
}

pub struct CredentialDiscovery {
    settings_path: PathBuf,
}

impl CredentialDiscovery {
    pub fn new(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Discover credentials in the settings file and ask to keep them.
    ///
    /// Missing, unparsable or key-less settings only produce a warning.
    pub fn discover(&self, consent: &dyn ConsentProvider) -> Option<Credentials> {
        let contents = match std::fs::read_to_string(&self.settings_path) {
            Ok(contents) => contents,
            Err(_) => {
                print_warning(&format!("Settings file not found: {}", self.settings_path.display()));
                return None;
            }
        };

        let settings: Value = match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(path = %self.settings_path.display(), error = %err, "unparsable settings file");
                print_warning(&format!("Could not parse {}", self.settings_path.display()));
                return None;
            }
        };

        let credentials = match extract_credentials(&settings) {
            Some(credentials) => credentials,
            None => {
                print_warning("No API key found in Claude settings");
                return None;
            }
        };

        println!("\n{}", "Found Claude API credentials:".bold());
        println!("  Key: {}", credentials.masked_key().dimmed());
        if let Some(url) = &credentials.base_url {
            println!("  URL: {}", url.dimmed());
        }
        println!();

        if !consent.confirm("Record these credentials with the installation?") {
            print_info("Skipping credential setup");
            return None;
        }

        Some(credentials)
    }
}
