use crate::utils::mask_secret;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API credentials: a key plus an optional base URL
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub api_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.filter(|url| !url.is_empty()),
        }
    }

    pub fn masked_key(&self) -> String {
        mask_secret(&self.api_key)
    }

    /// Copy suitable for display, with the key already masked
    pub fn masked(&self) -> Self {
        Self {
            api_key: self.masked_key(),
            base_url: self.base_url.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.masked_key())
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Persisted description of the current installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallRecord {
    pub version: String,
    pub source_path: String,
    pub bin_path: String,

    pub installed_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

impl InstallRecord {
    pub fn new(
        version: impl Into<String>,
        source_path: impl Into<String>,
        bin_path: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            version: version.into(),
            source_path: source_path.into(),
            bin_path: bin_path.into(),
            installed_at: Utc::now(),
            credentials,
        }
    }

    /// Pretty JSON with the credential key masked
    pub fn to_display_json(&self) -> String {
        let mut display = self.clone();
        display.credentials = self.credentials.as_ref().map(Credentials::masked);
        serde_json::to_string_pretty(&display).unwrap_or_else(|_| format!("{:?}", display))
    }
}

/// Installation state, derived from disk and PATH rather than stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    NotInstalled,
    Installed,
    /// Record present but the executable is not resolvable
    Orphaned,
}

impl InstallState {
    pub fn derive(record_present: bool, binary_resolvable: bool) -> Self {
        match (record_present, binary_resolvable) {
            (true, true) => InstallState::Installed,
            (true, false) => InstallState::Orphaned,
            (false, _) => InstallState::NotInstalled,
        }
    }
}

/// Where the effective credentials came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    InstallRecord,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::InstallRecord => write!(f, "install record"),
        }
    }
}
