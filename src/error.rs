use thiserror::Error;

#[derive(Error, Debug)]
pub enum HabitatError {
    #[error("{0} not found, install Node.js >= 18 first")]
    MissingTool(String),

    #[error("Installation failed: {0}")]
    PostInstallVerification(String),

    #[error("Command `{command}` exited with status {status}")]
    CommandFailed { command: String, status: String },

    #[error("Command `{command}` timed out after {secs} seconds")]
    CommandTimedOut { command: String, secs: u64 },

    #[error("Packaging failed: {0}")]
    PackFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, HabitatError>;
