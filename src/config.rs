use crate::error::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub habitat_dir: PathBuf,

    #[serde(skip)]
    pub state_file: PathBuf,

    #[serde(skip)]
    pub legacy_state_file: PathBuf,

    #[serde(skip)]
    pub config_file: PathBuf,

    #[serde(skip)]
    pub home_dir: PathBuf,

    /// npm package name used for global uninstall
    pub package_name: String,

    /// Executable the package puts on PATH
    pub bin_name: String,

    /// Package manager executable
    pub npm: String,

    /// Upper bound for any single external command
    pub command_timeout_secs: u64,

    /// Treat a failing install/build/pack step as fatal
    pub strict: bool,

    /// Marker tagging shell rc lines written by older releases
    pub rc_marker: String,

    /// Override for the Claude settings file
    pub settings_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let home_dir = Self::default_home_dir();
        let habitat_dir = Self::default_habitat_dir(&home_dir);
        Self::with_dirs(home_dir, habitat_dir)
    }
}

impl Config {
    /// Build a configuration rooted at explicit directories.
    pub fn with_dirs(home_dir: PathBuf, habitat_dir: PathBuf) -> Self {
        Self {
            state_file: habitat_dir.join("install.json"),
            config_file: habitat_dir.join("config.toml"),
            legacy_state_file: home_dir.join(".claude-habitat.json"),
            habitat_dir,
            home_dir,
            package_name: "claude-habitat".to_string(),
            bin_name: "claude-habitat".to_string(),
            npm: "npm".to_string(),
            command_timeout_secs: 600,
            strict: true,
            rc_marker: "# claude-habitat managed".to_string(),
            settings_path: None,
        }
    }

    fn default_home_dir() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    fn default_habitat_dir(home_dir: &std::path::Path) -> PathBuf {
        if let Ok(dir) = std::env::var("HABITAT_DIR") {
            if !dir.is_empty() {
                return PathBuf::from(shellexpand::tilde(&dir).to_string());
            }
        }

        if let Some(proj_dirs) = ProjectDirs::from("", "", "claude-habitat") {
            return proj_dirs.config_dir().to_path_buf();
        }

        home_dir.join(".claude-habitat")
    }

    /// Load defaults, then overlay `config.toml` if one exists.
    ///
    /// The file is never created here: an empty habitat directory must stay
    /// removable on uninstall.
    pub fn load() -> Result<Self> {
        Self::default().overlay_file()
    }

    pub fn overlay_file(mut self) -> Result<Self> {
        if !self.config_file.exists() {
            return Ok(self);
        }

        let contents = std::fs::read_to_string(&self.config_file)?;
        let file_config: Config = toml::from_str(&contents)?;

        self.package_name = file_config.package_name;
        self.bin_name = file_config.bin_name;
        self.npm = file_config.npm;
        self.command_timeout_secs = file_config.command_timeout_secs;
        self.strict = file_config.strict;
        self.rc_marker = file_config.rc_marker;
        self.settings_path = file_config.settings_path;

        tracing::debug!(path = %self.config_file.display(), "loaded config file");
        Ok(self)
    }

    pub fn settings_file(&self) -> PathBuf {
        match &self.settings_path {
            Some(path) => PathBuf::from(shellexpand::tilde(path).to_string()),
            None => self.home_dir.join(".claude").join("settings.json"),
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Shell rc files older releases wrote credentials into
    pub fn shell_rc_files(&self) -> Vec<PathBuf> {
        vec![self.home_dir.join(".bashrc"), self.home_dir.join(".zshrc")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default_values() {
        let config = Config::with_dirs(PathBuf::from("/home/u"), PathBuf::from("/home/u/.config/claude-habitat"));
        assert_eq!(config.package_name, "claude-habitat");
        assert_eq!(config.npm, "npm");
        assert!(config.strict);
        assert_eq!(config.command_timeout(), Duration::from_secs(600));
        assert_eq!(config.state_file, PathBuf::from("/home/u/.config/claude-habitat/install.json"));
        assert_eq!(config.legacy_state_file, PathBuf::from("/home/u/.claude-habitat.json"));
        assert_eq!(config.settings_file(), PathBuf::from("/home/u/.claude/settings.json"));
    }

    #[test]
    fn test_overlay_reads_partial_file() {
        let temp = TempDir::new().unwrap();
        let habitat_dir = temp.path().join("habitat");
        std::fs::create_dir_all(&habitat_dir).unwrap();
        std::fs::write(
            habitat_dir.join("config.toml"),
            "strict = false\ncommand_timeout_secs = 30\nsettings_path = \"/tmp/settings.json\"\n",
        )
        .unwrap();

        let config = Config::with_dirs(temp.path().to_path_buf(), habitat_dir)
            .overlay_file()
            .unwrap();
        assert!(!config.strict);
        assert_eq!(config.command_timeout_secs, 30);
        assert_eq!(config.bin_name, "claude-habitat");
        assert_eq!(config.settings_file(), PathBuf::from("/tmp/settings.json"));
    }

    #[test]
    fn test_missing_file_is_not_created() {
        let temp = TempDir::new().unwrap();
        let habitat_dir = temp.path().join("habitat");
        let config = Config::with_dirs(temp.path().to_path_buf(), habitat_dir.clone())
            .overlay_file()
            .unwrap();
        assert!(!config.config_file.exists());
        assert!(!habitat_dir.exists());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let habitat_dir = temp.path().to_path_buf();
        std::fs::write(habitat_dir.join("config.toml"), "strict = \"maybe\"").unwrap();
        let result = Config::with_dirs(temp.path().to_path_buf(), habitat_dir).overlay_file();
        assert!(result.is_err());
    }
}
