//! Configuration loading and persistence
//!
//! The configuration is a small JSON file holding the two input method ids.
//! Saving keeps a `.backup` copy of the previous version next to it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Used when no configuration has been stored yet
pub const DEFAULT_PRIMARY_IM: &str = "com.apple.keylayout.ABC";
pub const DEFAULT_SECONDARY_IM: &str = "com.tencent.inputmethod.wetype.pinyin";

/// Input methods to switch between
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Input method for Vim-style normal mode (Escape goes here)
    pub primary_im: String,

    /// Input method a Shift tap toggles to
    pub secondary_im: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_im: DEFAULT_PRIMARY_IM.to_string(),
            secondary_im: DEFAULT_SECONDARY_IM.to_string(),
        }
    }
}

/// Which of the two configured input methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Role {
    Primary,
    Secondary,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Secondary => write!(f, "secondary"),
        }
    }
}

impl Config {
    /// Replace the input method for `role`
    pub fn set(&mut self, role: Role, id: impl Into<String>) {
        match role {
            Role::Primary => self.primary_im = id.into(),
            Role::Secondary => self.secondary_im = id.into(),
        }
    }
}

/// Errors loading, validating or saving the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("HOME is not set")]
    NoHome,

    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not valid: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("input method '{id}' not found. Use 'mac-vim-switch list' to see available methods")]
    UnknownInputMethod { id: String },
}

/// Per-user file locations
#[derive(Debug, Clone)]
pub struct Paths {
    /// `~/.config/mac-vim-switch/config.json`
    pub config_file: PathBuf,

    /// `~/.mac-vim-switch.log`
    pub log_file: PathBuf,
}

impl Paths {
    /// Resolve paths under the user's home directory
    pub fn from_env() -> Result<Self, ConfigError> {
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::NoHome)?;
        Ok(Self::under(Path::new(&home)))
    }

    /// Resolve paths under an explicit home directory
    pub fn under(home: &Path) -> Self {
        Self {
            config_file: home
                .join(".config")
                .join("mac-vim-switch")
                .join("config.json"),
            log_file: home.join(".mac-vim-switch.log"),
        }
    }
}

/// Stored configuration, or the defaults when it cannot be located or read
pub fn load_or_default(paths: Result<&Paths, &ConfigError>) -> Config {
    match paths {
        Ok(paths) => ConfigStore::new(&paths.config_file).load_or_default(),
        Err(e) => {
            warn!(error = %e, "cannot locate config, using default settings");
            Config::default()
        }
    }
}

/// Reads and writes the configuration file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file holding the previous version
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".backup");
        PathBuf::from(name)
    }

    /// Load the configuration, writing the defaults on first run
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.path.exists() {
            let config = Config::default();
            self.save(&config)?;
            info!(path = ?self.path, "created default configuration");
            return Ok(config);
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Load the configuration, falling back to the defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "failed to load config, using default settings");
                Config::default()
            }
        }
    }

    /// Write the configuration, backing up the current file first
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }

        if self.path.exists() {
            if let Err(e) = fs::copy(&self.path, self.backup_path()) {
                warn!(error = %e, "failed to backup config");
            }
        }

        let content = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, content).map_err(|e| self.io_error(e))?;

        info!(path = ?self.path, "configuration saved");
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(Paths::under(dir.path()).config_file)
    }

    #[test]
    fn test_paths_under_home() {
        let paths = Paths::under(Path::new("/Users/me"));
        assert_eq!(
            paths.config_file,
            PathBuf::from("/Users/me/.config/mac-vim-switch/config.json")
        );
        assert_eq!(paths.log_file, PathBuf::from("/Users/me/.mac-vim-switch.log"));
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let config = store.load().unwrap();
        assert_eq!(config, Config::default());
        assert!(store.path().exists());
        assert!(!store.backup_path().exists());
    }

    #[test]
    fn test_file_format() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains(r#""primary_im":"com.apple.keylayout.ABC""#));
        assert!(json.contains(r#""secondary_im":"com.tencent.inputmethod.wetype.pinyin""#));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut config = Config::default();
        config.set(Role::Secondary, "com.apple.inputmethod.SCIM.ITABC");
        store.save(&config).unwrap();

        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_save_writes_backup_of_previous() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&Config::default()).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let mut config = Config::default();
        config.set(Role::Primary, "com.apple.keylayout.US");
        store.save(&config).unwrap();

        assert_eq!(fs::read_to_string(store.backup_path()).unwrap(), before);
        assert_eq!(
            store.backup_path().file_name().unwrap(),
            "config.json.backup"
        );
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.load(), Err(ConfigError::Json { .. })));
        assert_eq!(store.load_or_default(), Config::default());
        // The broken file is left for the user to inspect
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{not json");
    }

    #[test]
    fn test_missing_home_uses_defaults() {
        assert_eq!(load_or_default(Err(&ConfigError::NoHome)), Config::default());
    }

    #[test]
    fn test_load_or_default_reads_stored_config() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::under(dir.path());
        let mut config = Config::default();
        config.set(Role::Primary, "com.apple.keylayout.US");
        ConfigStore::new(&paths.config_file).save(&config).unwrap();

        assert_eq!(load_or_default(Ok(&paths)), config);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Primary.to_string(), "primary");
        assert_eq!(Role::Secondary.to_string(), "secondary");
    }
}
