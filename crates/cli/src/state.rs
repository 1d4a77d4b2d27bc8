use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "treeseal";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Defaults for the `sign` and `verify` commands. Command-line flags win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Submitter private key (PEM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,
    /// Submitter certificate (PEM), embedded into every sealed directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<PathBuf>,
    /// Trusted root certificate (PEM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cert_path: Option<PathBuf>,
    /// Maximum number of directories to seal; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_visits: Option<usize>,
    /// Verify in strict mode
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the treeseal directory (~/.treeseal)
    pub treeseal_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the treeseal directory path (custom or default ~/.treeseal)
    pub fn treeseal_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new treeseal state directory
    pub fn init(custom_path: Option<PathBuf>, config: AppConfig) -> Result<Self, StateError> {
        let treeseal_dir = Self::treeseal_dir(custom_path)?;

        if treeseal_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }
        fs::create_dir_all(&treeseal_dir)?;

        let config_path = treeseal_dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        Ok(Self {
            treeseal_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the treeseal directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let treeseal_dir = Self::treeseal_dir(custom_path)?;

        if !treeseal_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = treeseal_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            treeseal_dir,
            config_path,
            config,
        })
    }

    /// Load the configuration, falling back to defaults when no state
    /// directory has been initialized
    pub fn load_config(custom_path: Option<PathBuf>) -> Result<AppConfig, StateError> {
        match Self::load(custom_path) {
            Ok(state) => Ok(state.config),
            Err(StateError::NotInitialized) => {
                tracing::debug!("no treeseal directory, using default config");
                Ok(AppConfig::default())
            }
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("treeseal directory not initialized. Run 'treeseal init' first")]
    NotInitialized,

    #[error("treeseal directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
