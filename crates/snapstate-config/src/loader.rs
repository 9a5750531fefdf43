use std::path::{Path, PathBuf};

use snapstate_common::{Error, Result};
use tracing::info;

use crate::model::AppConfig;

/// Looked up in this order; the first one present is used.
const CONFIG_FILES: [&str; 2] = ["config.yml", "config.toml"];

pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Result<Self> {
        let config_dir = Self::default_config_dir();
        Ok(Self { config_dir })
    }

    pub fn default_config_dir() -> PathBuf {
        pick_config_dir(
            dirs::config_dir().map(|c| c.join("snapstate")),
            dirs::home_dir().map(|h| h.join(".snapstate")),
        )
    }

    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// The config file in effect, if any.
    pub fn config_file(&self) -> Option<PathBuf> {
        CONFIG_FILES
            .iter()
            .map(|name| self.config_dir.join(name))
            .find(|path| path.exists())
    }

    pub fn config_file_exists(&self) -> bool {
        self.config_file().is_some()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let Some(path) = self.config_file() else {
            info!("no config file in {}, using defaults", self.config_dir.display());
            return Ok(AppConfig::default());
        };

        info!("loading config from {}", path.display());
        let contents = std::fs::read_to_string(&path)?;
        if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
        } else {
            serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
        }
    }

    pub fn ensure_dirs(&self, config: &AppConfig) -> Result<()> {
        let dirs = [self.config_dir.clone(), config.data_dir(&self.config_dir)];

        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }

        Ok(())
    }
}

/// `xdg` unless it is missing on disk while an older `~/.snapstate` is there.
fn pick_config_dir(xdg: Option<PathBuf>, dotdir: Option<PathBuf>) -> PathBuf {
    let xdg_present = xdg.as_ref().is_some_and(|dir| dir.exists());
    match dotdir {
        Some(dotdir) if !xdg_present && dotdir.exists() => dotdir,
        dotdir => xdg.or(dotdir).unwrap_or_else(|| PathBuf::from(".snapstate")),
    }
}
