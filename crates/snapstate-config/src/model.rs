use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state: StateConfig::default(),
            data_dir: None,
            log_level: Some("info".to_string()),
        }
    }
}

impl AppConfig {
    /// Directory holding the snapshot, `<config_dir>/data` unless configured.
    pub fn data_dir(&self, config_dir: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| config_dir.join("data"))
    }

    /// Effective snapshot location for the configured backend.
    pub fn state_path(&self, config_dir: &Path) -> PathBuf {
        match &self.state.path {
            Some(path) => path.clone(),
            None => self
                .data_dir(config_dir)
                .join(self.state.backend.default_file_name()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub backend: StateBackend,

    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Keep a copy of a snapshot that cannot be restored instead of letting
    /// the fresh session overwrite it.
    #[serde(default = "default_quarantine")]
    pub quarantine_unrestorable: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::default(),
            path: None,
            quarantine_unrestorable: default_quarantine(),
        }
    }
}

fn default_quarantine() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    /// Pretty-printed JSON file.
    #[default]
    File,
    /// Single-table SQLite database.
    Sqlite,
}

impl StateBackend {
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Self::File => "state.json",
            Self::Sqlite => "state.db",
        }
    }
}
