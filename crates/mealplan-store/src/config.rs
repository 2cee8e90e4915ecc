use std::env;
use std::path::PathBuf;

use crate::plan_store::{PlanStore, STORAGE_KEY};
use crate::storage::FileStore;

/// Storage configuration.
///
/// Reads the data directory from `MEALPLAN_DATA_DIR`, falling back to the
/// XDG data directory when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding one JSON file per storage key.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Environment variable that overrides the data directory.
    pub const DATA_DIR_ENV: &str = "MEALPLAN_DATA_DIR";

    /// Build a config from the environment.
    ///
    /// Priority: `MEALPLAN_DATA_DIR`, then [`Self::default_data_dir`].
    pub fn from_env() -> Self {
        let data_dir = env::var_os(Self::DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_data_dir);
        Self { data_dir }
    }

    /// Build a config from an explicit directory (tests and CLI flags).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// `$XDG_DATA_HOME/mealplan`, or `~/.local/share/mealplan`.
    ///
    /// Follows the XDG layout on every platform, like the config file does.
    pub fn default_data_dir() -> PathBuf {
        if let Some(xdg) = env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("mealplan");
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".local")
            .join("share")
            .join("mealplan")
    }

    /// Path of the stored plan document.
    pub fn plan_file(&self) -> PathBuf {
        self.data_dir.join(format!("{STORAGE_KEY}.json"))
    }

    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }

    /// Open the plan store backed by this data directory.
    pub fn open_store(&self) -> PlanStore<FileStore> {
        PlanStore::open(self.file_store())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
