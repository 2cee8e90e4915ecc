//! Configuration file management for mealplan.
//!
//! Provides a TOML-based config file at `~/.config/mealplan/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mealplan_core::RecipeApiConfig;
use mealplan_store::StoreConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub recipes: RecipesSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageSection {
    /// Directory holding `mealPlan.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecipesSection {
    /// Base URL of the TheMealDB-compatible API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the mealplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/mealplan` or
/// `~/.config/mealplan`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("mealplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mealplan")
}

/// Return the path to the mealplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. `Ok(None)` when it does not exist.
pub fn load_config() -> Result<Option<ConfigFile>> {
    load_config_from(&config_path())
}

fn load_config_from(path: &Path) -> Result<Option<ConfigFile>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }
    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct MealplanConfig {
    pub store: StoreConfig,
    pub recipes: RecipeApiConfig,
}

impl MealplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Data dir: `cli_data_dir` > `MEALPLAN_DATA_DIR` > `storage.data_dir` > XDG data dir
    /// - API base: `cli_api_base` > `MEALPLAN_RECIPE_API` > `recipes.api_base` > TheMealDB
    /// - Timeout: `recipes.timeout_secs` > 10s
    pub fn resolve(cli_data_dir: Option<&Path>, cli_api_base: Option<&str>) -> Result<Self> {
        let file_config = load_config()?.unwrap_or_default();
        Ok(Self::resolve_with(file_config, cli_data_dir, cli_api_base))
    }

    fn resolve_with(
        file_config: ConfigFile,
        cli_data_dir: Option<&Path>,
        cli_api_base: Option<&str>,
    ) -> Self {
        let data_dir = if let Some(dir) = cli_data_dir {
            dir.to_path_buf()
        } else if let Some(dir) = std::env::var_os(StoreConfig::DATA_DIR_ENV) {
            PathBuf::from(dir)
        } else if let Some(dir) = file_config.storage.data_dir {
            dir
        } else {
            StoreConfig::default_data_dir()
        };

        let api_base = if let Some(url) = cli_api_base {
            url.to_string()
        } else if let Ok(url) = std::env::var(RecipeApiConfig::BASE_URL_ENV) {
            url
        } else if let Some(url) = file_config.recipes.api_base {
            url
        } else {
            RecipeApiConfig::DEFAULT_BASE_URL.to_string()
        };

        let timeout = file_config
            .recipes
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(RecipeApiConfig::DEFAULT_TIMEOUT);

        Self {
            store: StoreConfig::new(data_dir),
            recipes: RecipeApiConfig::new(api_base).with_timeout(timeout),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
