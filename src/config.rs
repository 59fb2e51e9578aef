use anyhow::{anyhow, Context, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub use_mock: bool,
    #[serde(default = "default_true")]
    pub copy_to_clipboard: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            use_mock: false,
            copy_to_clipboard: true,
        }
    }
}

impl Config {
    /// Load configuration from file, environment variables, or create default
    pub fn load() -> Result<Self> {
        let mut config = Self::read_from(&Self::config_path()?)?.unwrap_or_else(|| {
            debug!("No config file found, using defaults");
            Self::default()
        });

        // Environment variables override config file
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if !api_key.trim().is_empty() {
                config.api_key = Some(api_key);
            }
        }

        if let Ok(base_url) = std::env::var("HEY_BASE_URL") {
            config.base_url = base_url;
        }

        if std::env::var("HEY_USE_MOCK").is_ok() {
            config.use_mock = true;
        }

        Ok(config)
    }

    /// Reads the config file at `path`. A missing file is `None`; a file that
    /// does not parse is an error.
    fn read_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Could not parse config file {}", path.display()))?;
        info!("Loaded config from: {}", path.display());
        Ok(Some(config))
    }

    /// Writes the config file. Values that came from the environment are
    /// written too, so callers only save after an explicit user action.
    pub fn save(&self) -> Result<()> {
        self.write_to(&Self::config_path()?)
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved config to: {}", path.display());
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".hey"))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Set API key and persist it. Only the key is taken from `self`; the
    /// rest of the file is reloaded so environment overrides are not baked in.
    pub fn set_api_key(&mut self, api_key: String) -> Result<()> {
        store_api_key(&Self::config_path()?, &api_key)?;
        self.api_key = Some(api_key);
        info!("API key saved to config file");
        Ok(())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn is_mock_mode(&self) -> bool {
        self.use_mock
    }

    pub fn show_config_info() -> Result<()> {
        let config_path = Self::config_path()?;
        println!("Configuration file: {}", config_path.display());

        if config_path.exists() {
            println!("Status: Found");
            let config = Self::read_from(&config_path)?.unwrap_or_default();
            let key_status = if config.api_key().is_some() { "Set" } else { "Not set" };
            println!("API Key: {}", key_status);
            println!("Base URL: {}", config.base_url);
            println!("Copy to clipboard: {}", config.copy_to_clipboard);
            println!("Mock mode: {}", config.use_mock);
        } else {
            println!("Status: Not found (using defaults)");
        }

        println!("\nTo set API key:");
        println!("  hey --set-api-key <your-key>");
        println!("\nOr set environment variable:");
        println!("  export OPENAI_API_KEY=<your-key>");

        Ok(())
    }
}

/// Updates the key in the config file at `path`, keeping its other settings.
/// A file that does not parse is left alone.
fn store_api_key(path: &Path, api_key: &str) -> Result<()> {
    let mut on_disk = Config::read_from(path)?.unwrap_or_default();
    on_disk.api_key = Some(api_key.to_string());
    on_disk.write_to(path)
}
