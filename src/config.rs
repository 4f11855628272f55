use crate::auth::DEFAULT_AUTH_ENDPOINT;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_endpoint")]
    pub auth_endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_endpoint() -> String {
    DEFAULT_AUTH_ENDPOINT.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            auth_endpoint: default_endpoint(),
            api_key: String::new(),
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// Load from the user config dir; a missing file means defaults, a
    /// malformed one is a startup error. `DAYBOOK_API_KEY` and
    /// `DAYBOOK_AUTH_ENDPOINT` override the file.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) => Self::load_from(&path)?,
            None => AppConfig::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(AppConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("DAYBOOK_API_KEY") {
            if !key.is_empty() {
                self.api_key = key;
            }
        }
        if let Ok(endpoint) = std::env::var("DAYBOOK_AUTH_ENDPOINT") {
            if !endpoint.is_empty() {
                self.auth_endpoint = endpoint;
            }
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("daybook").join("config.toml"))
    }

    /// Where the key-value store and the log file live.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("daybook")
        })
    }
}
