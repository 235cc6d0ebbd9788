use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::theme::Mode;
use crate::transport::{TransportConfig, DEFAULT_TIMEOUT};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub theme: Mode,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Persist only the theme, keeping whatever else the file holds.
    pub fn save_theme_to(path: &Path, mode: Mode) -> Result<()> {
        let mut config = Self::load_from(path).unwrap_or_else(|_| Self::new());
        config.theme = mode;
        config.save_to(path)
    }

    /// Overlay values given on the command line or in the environment.
    pub fn merge(
        mut self,
        endpoint_url: Option<String>,
        auth_token: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        if endpoint_url.is_some() {
            self.endpoint_url = endpoint_url;
        }
        if auth_token.is_some() {
            self.auth_token = auth_token;
        }
        if timeout_secs.is_some() {
            self.timeout_secs = timeout_secs;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Validate and build the transport settings.
    pub fn transport_config(&self) -> Result<TransportConfig> {
        let endpoint_url = self
            .endpoint_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("No endpoint URL configured. Set one with: chatline config --url <URL>"))?;

        Self::check_endpoint(endpoint_url)?;

        let auth_token = self
            .auth_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| anyhow!("No auth token configured. Set one with: chatline config --token <TOKEN>"))?;

        Ok(TransportConfig::new(endpoint_url, auth_token).with_timeout(self.timeout()))
    }

    /// An endpoint must be an absolute http(s) URL.
    pub fn check_endpoint(url: &str) -> Result<()> {
        let parsed = reqwest::Url::parse(url.trim())
            .with_context(|| format!("Invalid endpoint URL: {}", url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!(
                "Endpoint URL must use http or https, got: {}",
                parsed.scheme()
            ));
        }
        Ok(())
    }

    /// Token for display. Only tokens longer than eight characters keep their
    /// last four; shorter ones are hidden entirely.
    pub fn masked_token(&self) -> Option<String> {
        const MASK: &str = "********";
        const SHOWN: usize = 4;

        self.auth_token.as_ref().map(|token| {
            let chars: Vec<char> = token.chars().collect();
            if chars.len() <= MASK.len() {
                return MASK.to_string();
            }
            let tail: String = chars[chars.len() - SHOWN..].iter().collect();
            format!("{}{}", MASK, tail)
        })
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("chatline").join("config.json"))
    }
}
