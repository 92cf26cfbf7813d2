use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::captions::DEFAULT_LANGUAGES;
use crate::formatter::openai::DEFAULT_BASE_URL;
use crate::utils::mask_secret;

/// Placeholder used when `SECRET_KEY` is not set
pub const DEFAULT_SECRET_KEY: &str = "default-secret-key";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Language model settings
    pub openai: OpenAiConfig,

    /// Caption retrieval settings
    pub captions: CaptionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Session signing secret, only ever read from the environment
    #[serde(skip, default = "default_secret_key")]
    pub secret_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base URL (override for proxies or compatible gateways)
    pub base_url: String,

    /// API credential, only ever read from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Caption languages in order of preference
    pub languages: Vec<String>,

    /// Keep inline formatting tags such as `<i>` in caption text
    pub preserve_formatting: bool,
}

fn default_secret_key() -> String {
    DEFAULT_SECRET_KEY.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            secret_key: default_secret_key(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.iter().map(|l| l.to_string()).collect(),
            preserve_formatting: true,
        }
    }
}

impl Config {
    /// Load configuration from file (or defaults), then apply environment overrides
    pub fn load() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let mut config = match Self::config_path() {
            Ok(config_path) if config_path.exists() => {
                let content = fs_err::read_to_string(&config_path)
                    .context("Failed to read config file")?;

                serde_yaml::from_str::<Config>(&content)
                    .context("Failed to parse config file")?
            }
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides looked up through `var`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        // FLASK_SECRET_KEY is the name older deployments use
        if let Some(secret) = var("SECRET_KEY").or_else(|| var("FLASK_SECRET_KEY")) {
            self.server.secret_key = secret;
        }
        if let Some(base_url) = var("OPENAI_BASE_URL") {
            self.openai.base_url = base_url;
        }
        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PORT") {
            self.server.port = port.parse().context("PORT must be a valid number")?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("transcript-formatter").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.captions.languages.is_empty() {
            anyhow::bail!("At least one caption language must be configured");
        }

        url::Url::parse(&self.openai.base_url)
            .with_context(|| format!("Invalid OpenAI base URL: {}", self.openai.base_url))?;

        self.bind_address()?;
        Ok(())
    }

    /// Socket address the server listens on
    pub fn bind_address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.server.host, self.server.port))
    }

    pub fn uses_default_secret(&self) -> bool {
        self.server.secret_key == DEFAULT_SECRET_KEY
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Listen Address: {}:{}", self.server.host, self.server.port);
        println!(
            "  Secret Key: {}",
            if self.uses_default_secret() {
                "(default placeholder)".to_string()
            } else {
                mask_secret(&self.server.secret_key)
            }
        );
        println!("  OpenAI Base URL: {}", self.openai.base_url);
        println!(
            "  OpenAI API Key: {}",
            self.openai
                .api_key
                .as_deref()
                .map(mask_secret)
                .unwrap_or_else(|| "(not configured)".to_string())
        );
        println!("  Caption Languages: {}", self.captions.languages.join(", "));
        println!("  Preserve Formatting: {}", self.captions.preserve_formatting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.captions.languages, vec!["en", "es", "fr"]);
        assert!(config.captions.preserve_formatting);
        assert!(config.openai.api_key.is_none());
        assert!(config.uses_default_secret());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("OPENAI_API_KEY", "sk-live"),
                ("SECRET_KEY", "s3cret"),
                ("PORT", "8080"),
                ("HOST", "0.0.0.0"),
            ]))
            .unwrap();

        assert_eq!(config.openai.api_key.as_deref(), Some("sk-live"));
        assert_eq!(config.server.secret_key, "s3cret");
        assert!(!config.uses_default_secret());
        assert_eq!(config.bind_address().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_legacy_secret_variable() {
        let mut config = Config::default();
        config.apply_env(env(&[("FLASK_SECRET_KEY", "legacy")])).unwrap();
        assert_eq!(config.server.secret_key, "legacy");

        let mut config = Config::default();
        config
            .apply_env(env(&[("FLASK_SECRET_KEY", "legacy"), ("SECRET_KEY", "current")]))
            .unwrap();
        assert_eq!(config.server.secret_key, "current");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.openai.api_key.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str("captions:\n  languages: [de, en]\n").unwrap();
        assert_eq!(config.captions.languages, vec!["de", "en"]);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.secret_key, DEFAULT_SECRET_KEY);
    }

    #[test]
    fn test_secrets_never_serialized() {
        let mut config = Config::default();
        config.openai.api_key = Some("sk-live".to_string());
        config.server.secret_key = "s3cret".to_string();

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-live"));
        assert!(!yaml.contains("s3cret"));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.captions.languages.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.openai.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
