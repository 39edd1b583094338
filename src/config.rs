//! Top-level application configuration.
//!
//! Configuration is stored in `.labdesk/config.yaml` and includes:
//! - The API base URL and token
//! - Page size, search debounce and request timeout

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::DEFAULT_PAGE_SIZE;
use crate::error::{LabdeskError, Result};

/// Returns the labdesk root directory, honoring `LABDESK_ROOT`.
pub fn labdesk_root() -> PathBuf {
    match env::var("LABDESK_ROOT") {
        Ok(root) if !root.is_empty() => PathBuf::from(root),
        _ => PathBuf::from(".labdesk"),
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    /// Records per page (default: 20)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default, skip_serializing_if = "SearchConfig::is_default")]
    pub search: SearchConfig,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            page_size: default_page_size(),
            search: SearchConfig::default(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_request_timeout() -> u64 {
    30
}

fn default_auth_scheme() -> String {
    "Bearer".to_string()
}

/// API connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Authorization scheme placed before the token (default: Bearer)
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            auth_scheme: default_auth_scheme(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("auth_scheme", &self.auth_scheme)
            .finish()
    }
}

/// Search settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Overrides each resource's own debounce delay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
}

impl SearchConfig {
    pub fn is_default(&self) -> bool {
        self.debounce_ms.is_none()
    }
}

/// Keys accepted by `config set`
pub const CONFIG_KEYS: [&str; 6] = [
    "api.url",
    "api.token",
    "api.auth_scheme",
    "page_size",
    "search.debounce_ms",
    "request_timeout",
];

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        labdesk_root().join("config.yaml")
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            LabdeskError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {e}", path.display()),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LabdeskError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {e}",
                        parent.display()
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            LabdeskError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {e}", path.display()),
            ))
        })?;

        // Owner read/write only; the file holds the API token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, permissions).map_err(|e| {
                LabdeskError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to set permissions on config at {}: {e}", path.display()),
                ))
            })?;
        }

        Ok(())
    }

    /// API base URL from environment or config file
    pub fn api_url(&self) -> Option<String> {
        if let Ok(url) = env::var("LABDESK_API_URL")
            && !url.is_empty()
        {
            return Some(url);
        }
        self.api.url.clone().filter(|url| !url.is_empty())
    }

    /// API token from environment or config file
    pub fn api_token(&self) -> Option<String> {
        if let Ok(token) = env::var("LABDESK_API_TOKEN")
            && !token.is_empty()
        {
            return Some(token);
        }
        self.api.token.clone().filter(|token| !token.is_empty())
    }

    pub fn auth_scheme(&self) -> &str {
        &self.api.auth_scheme
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.max(1)
    }

    /// Debounce override, if configured
    pub fn search_debounce(&self) -> Option<Duration> {
        self.search.debounce_ms.map(Duration::from_millis)
    }

    /// Set a value by its dotted key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.url" => {
                url::Url::parse(value)?;
                self.api.url = Some(value.to_string());
            }
            "api.token" => self.api.token = Some(value.to_string()),
            "api.auth_scheme" => {
                if value.trim().is_empty() || value.contains(char::is_whitespace) {
                    return Err(LabdeskError::Config(format!(
                        "invalid value '{value}' for api.auth_scheme. Expected a single word such as Bearer or Token"
                    )));
                }
                self.api.auth_scheme = value.to_string();
            }
            "page_size" => self.page_size = parse_positive(key, value)? as u32,
            "search.debounce_ms" => self.search.debounce_ms = Some(parse_number(key, value)?),
            "request_timeout" => self.request_timeout = parse_positive(key, value)?,
            _ => {
                return Err(LabdeskError::Config(format!(
                    "unknown config key '{key}'. Valid keys: {}",
                    CONFIG_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value.parse::<u64>().map_err(|_| {
        LabdeskError::Config(format!(
            "invalid value '{value}' for {key}. Expected a non-negative integer"
        ))
    })
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match parse_number(key, value)? {
        0 => Err(LabdeskError::Config(format!(
            "invalid value '{value}' for {key}. Expected a positive integer"
        ))),
        n if n > u32::MAX as u64 => Err(LabdeskError::Config(format!(
            "invalid value '{value}' for {key}. Number is too large"
        ))),
        n => Ok(n),
    }
}

/// Mask a sensitive value by showing only the first 2 and last 2 characters
pub fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}
