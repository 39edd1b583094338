//! Configuration commands.
//!
//! - `config show`: Display current configuration
//! - `config set`: Set a configuration value
//! - `config get`: Print one configuration value

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::{CONFIG_KEYS, Config, mask_sensitive_value};
use crate::error::{LabdeskError, Result};

/// Effective value of a key, environment overrides included. Tokens are masked.
fn config_value(config: &Config, key: &str) -> Result<Option<String>> {
    let value = match key {
        "api.url" => config.api_url(),
        "api.token" => config.api_token().map(|t| mask_sensitive_value(&t)),
        "api.auth_scheme" => Some(config.auth_scheme().to_string()),
        "page_size" => Some(config.page_size().to_string()),
        "search.debounce_ms" => config.search.debounce_ms.map(|ms| ms.to_string()),
        "request_timeout" => Some(config.request_timeout().as_secs().to_string()),
        _ => {
            return Err(LabdeskError::Config(format!(
                "unknown config key '{key}'. Valid keys: {}",
                CONFIG_KEYS.join(", ")
            )));
        }
    };
    Ok(value)
}

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;

    let api_url = config.api_url();
    let token = config.api_token().map(|t| mask_sensitive_value(&t));

    let json_output = json!({
        "api": {
            "url": api_url,
            "token_configured": token.is_some(),
            "auth_scheme": config.auth_scheme(),
        },
        "page_size": config.page_size(),
        "search": {
            "debounce_ms": config.search.debounce_ms,
        },
        "request_timeout": config.request_timeout().as_secs(),
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));

    text_output.push_str(&format!("{}:\n", "api".cyan()));
    match &api_url {
        Some(url) => text_output.push_str(&format!("  url: {url}\n")),
        None => text_output.push_str(&format!("  url: {}\n", "not configured".dimmed())),
    }
    match &token {
        Some(masked) => text_output.push_str(&format!("  token: {}\n", masked.green())),
        None => text_output.push_str(&format!("  token: {}\n", "not configured".dimmed())),
    }
    text_output.push_str(&format!("  auth_scheme: {}\n\n", config.auth_scheme()));

    text_output.push_str(&format!("{}: {}\n", "page_size".cyan(), config.page_size()));
    let debounce = match config.search.debounce_ms {
        Some(ms) => format!("{ms} ms"),
        None => "per resource".dimmed().to_string(),
    };
    text_output.push_str(&format!("{}: {debounce}\n", "search.debounce_ms".cyan()));
    text_output.push_str(&format!(
        "{}: {}s\n\n",
        "request_timeout".cyan(),
        config.request_timeout().as_secs()
    ));

    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    // Never echo the token back
    let shown = if key == "api.token" {
        mask_sensitive_value(value)
    } else {
        value.to_string()
    };

    CommandOutput::new(json!({
        "action": "config_set",
        "key": key,
        "value": shown,
        "success": true,
    }))
    .with_text(format!("Set {} to {shown}", key.cyan()))
    .print(output)
}

/// Get a specific configuration value
pub fn cmd_config_get(key: &str, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let Some(value) = config_value(&config, key)? else {
        return Err(LabdeskError::Config(format!("{key} not set")));
    };

    CommandOutput::new(json!({
        "key": key,
        "value": value,
        "masked": key == "api.token",
    }))
    .with_text(value)
    .print(output)
}
