//! Command implementations behind the `labdesk` binary.

mod browse;
mod config;
mod create;
mod ls;
mod rm;
mod set_active;
mod show;

pub use browse::{BrowseInput, browse_screen, cmd_browse, parse_browse_input};
pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use create::{cmd_create, create_record, parse_field_value};
pub use ls::{LsOptions, cmd_ls, list_records};
pub use rm::{cmd_rm, remove_record};
pub use set_active::{cmd_set_active, set_record_active};
pub use show::{cmd_show, show_record};

use serde_json::Value;

use crate::cli::OutputOptions;
use crate::config::Config;
use crate::controller::{FetchController, ListScreen, NoticeLevel};
use crate::error::{LabdeskError, Result};
use crate::resources::Resource;

/// A command result rendered as JSON or as text
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn print(self, output: OutputOptions) -> Result<()> {
        if output.json || self.text.is_none() {
            return print_json(&self.json);
        }
        if let Some(text) = self.text {
            println!("{text}");
        }
        Ok(())
    }
}

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A screen configured from `config`: page size, filters and debounce
pub(crate) fn configured_screen<R: Resource>(
    config: &Config,
    limit: Option<u32>,
    filters: &[(String, String)],
    items: Option<Vec<R>>,
) -> ListScreen<R> {
    let fetch = filters.iter().fold(
        FetchController::new(limit.unwrap_or_else(|| config.page_size())),
        |fetch, (key, value)| fetch.with_filter(key.as_str(), value.as_str()),
    );
    let screen = match items {
        Some(items) => ListScreen::from_records(fetch, items),
        None => ListScreen::new(fetch),
    };
    match config.search_debounce() {
        Some(delay) => screen.with_debounce(delay),
        None => screen,
    }
}

/// Turn an error notice left by the last action into a command failure
pub(crate) fn action_result<R: Resource>(screen: &ListScreen<R>) -> Result<()> {
    let Some(notice) = screen.notice() else {
        return Ok(());
    };
    if notice.level != NoticeLevel::Error {
        return Ok(());
    }
    if let Some(fields) = screen.form_errors() {
        for (field, messages) in fields.iter() {
            eprintln!("  {field}: {}", messages.join(" "));
        }
    }
    Err(LabdeskError::Other(notice.message.clone()))
}
