use clap::{Parser, Subcommand};

use crate::error::{LabdeskError, Result};
use crate::resources::ResourceKind;

#[derive(Parser)]
#[command(name = "labdesk")]
#[command(about = "Administration console for the laboratory information system")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output flags shared by every command
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List records of a resource
    #[command(visible_alias = "l")]
    Ls {
        resource: ResourceKind,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Number of pages to load (default: 1)
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        /// Records per page (default: from config)
        #[arg(long)]
        limit: Option<u32>,

        /// Extra query filter, e.g. --filter is_active=true
        #[arg(short, long = "filter", value_parser = parse_key_value)]
        filters: Vec<(String, String)>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one record with its audit trail
    #[command(visible_alias = "s")]
    Show {
        resource: ResourceKind,
        id: i64,

        /// Include the change history
        #[arg(long)]
        history: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a record from field values
    Create {
        resource: ResourceKind,

        /// Field value, e.g. --set first_name=Ana. true, false, null and JSON
        /// objects or arrays are sent as JSON; anything else as text.
        #[arg(long = "set", value_parser = parse_key_value, required = true)]
        fields: Vec<(String, String)>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Activate or deactivate a record
    SetActive {
        resource: ResourceKind,
        id: i64,
        #[arg(action = clap::ArgAction::Set)]
        active: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a record (deactivates resources that soft-delete)
    Rm {
        resource: ResourceKind,
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive list: each input line edits the search
    ///
    /// Commands: `:more` loads the next page, `:retry` reloads after an
    /// error, `:refresh` reloads page one, `:quit` exits.
    Browse { resource: ResourceKind },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (api.url, api.token, page_size, ...)
        key: String,
        /// Value to set
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse `key=value`
pub fn parse_key_value(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(LabdeskError::Other(format!(
            "invalid '{s}': expected key=value"
        ))),
    }
}
