use owo_colors::OwoColorize;
use serde_json::{Value, json};

use crate::api::{HttpClient, ResourceClient};
use crate::audit::{DEFAULT_HISTORY_CAP, history_listing, render_record_audit};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::display::{format_active, format_audit_lines, format_history};
use crate::error::Result;
use crate::resources::{Resource, ResourceKind};
use crate::types::RecordId;
use crate::with_resource;

use super::CommandOutput;

/// Keys rendered through the audit section instead of as plain fields
const AUDIT_KEYS: [&str; 4] = ["created_by", "created_at", "last_change", "history"];

pub async fn cmd_show(
    kind: ResourceKind,
    id: RecordId,
    history: bool,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let client = HttpClient::from_config(&config)?;
    with_resource!(kind, R => show_record::<R, _>(&client, id, history, output).await)
}

pub async fn show_record<R, C>(
    client: &C,
    id: RecordId,
    history: bool,
    output: OutputOptions,
) -> Result<()>
where
    R: Resource,
    C: ResourceClient<R>,
{
    let record = client.fetch_one(id).await?;
    let summary = record.audit().and_then(render_record_audit);
    let listing = if history {
        record
            .audit()
            .and_then(|audit| audit.history.as_deref())
            .map(|entries| history_listing(entries, DEFAULT_HISTORY_CAP))
    } else {
        None
    };

    let json_output = json!({
        "record": &record,
        "audit": &summary,
        "history": &listing,
    });

    let mut text = format!("{}\n", record.title().bold());
    if let Some(subtitle) = record.subtitle() {
        text.push_str(&format!("{}\n", subtitle.dimmed()));
    }
    text.push('\n');
    text.push_str(&format!("{}: {}\n", "id".cyan(), record.id()));
    if record.is_active().is_some() {
        text.push_str(&format!("{}: {}\n", "status".cyan(), format_active(record.is_active())));
    }
    if let Value::Object(fields) = serde_json::to_value(&record)? {
        for (key, value) in fields {
            if key == "id" || key == "is_active" || AUDIT_KEYS.contains(&key.as_str()) {
                continue;
            }
            let shown = match value {
                Value::Null => continue,
                Value::String(s) => s,
                other => other.to_string(),
            };
            text.push_str(&format!("{}: {shown}\n", key.cyan()));
        }
    }

    if let Some(summary) = &summary {
        text.push('\n');
        for line in format_audit_lines(summary) {
            text.push_str(&format!("{}\n", line.dimmed()));
        }
    }

    if let Some(listing) = &listing {
        text.push_str(&format!("\n{}\n", "History:".cyan().bold()));
        if listing.entries.is_empty() {
            text.push_str(&format!("{}\n", "No changes recorded.".dimmed()));
        } else {
            text.push_str(&format_history(listing));
        }
    }

    CommandOutput::new(json_output)
        .with_text(text.trim_end())
        .print(output)
}
