use serde_json::{Value, json};

use crate::api::{Changes, HttpClient, ResourceClient};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::controller::execute;
use crate::error::{LabdeskError, Result};
use crate::resources::{Resource, ResourceKind};
use crate::with_resource;

use super::{CommandOutput, action_result, configured_screen};

/// Value of a `--set key=value` argument.
///
/// `true`, `false`, `null` and JSON objects or arrays are sent as JSON.
/// Everything else, numbers included, is sent as text: identity numbers
/// and codes must keep their leading zeros.
pub fn parse_field_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    let looks_like_json = matches!(trimmed, "true" | "false" | "null")
        || trimmed.starts_with('{')
        || trimmed.starts_with('[');
    if looks_like_json && let Ok(value) = serde_json::from_str(trimmed) {
        return value;
    }
    Value::String(raw.to_string())
}

pub async fn cmd_create(
    kind: ResourceKind,
    fields: Vec<(String, String)>,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let client = HttpClient::from_config(&config)?;
    let draft: Changes = fields
        .into_iter()
        .map(|(key, value)| (key, parse_field_value(&value)))
        .collect();
    with_resource!(kind, R => create_record::<R, _>(&client, &config, draft, output).await)
}

/// Validate and create a record, printing the server's copy
pub async fn create_record<R, C>(
    client: &C,
    config: &Config,
    draft: Changes,
    output: OutputOptions,
) -> Result<()>
where
    R: Resource,
    C: ResourceClient<R>,
{
    let mut screen = configured_screen::<R>(config, None, &[], Some(Vec::new()));
    let command = screen.create(draft)?;
    let completion = execute(client, command).await;
    screen.apply(completion);
    action_result(&screen)?;

    let Some(created) = screen.state().items.first() else {
        return Err(LabdeskError::Other(
            "the server did not return the created record".to_string(),
        ));
    };
    let message = screen
        .notice()
        .map(|n| n.message.clone())
        .unwrap_or_default();

    CommandOutput::new(json!({
        "action": "create",
        "resource": R::COLLECTION,
        "id": created.id(),
        "record": created,
    }))
    .with_text(format!("{message} ({} #{})", created.title(), created.id()))
    .print(output)
}
