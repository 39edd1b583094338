use serde_json::json;

use crate::api::{HttpClient, ResourceClient};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::controller::execute;
use crate::display::format_active;
use crate::error::{LabdeskError, Result};
use crate::resources::{Resource, ResourceKind};
use crate::types::RecordId;
use crate::with_resource;

use super::{CommandOutput, action_result, configured_screen};

pub async fn cmd_set_active(
    kind: ResourceKind,
    id: RecordId,
    active: bool,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    let client = HttpClient::from_config(&config)?;
    with_resource!(kind, R => set_record_active::<R, _>(&client, &config, id, active, output).await)
}

/// Toggle a record's active flag through the optimistic update path
pub async fn set_record_active<R, C>(
    client: &C,
    config: &Config,
    id: RecordId,
    active: bool,
    output: OutputOptions,
) -> Result<()>
where
    R: Resource,
    C: ResourceClient<R>,
{
    if R::READ_ONLY {
        return Err(LabdeskError::ReadOnly(R::LABEL));
    }
    let record = client.fetch_one(id).await?;
    let mut screen = configured_screen::<R>(config, None, &[], Some(vec![record]));

    let changed = match screen.set_active(id, active)? {
        Some(command) => {
            let completion = execute(client, command).await;
            screen.apply(completion);
            action_result(&screen)?;
            true
        }
        None => false,
    };

    let record = screen
        .state()
        .get(id)
        .ok_or(LabdeskError::RecordNotFound(id))?;
    let status = format_active(record.is_active());
    let text = if changed {
        format!("{} #{id} is now {status}", record.title())
    } else {
        format!("{} #{id} is already {status}", record.title())
    };

    CommandOutput::new(json!({
        "action": "set_active",
        "resource": R::COLLECTION,
        "id": id,
        "is_active": record.is_active(),
        "changed": changed,
    }))
    .with_text(text)
    .print(output)
}
