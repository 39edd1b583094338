use serde_json::json;

use crate::api::{HttpClient, ResourceClient};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::controller::execute;
use crate::error::{LabdeskError, Result};
use crate::resources::{Resource, ResourceKind};
use crate::types::RecordId;
use crate::with_resource;

use super::{CommandOutput, action_result, configured_screen};

pub async fn cmd_rm(kind: ResourceKind, id: RecordId, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let client = HttpClient::from_config(&config)?;
    with_resource!(kind, R => remove_record::<R, _>(&client, &config, id, output).await)
}

/// Delete a record; soft-delete resources end up inactive instead
pub async fn remove_record<R, C>(
    client: &C,
    config: &Config,
    id: RecordId,
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
    let title = record.title();
    let mut screen = configured_screen::<R>(config, None, &[], Some(vec![record]));

    let command = screen.delete(id)?;
    let completion = execute(client, command).await;
    screen.apply(completion);
    action_result(&screen)?;

    let remaining = screen.state().get(id);
    let message = screen
        .notice()
        .map(|n| n.message.clone())
        .unwrap_or_default();

    CommandOutput::new(json!({
        "action": "delete",
        "resource": R::COLLECTION,
        "id": id,
        "soft_deleted": remaining.is_some(),
        "is_active": remaining.and_then(|r| r.is_active()),
    }))
    .with_text(format!("{message} ({title} #{id})"))
    .print(output)
}
