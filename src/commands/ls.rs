use serde_json::json;

use crate::api::{HttpClient, ResourceClient};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::controller::execute;
use crate::display::{format_screen_status, record_table};
use crate::error::{LabdeskError, Result};
use crate::resources::{Resource, ResourceKind};
use crate::with_resource;

use super::{CommandOutput, configured_screen};

/// Options for `labdesk ls`
#[derive(Debug, Clone, Default)]
pub struct LsOptions {
    pub search: Option<String>,
    pub pages: u32,
    pub limit: Option<u32>,
    pub filters: Vec<(String, String)>,
}

pub async fn cmd_ls(kind: ResourceKind, options: LsOptions, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let client = HttpClient::from_config(&config)?;
    with_resource!(kind, R => list_records::<R, _>(&client, &config, &options, output).await)
}

/// Load up to `options.pages` pages through a list screen and print them
pub async fn list_records<R, C>(
    client: &C,
    config: &Config,
    options: &LsOptions,
    output: OutputOptions,
) -> Result<()>
where
    R: Resource,
    C: ResourceClient<R>,
{
    let mut screen = configured_screen::<R>(config, options.limit, &options.filters, None);

    let first = match options.search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => screen.commit_search(term),
        _ => None,
    };
    let mut next = Some(first.unwrap_or_else(|| screen.mount()));
    let mut loaded = 0;

    while let Some(command) = next.take() {
        let completion = execute(client, command).await;
        screen.apply(completion);
        if let Some(error) = &screen.state().error {
            return Err(LabdeskError::Other(error.clone()));
        }
        loaded += 1;
        if loaded < options.pages.max(1) {
            next = screen.load_more();
        }
    }

    let view = screen.view();
    let records: Vec<&R> = view.rows.iter().map(|row| &row.record).collect();
    let json_output = json!({
        "resource": R::COLLECTION,
        "search": view.search_term,
        "total_count": view.total_count,
        "count": records.len(),
        "has_more": view.show_sentinel,
        "results": records,
    });

    let text = if view.rows.is_empty() {
        format_screen_status(&view)
    } else {
        format!("{}\n{}", record_table(&view.rows), format_screen_status(&view))
    };

    CommandOutput::new(json_output).with_text(text).print(output)
}
