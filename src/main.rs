use clap::Parser;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use labdesk::cli::{Cli, Commands, ConfigAction, OutputOptions};
use labdesk::commands::{
    LsOptions, cmd_browse, cmd_config_get, cmd_config_set, cmd_config_show, cmd_create, cmd_ls,
    cmd_rm, cmd_set_active, cmd_show,
};

/// Diagnostics go to stderr so `--json` output on stdout stays parseable.
/// `RUST_LOG` overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ls {
            resource,
            search,
            pages,
            limit,
            filters,
            json,
        } => {
            cmd_ls(
                resource,
                LsOptions {
                    search,
                    pages,
                    limit,
                    filters,
                },
                OutputOptions { json },
            )
            .await
        }
        Commands::Show {
            resource,
            id,
            history,
            json,
        } => cmd_show(resource, id, history, OutputOptions { json }).await,
        Commands::Create {
            resource,
            fields,
            json,
        } => cmd_create(resource, fields, OutputOptions { json }).await,
        Commands::SetActive {
            resource,
            id,
            active,
            json,
        } => cmd_set_active(resource, id, active, OutputOptions { json }).await,
        Commands::Rm { resource, id, json } => cmd_rm(resource, id, OutputOptions { json }).await,
        Commands::Browse { resource } => cmd_browse(resource).await,
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => cmd_config_show(OutputOptions { json }),
            ConfigAction::Set { key, value, json } => {
                cmd_config_set(&key, &value, OutputOptions { json })
            }
            ConfigAction::Get { key, json } => cmd_config_get(&key, OutputOptions { json }),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
