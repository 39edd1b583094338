//! Line-driven list screen.
//!
//! Every input line is a search edit and goes through the debouncer like a
//! keystroke would. Lines starting with `:` are screen commands.

use std::io::Write;
use std::sync::Arc;

use owo_colors::OwoColorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::api::{HttpClient, ResourceClient};
use crate::config::Config;
use crate::controller::{IntersectionEntry, LoadPhase, ScreenDriver, ScreenEvent, ScreenView};
use crate::display::{format_notice, format_screen_status, record_table};
use crate::error::Result;
use crate::resources::{Resource, ResourceKind};
use crate::with_resource;

use super::configured_screen;

const BROWSE_HELP: &str =
    "type to search, :more next page, :retry, :refresh, :active <id> <true|false>, :rm <id>, :quit";

/// What one input line asks for
#[derive(Debug, Clone, PartialEq)]
pub enum BrowseInput {
    Search(String),
    More,
    Retry,
    Refresh,
    SetActive(i64, bool),
    Delete(i64),
    Quit,
    Unknown(String),
}

pub fn parse_browse_input(line: &str) -> BrowseInput {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        return BrowseInput::Search(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let parts: Vec<&str> = command.split_whitespace().collect();
    match parts.as_slice() {
        ["q"] | ["quit"] => BrowseInput::Quit,
        ["more"] => BrowseInput::More,
        ["retry"] => BrowseInput::Retry,
        ["refresh"] => BrowseInput::Refresh,
        ["active", id, value] => match (id.parse(), value.parse()) {
            (Ok(id), Ok(active)) => BrowseInput::SetActive(id, active),
            _ => BrowseInput::Unknown(trimmed.to_string()),
        },
        ["rm", id] => match id.parse() {
            Ok(id) => BrowseInput::Delete(id),
            Err(_) => BrowseInput::Unknown(trimmed.to_string()),
        },
        _ => BrowseInput::Unknown(trimmed.to_string()),
    }
}

pub async fn cmd_browse(kind: ResourceKind) -> Result<()> {
    let config = Config::load()?;
    let client = Arc::new(HttpClient::from_config(&config)?);
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = std::io::stdout();
    with_resource!(kind, R => browse_screen::<R, _, _, _>(client, &config, stdin, stdout).await)
}

/// Run an interactive screen fed by `input`, rendering to `out`.
///
/// At end of input the screen runs until nothing is pending, then exits.
pub async fn browse_screen<R, C, I, W>(
    client: Arc<C>,
    config: &Config,
    input: I,
    mut out: W,
) -> Result<()>
where
    R: Resource,
    C: ResourceClient<R> + 'static,
    I: AsyncBufRead + Unpin,
    W: Write,
{
    let screen = configured_screen::<R>(config, None, &[], None);
    let handle = ScreenDriver::new(screen, client).spawn();
    let mut view_rx = handle.view.clone();
    let mut lines = input.lines();
    let mut input_open = true;
    let mut last_rendered = String::new();

    writeln!(out, "{}", BROWSE_HELP.dimmed())?;

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    input_open = false;
                    if is_settled(&view_rx.borrow()) {
                        break;
                    }
                    continue;
                };
                let event = match parse_browse_input(&line) {
                    BrowseInput::Quit => break,
                    BrowseInput::Unknown(text) => {
                        writeln!(
                            out,
                            "{} {}",
                            format!("unknown command {text}").yellow(),
                            BROWSE_HELP.dimmed()
                        )?;
                        continue;
                    }
                    BrowseInput::Search(term) => ScreenEvent::SearchEdited(term),
                    BrowseInput::More => match view_rx.borrow().sentinel {
                        Some(sentinel) => {
                            ScreenEvent::SentinelVisible(sentinel, IntersectionEntry::visible())
                        }
                        None => ScreenEvent::LoadMore,
                    },
                    BrowseInput::Retry => ScreenEvent::Retry,
                    BrowseInput::Refresh => ScreenEvent::Refresh,
                    BrowseInput::SetActive(id, active) => ScreenEvent::SetActive { id, active },
                    BrowseInput::Delete(id) => ScreenEvent::Delete(id),
                };
                if !handle.send(event).await {
                    break;
                }
            }
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = view_rx.borrow_and_update().clone();
                if is_settled(&view) {
                    let rendered = render(&view);
                    if rendered != last_rendered {
                        writeln!(out, "{rendered}")?;
                        last_rendered = rendered;
                    }
                    if !input_open {
                        break;
                    }
                }
            }
        }
    }

    handle.close().await;
    out.flush()?;
    Ok(())
}

/// Mounted, nothing in flight and no search waiting on the debouncer
fn is_settled<R: Resource>(view: &ScreenView<R>) -> bool {
    view.phase != LoadPhase::Idle
        && !view.is_loading_initial
        && !view.is_loading_more
        && !view.is_searching
        && view.pending_search.is_none()
        && view.rows.iter().all(|row| !row.busy)
}

fn render<R: Resource>(view: &ScreenView<R>) -> String {
    let mut text = String::new();
    if !view.search_term.is_empty() {
        text.push_str(&format!("{} {}\n", "search:".cyan(), view.search_term));
    }
    if !view.rows.is_empty() {
        text.push_str(&record_table(&view.rows));
        text.push('\n');
    }
    text.push_str(&format_screen_status(view));
    if let Some(notice) = &view.notice {
        text.push('\n');
        text.push_str(&format_notice(notice));
    }
    text
}
