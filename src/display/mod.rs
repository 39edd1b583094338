//! Terminal rendering for list screens, records and audit trails.

use jiff::Timestamp;
use owo_colors::OwoColorize;

use crate::audit::{AuditStamp, AuditSummary, HistoryListing};
use crate::controller::{Notice, NoticeLevel, ScreenView};
use crate::resources::Resource;

pub mod table;

pub use table::record_table;

/// `2024-02-01 12:00`, in UTC
pub fn format_timestamp(timestamp: Timestamp) -> String {
    timestamp.strftime("%Y-%m-%d %H:%M").to_string()
}

fn format_stamp(verb: &str, stamp: &AuditStamp) -> String {
    format!(
        "{verb} by {} on {}",
        stamp.actor.name,
        format_timestamp(stamp.timestamp)
    )
}

/// "Created by A on D1" / "Last modified by B on D3" lines
pub fn format_audit_lines(summary: &AuditSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(created) = &summary.created {
        lines.push(format_stamp("Created", created));
    }
    if let Some(modified) = &summary.last_modified {
        lines.push(format_stamp("Last modified", modified));
    }
    lines
}

/// Compact one-cell form used in tables
pub fn format_audit_cell(stamp: Option<&AuditStamp>) -> String {
    match stamp {
        Some(stamp) => format!(
            "{} ({})",
            stamp.actor.name,
            stamp.timestamp.strftime("%Y-%m-%d")
        ),
        None => "-".to_string(),
    }
}

pub fn format_history(listing: &HistoryListing) -> String {
    let mut out = String::new();
    for entry in &listing.entries {
        out.push_str(&format!(
            "{} {} by {} on {}\n",
            format!("v{}", entry.version).cyan(),
            entry.action,
            entry.actor.name,
            format_timestamp(entry.timestamp).dimmed()
        ));
        for change in &entry.changes {
            out.push_str(&format!("    - {change}\n"));
        }
    }
    if let Some(more) = listing.more_label() {
        out.push_str(&format!("{}\n", format!("... {more}").dimmed()));
    }
    out
}

pub fn format_active(active: Option<bool>) -> String {
    match active {
        Some(true) => "active".green().to_string(),
        Some(false) => "inactive".dimmed().to_string(),
        None => "-".to_string(),
    }
}

pub fn format_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => notice.message.cyan().to_string(),
        NoticeLevel::Success => notice.message.green().to_string(),
        NoticeLevel::Warning => notice.message.yellow().to_string(),
        NoticeLevel::Error => notice.message.red().to_string(),
    }
}

/// Status line under a list: counts, loading state and error banner
pub fn format_screen_status<R: Resource>(view: &ScreenView<R>) -> String {
    let mut parts = Vec::new();

    if let Some(message) = &view.empty_message {
        parts.push(message.dimmed().to_string());
    } else {
        parts.push(format!("{} of {} shown", view.rows.len(), view.total_count));
    }
    if view.is_searching {
        parts.push("searching...".yellow().to_string());
    } else if view.is_loading_initial {
        parts.push("loading...".yellow().to_string());
    } else if view.is_loading_more {
        parts.push("loading more...".yellow().to_string());
    } else if view.show_sentinel {
        parts.push(":more for the next page".dimmed().to_string());
    }
    if let Some(error) = &view.error {
        parts.push(format!("{} {}", error.red(), "(:retry)".dimmed()));
    }

    parts.join("  ")
}
