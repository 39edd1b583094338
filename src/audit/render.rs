//! Pure display models for record audit trails.

use jiff::Timestamp;
use serde::Serialize;

use super::types::{Actor, AuditFields, AuditInfo, HistoryEntry};

/// Name shown when a change has no human actor
pub const SYSTEM_ACTOR: &str = "System";

/// How many history entries a listing shows before collapsing the rest
pub const DEFAULT_HISTORY_CAP: usize = 5;

/// Avatar / tooltip data for whoever performed a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorView {
    pub name: String,
    pub photo_url: Option<String>,
    /// Avatar fallback when there is no photo
    pub initials: String,
    pub is_system: bool,
}

impl ActorView {
    pub fn from_actor(actor: Option<&Actor>) -> Self {
        match actor {
            Some(actor) => Self {
                name: actor.username.clone(),
                photo_url: actor.photo_url.clone(),
                initials: initials(&actor.username),
                is_system: false,
            },
            None => Self {
                name: SYSTEM_ACTOR.to_string(),
                photo_url: None,
                initials: initials(SYSTEM_ACTOR),
                is_system: true,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditStamp {
    pub actor: ActorView,
    pub timestamp: Timestamp,
}

impl AuditStamp {
    fn from_info(info: &AuditInfo) -> Self {
        Self {
            actor: ActorView::from_actor(info.actor.as_ref()),
            timestamp: info.timestamp,
        }
    }

    fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            actor: ActorView::from_actor(entry.actor.as_ref()),
            timestamp: entry.timestamp,
        }
    }
}

/// "Created by / last modified by" summary for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub created: Option<AuditStamp>,
    pub last_modified: Option<AuditStamp>,
}

/// Resolve who created and last modified a record.
///
/// Creation comes from history version 1 when history is present, falling
/// back to the top-level creation info. Last modification comes from the
/// highest history version above 1; when history is present it is the only
/// source, so a bare `last_change` is ignored. Without history the top-level
/// `last_change` is used. Returns `None` when nothing resolves, so callers
/// render no slot at all.
pub fn render_audit(
    creation: Option<&AuditInfo>,
    last_change: Option<&AuditInfo>,
    history: Option<&[HistoryEntry]>,
) -> Option<AuditSummary> {
    let (created, last_modified) = match history {
        Some(entries) => {
            let created = entries
                .iter()
                .find(|e| e.version == 1)
                .map(AuditStamp::from_entry)
                .or_else(|| creation.map(AuditStamp::from_info));
            let last_modified = entries
                .iter()
                .filter(|e| e.version > 1)
                .max_by_key(|e| e.version)
                .map(AuditStamp::from_entry);
            (created, last_modified)
        }
        None => (
            creation.map(AuditStamp::from_info),
            last_change.map(AuditStamp::from_info),
        ),
    };

    if created.is_none() && last_modified.is_none() {
        return None;
    }

    Some(AuditSummary {
        created,
        last_modified,
    })
}

/// Convenience wrapper over [`render_audit`] for flattened record fields
pub fn render_record_audit(fields: &AuditFields) -> Option<AuditSummary> {
    let creation = fields.creation();
    render_audit(
        creation.as_ref(),
        fields.last_change.as_ref(),
        fields.history.as_deref(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryLine {
    pub version: u32,
    pub actor: ActorView,
    pub timestamp: Timestamp,
    pub action: String,
    pub changes: Vec<String>,
}

/// A capped, newest-first view of a record's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryListing {
    pub entries: Vec<HistoryLine>,
    /// Entries left out because of the cap
    pub hidden: usize,
}

impl HistoryListing {
    pub fn more_label(&self) -> Option<String> {
        match self.hidden {
            0 => None,
            1 => Some("1 more change".to_string()),
            n => Some(format!("{n} more changes")),
        }
    }
}

pub fn history_listing(history: &[HistoryEntry], cap: usize) -> HistoryListing {
    let mut sorted: Vec<&HistoryEntry> = history.iter().collect();
    sorted.sort_by(|a, b| b.version.cmp(&a.version));

    let hidden = sorted.len().saturating_sub(cap);
    let entries = sorted
        .into_iter()
        .take(cap)
        .map(|entry| HistoryLine {
            version: entry.version,
            actor: ActorView::from_actor(entry.actor.as_ref()),
            timestamp: entry.timestamp,
            action: action_label(&entry.action).to_string(),
            changes: entry.changed_fields.clone(),
        })
        .collect();

    HistoryListing { entries, hidden }
}

/// Human label for a history action code
pub fn action_label(action: &str) -> &str {
    match action {
        "+" | "create" | "created" => "Created",
        "~" | "update" | "updated" => "Updated",
        "-" | "delete" | "deleted" => "Deleted",
        other => other,
    }
}

/// Two-letter avatar initials for a username
pub fn initials(name: &str) -> String {
    let parts: Vec<&str> = name
        .split(|c: char| c.is_whitespace() || matches!(c, '.' | '_' | '-'))
        .filter(|p| !p.is_empty())
        .collect();

    let letters: String = match parts.as_slice() {
        [] => return "?".to_string(),
        [single] => single.chars().filter(|c| c.is_alphanumeric()).take(2).collect(),
        [first, second, ..] => first.chars().take(1).chain(second.chars().take(1)).collect(),
    };

    if letters.is_empty() {
        "?".to_string()
    } else {
        letters.to_uppercase()
    }
}
