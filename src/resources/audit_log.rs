use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::audit::Actor;
use crate::types::{Record, RecordId};

use super::Resource;

/// A system-wide audit log line. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: RecordId,
    #[serde(default, alias = "user")]
    pub actor: Option<Actor>,
    pub action: String,
    /// Model or table the action touched
    #[serde(default)]
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(alias = "date")]
    pub timestamp: Timestamp,
}

impl Record for AuditLogEntry {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Resource for AuditLogEntry {
    const COLLECTION: &'static str = "audit_logs";
    const LABEL: &'static str = "audit log entry";
    const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
    const READ_ONLY: bool = true;

    fn title(&self) -> String {
        let who = self
            .actor
            .as_ref()
            .map(|a| a.username.as_str())
            .unwrap_or(crate::audit::SYSTEM_ACTOR);
        format!("{who} {} {}", self.action, self.resource)
    }

    fn subtitle(&self) -> Option<String> {
        Some(self.timestamp.strftime("%Y-%m-%d %H:%M").to_string())
    }
}
