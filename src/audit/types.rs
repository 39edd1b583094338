//! Wire types for record audit metadata.

use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};

/// A user that created or changed a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    #[serde(default, alias = "photo", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Actor {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            photo_url: None,
        }
    }
}

/// Who did something and when. A missing actor means the system did it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    #[serde(default, alias = "user")]
    pub actor: Option<Actor>,
    #[serde(alias = "date")]
    pub timestamp: Timestamp,
}

/// One version in a record's change history.
///
/// Versions are unique per record and increase monotonically; version 1 is
/// the creation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub version: u32,
    #[serde(default, alias = "user")]
    pub actor: Option<Actor>,
    #[serde(alias = "date")]
    pub timestamp: Timestamp,
    #[serde(default, alias = "history_type")]
    pub action: String,
    #[serde(default, alias = "changes")]
    pub changed_fields: Vec<String>,
}

/// Audit fields as they appear flattened into a record payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Actor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_change: Option<AuditInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}

impl AuditFields {
    /// Top-level creation info, if the server sent a creation timestamp
    pub fn creation(&self) -> Option<AuditInfo> {
        self.created_at.map(|timestamp| AuditInfo {
            actor: self.created_by.clone(),
            timestamp,
        })
    }
}

/// Servers send `{}` or `null` for records that were never changed
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<AuditInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) if map.is_empty() => Ok(None),
        _ => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
