use std::fmt;

use serde::{Deserialize, Serialize};

use crate::audit::AuditFields;

/// Server-assigned record identifier
pub type RecordId = i64;

/// Opaque pagination token pointing at the next page of a query.
///
/// For the HTTP boundary this is the `next` URL returned by the server; it is
/// never parsed or rebuilt, only handed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One server response page.
///
/// `next_cursor` is `None` exactly when no further pages exist.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub total_count: u64,
    pub next_cursor: Option<Cursor>,
}

impl<R> Page<R> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            next_cursor: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Shape shared by every entity a list screen can show.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> RecordId;

    /// Creation / last-change / history metadata, when the resource carries it
    fn audit(&self) -> Option<&AuditFields> {
        None
    }

    /// Active flag for resources that can be toggled or soft-deleted
    fn is_active(&self) -> Option<bool> {
        None
    }

    /// Copy of the record with the active flag replaced.
    ///
    /// Returns `None` for resources without an active flag.
    fn with_active(&self, _active: bool) -> Option<Self> {
        None
    }
}
