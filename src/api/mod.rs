//! REST boundary for the laboratory API.
//!
//! Screens never talk HTTP directly; they go through [`ResourceClient`], which
//! the production [`http::HttpClient`] and in-memory test doubles implement.

pub mod error;
pub mod http;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::resources::Resource;
use crate::types::{Cursor, Page, RecordId};

pub use error::{ApiErrorKind, FieldErrors, parse_api_error, parse_api_error_text};
pub use http::HttpClient;

/// Partial record body for create (`POST`) and update (`PATCH`) requests
pub type Changes = Map<String, Value>;

/// Parameters for one page of a collection query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Free-text search; empty means no filter
    pub search_term: String,
    /// `None` requests page one of a fresh query
    pub cursor: Option<Cursor>,
    pub limit: u32,
    /// Extra domain filters sent as query parameters
    pub filters: Vec<(String, String)>,
}

impl PageRequest {
    pub fn first(search_term: impl Into<String>, limit: u32) -> Self {
        Self {
            search_term: search_term.into(),
            cursor: None,
            limit,
            filters: Vec::new(),
        }
    }

    pub fn is_first_page(&self) -> bool {
        self.cursor.is_none()
    }
}

/// Wire shape of a paginated list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<R> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<R>,
}

impl<R> From<ListResponse<R>> for Page<R> {
    fn from(response: ListResponse<R>) -> Self {
        Page {
            items: response.results,
            total_count: response.count,
            next_cursor: response
                .next
                .filter(|next| !next.is_empty())
                .map(Cursor::new),
        }
    }
}

/// Common interface for anything that serves a collection of `R`
#[async_trait::async_trait]
pub trait ResourceClient<R: Resource>: Send + Sync {
    /// Fetch one page of the collection
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<R>>;

    /// Fetch a single record by ID
    async fn fetch_one(&self, id: RecordId) -> Result<R>;

    /// Create a record and return the server's copy
    async fn create(&self, draft: &Changes) -> Result<R>;

    /// Apply a partial update.
    ///
    /// Returns the canonical updated record when the server sends one back.
    async fn update(&self, id: RecordId, changes: &Changes) -> Result<Option<R>>;

    /// Delete (or, for soft-delete resources, deactivate) a record
    async fn delete(&self, id: RecordId) -> Result<()>;
}

/// Top-level fields whose values differ between two versions of a record.
///
/// Used to build `PATCH` bodies that only carry what actually changed.
pub fn changed_fields<R: Serialize>(before: &R, after: &R) -> Result<Changes> {
    let before = serde_json::to_value(before)?;
    let after = serde_json::to_value(after)?;

    let mut changes = Changes::new();
    if let (Value::Object(before), Value::Object(after)) = (before, after) {
        for (key, value) in &after {
            if before.get(key) != Some(value) {
                changes.insert(key.clone(), value.clone());
            }
        }
        // Cleared optional fields are skipped on serialization
        for key in before.keys() {
            if !after.contains_key(key) {
                changes.insert(key.clone(), Value::Null);
            }
        }
    }
    Ok(changes)
}
