//! Per-screen query state.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::{Cursor, Record, RecordId};

/// Where a list screen is in its load cycle.
///
/// ```text
/// Idle -> LoadingInitial -> Loaded <-> LoadingMore
/// Loaded -> Searching -> LoadingInitial    (committed search change)
/// *      -> Error -> LoadingInitial        (fetch failure, then retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LoadPhase {
    #[default]
    Idle,
    LoadingInitial,
    Loaded,
    LoadingMore,
    Searching,
    Error,
}

/// Everything a list screen shows, owned by exactly one screen.
///
/// `items` keep arrival order: page one first, then each continuation
/// appended in the order it arrived.
#[derive(Debug, Clone)]
pub struct QueryState<R> {
    pub search_term: String,
    pub items: Vec<R>,
    pub total_count: u64,
    pub next_cursor: Option<Cursor>,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub is_searching: bool,
    pub error: Option<String>,
    pub phase: LoadPhase,
    /// Bumped whenever a new logical query starts; stale responses carry an
    /// older value and are dropped
    pub generation: u64,
}

impl<R> Default for QueryState<R> {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            items: Vec::new(),
            total_count: 0,
            next_cursor: None,
            is_loading_initial: false,
            is_loading_more: false,
            is_searching: false,
            error: None,
            phase: LoadPhase::Idle,
            generation: 0,
        }
    }
}

impl<R: Record> QueryState<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Any fetch in flight
    pub fn is_loading(&self) -> bool {
        self.is_loading_initial || self.is_loading_more || self.is_searching
    }

    /// Start a new logical query for `search_term`: forget everything loaded
    /// for the previous one.
    pub fn reset_for(&mut self, search_term: impl Into<String>) {
        self.search_term = search_term.into();
        self.items.clear();
        self.total_count = 0;
        self.next_cursor = None;
        self.error = None;
        self.is_loading_initial = false;
        self.is_loading_more = false;
        self.is_searching = false;
        self.generation += 1;
    }

    pub fn clear_loading(&mut self) {
        self.is_loading_initial = false;
        self.is_loading_more = false;
        self.is_searching = false;
    }

    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.items.iter().position(|r| r.id() == id)
    }

    pub fn get(&self, id: RecordId) -> Option<&R> {
        self.items.iter().find(|r| r.id() == id)
    }

    /// IDs that appear more than once in `items`.
    ///
    /// Pages are not deduplicated; the server is expected never to repeat a
    /// record across pages of one query, and this is how that is checked.
    pub fn duplicate_ids(&self) -> Vec<RecordId> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for item in &self.items {
            let id = item.id();
            if !seen.insert(id) && !duplicates.contains(&id) {
                duplicates.push(id);
            }
        }
        duplicates
    }

    pub fn is_empty_result(&self) -> bool {
        self.phase == LoadPhase::Loaded && self.items.is_empty() && !self.has_more()
    }
}
