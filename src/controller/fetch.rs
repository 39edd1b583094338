//! Fetch controller: turns query state into page requests and merges the
//! responses back.
//!
//! Every request is issued with a [`FetchTicket`] naming the query it belongs
//! to. Responses are only applied when their ticket still matches the
//! current query, so a slow response for an old search term can never
//! overwrite results loaded for the new one.

use serde::Serialize;

use crate::api::PageRequest;
use crate::error::Result;
use crate::types::{Page, Record};

use super::state::{LoadPhase, QueryState};

/// Page size used by the management screens
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Why a page is being fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FetchKind {
    /// Page one on mount, refresh or retry
    Initial,
    /// Page one after a committed search change
    Search,
    /// A continuation page
    More,
}

/// A page request tagged with the query it was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub kind: FetchKind,
    pub request: PageRequest,
}

/// What happened when a response came back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page one replaced the list
    Replaced { count: usize },
    /// A continuation page was appended
    Appended { count: usize },
    /// The fetch failed; items were left alone
    Failed(String),
    /// The response belonged to a superseded query
    Discarded,
}

#[derive(Debug, Clone)]
pub struct FetchController {
    page_size: u32,
    filters: Vec<(String, String)>,
}

impl Default for FetchController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl FetchController {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            filters: Vec::new(),
        }
    }

    /// Add a fixed domain filter sent with every page request
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Request page one of the current query.
    ///
    /// Loaded items stay visible until the response replaces them; any
    /// request still in flight for this query is superseded.
    pub fn begin_first_page<R: Record>(
        &self,
        state: &mut QueryState<R>,
        kind: FetchKind,
    ) -> FetchTicket {
        state.generation += 1;
        state.error = None;
        state.is_loading_more = false;
        match kind {
            FetchKind::Search => state.is_searching = true,
            _ => state.is_loading_initial = true,
        }
        state.phase = LoadPhase::LoadingInitial;

        let ticket = FetchTicket {
            generation: state.generation,
            kind,
            request: PageRequest {
                search_term: state.search_term.clone(),
                cursor: None,
                limit: self.page_size,
                filters: self.filters.clone(),
            },
        };
        tracing::debug!(
            generation = ticket.generation,
            search = %ticket.request.search_term,
            ?kind,
            "requesting first page"
        );
        ticket
    }

    /// Request the next page, if there is one and nothing is loading.
    ///
    /// The loading flags are the reentrancy guard: a second call while a
    /// page is in flight returns `None` rather than queueing.
    pub fn begin_more<R: Record>(&self, state: &mut QueryState<R>) -> Option<FetchTicket> {
        if state.is_loading() || state.phase == LoadPhase::Error {
            return None;
        }
        let cursor = state.next_cursor.clone()?;

        state.is_loading_more = true;
        state.phase = LoadPhase::LoadingMore;

        Some(FetchTicket {
            generation: state.generation,
            kind: FetchKind::More,
            request: PageRequest {
                search_term: state.search_term.clone(),
                cursor: Some(cursor),
                limit: self.page_size,
                filters: self.filters.clone(),
            },
        })
    }

    /// Apply a response to the state it was requested for
    pub fn complete<R: Record>(
        &self,
        state: &mut QueryState<R>,
        ticket: &FetchTicket,
        result: Result<Page<R>>,
    ) -> FetchOutcome {
        if !is_current(state, ticket) {
            tracing::debug!(
                generation = ticket.generation,
                current = state.generation,
                search = %ticket.request.search_term,
                "discarding stale page"
            );
            return FetchOutcome::Discarded;
        }

        state.clear_loading();

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                let message = e.user_message();
                tracing::warn!(kind = ?ticket.kind, "page fetch failed: {e}");
                state.error = Some(message.clone());
                state.phase = LoadPhase::Error;
                return FetchOutcome::Failed(message);
            }
        };

        let count = page.items.len();
        state.total_count = page.total_count;
        state.next_cursor = page.next_cursor;
        state.error = None;
        state.phase = LoadPhase::Loaded;

        match ticket.kind {
            FetchKind::Initial | FetchKind::Search => {
                state.items = page.items;
                FetchOutcome::Replaced { count }
            }
            FetchKind::More => {
                state.items.extend(page.items);
                let duplicates = state.duplicate_ids();
                if !duplicates.is_empty() {
                    tracing::warn!(?duplicates, "server repeated records across pages");
                }
                FetchOutcome::Appended { count }
            }
        }
    }
}

fn is_current<R: Record>(state: &QueryState<R>, ticket: &FetchTicket) -> bool {
    if ticket.generation != state.generation || ticket.request.search_term != state.search_term {
        return false;
    }
    match ticket.kind {
        FetchKind::More => state.is_loading_more && state.next_cursor == ticket.request.cursor,
        FetchKind::Initial | FetchKind::Search => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LabdeskError;
    use crate::types::{Cursor, RecordId};

    #[derive(Debug, Clone, PartialEq)]
    struct Row(RecordId);

    impl Record for Row {
        fn id(&self) -> RecordId {
            self.0
        }
    }

    fn page(ids: &[RecordId], total: u64, next: Option<&str>) -> Page<Row> {
        Page {
            items: ids.iter().copied().map(Row).collect(),
            total_count: total,
            next_cursor: next.map(Cursor::new),
        }
    }

    #[test]
    fn test_first_page_replaces_items() {
        let fetch = FetchController::new(2);
        let mut state = QueryState::new();

        let ticket = fetch.begin_first_page(&mut state, FetchKind::Initial);
        assert!(state.is_loading_initial);
        assert_eq!(state.phase, LoadPhase::LoadingInitial);
        assert_eq!(ticket.request.limit, 2);
        assert!(ticket.request.cursor.is_none());

        let outcome = fetch.complete(&mut state, &ticket, Ok(page(&[1, 2], 3, Some("p2"))));
        assert_eq!(outcome, FetchOutcome::Replaced { count: 2 });
        assert_eq!(state.items, vec![Row(1), Row(2)]);
        assert_eq!(state.total_count, 3);
        assert!(state.has_more());
        assert_eq!(state.phase, LoadPhase::Loaded);
        assert!(!state.is_loading());
    }

    #[test]
    fn test_more_appends_in_order() {
        let fetch = FetchController::new(2);
        let mut state = QueryState::new();

        let t1 = fetch.begin_first_page(&mut state, FetchKind::Initial);
        fetch.complete(&mut state, &t1, Ok(page(&[1, 2], 3, Some("p2"))));

        let t2 = fetch.begin_more(&mut state).unwrap();
        assert_eq!(t2.request.cursor, Some(Cursor::new("p2")));
        assert!(state.is_loading_more);
        assert_eq!(state.phase, LoadPhase::LoadingMore);

        let outcome = fetch.complete(&mut state, &t2, Ok(page(&[3], 3, None)));
        assert_eq!(outcome, FetchOutcome::Appended { count: 1 });
        assert_eq!(state.items, vec![Row(1), Row(2), Row(3)]);
        assert!(!state.has_more());
        assert!(fetch.begin_more(&mut state).is_none());
    }

    #[test]
    fn test_more_is_not_queued_while_loading() {
        let fetch = FetchController::default();
        let mut state = QueryState::new();

        let t1 = fetch.begin_first_page(&mut state, FetchKind::Initial);
        fetch.complete(&mut state, &t1, Ok(page(&[1], 5, Some("p2"))));

        assert!(fetch.begin_more(&mut state).is_some());
        assert!(fetch.begin_more(&mut state).is_none());
    }

    #[test]
    fn test_failure_keeps_items_and_clears_flags() {
        let fetch = FetchController::default();
        let mut state = QueryState::new();

        let t1 = fetch.begin_first_page(&mut state, FetchKind::Initial);
        fetch.complete(&mut state, &t1, Ok(page(&[1, 2], 4, Some("p2"))));

        let t2 = fetch.begin_more(&mut state).unwrap();
        let outcome = fetch.complete(
            &mut state,
            &t2,
            Err(LabdeskError::Network("reset by peer".to_string())),
        );

        assert!(matches!(outcome, FetchOutcome::Failed(_)));
        assert_eq!(state.items, vec![Row(1), Row(2)]);
        assert!(!state.is_loading());
        assert_eq!(state.phase, LoadPhase::Error);
        assert!(state.error.as_deref().unwrap().contains("Could not reach the server"));
        // No automatic load-more after a failure; retry goes through page one
        assert!(fetch.begin_more(&mut state).is_none());
    }

    #[test]
    fn test_refetching_page_one_replaces() {
        let fetch = FetchController::default();
        let mut state = QueryState::new();

        for _ in 0..2 {
            let ticket = fetch.begin_first_page(&mut state, FetchKind::Initial);
            fetch.complete(&mut state, &ticket, Ok(page(&[1, 2, 3], 3, None)));
        }
        assert_eq!(state.items.len(), 3);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let fetch = FetchController::default();
        let mut state = QueryState::new();

        state.reset_for("foo");
        let foo = fetch.begin_first_page(&mut state, FetchKind::Search);
        state.reset_for("bar");
        let bar = fetch.begin_first_page(&mut state, FetchKind::Search);

        let outcome = fetch.complete(&mut state, &bar, Ok(page(&[20], 1, None)));
        assert_eq!(outcome, FetchOutcome::Replaced { count: 1 });

        let outcome = fetch.complete(&mut state, &foo, Ok(page(&[10, 11], 2, None)));
        assert_eq!(outcome, FetchOutcome::Discarded);
        assert_eq!(state.items, vec![Row(20)]);
        assert_eq!(state.search_term, "bar");
    }

    #[test]
    fn test_continuation_from_previous_query_is_discarded() {
        let fetch = FetchController::default();
        let mut state = QueryState::new();

        let t1 = fetch.begin_first_page(&mut state, FetchKind::Initial);
        fetch.complete(&mut state, &t1, Ok(page(&[1], 2, Some("p2"))));
        let more = fetch.begin_more(&mut state).unwrap();

        // Refresh supersedes the in-flight continuation
        let refresh = fetch.begin_first_page(&mut state, FetchKind::Initial);
        fetch.complete(&mut state, &refresh, Ok(page(&[5], 1, None)));

        let outcome = fetch.complete(&mut state, &more, Ok(page(&[2], 2, None)));
        assert_eq!(outcome, FetchOutcome::Discarded);
        assert_eq!(state.items, vec![Row(5)]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let fetch = FetchController::default();
        let mut state = QueryState::new();

        let t1 = fetch.begin_first_page(&mut state, FetchKind::Initial);
        fetch.complete(&mut state, &t1, Ok(page(&[1, 2], 4, Some("p2"))));
        let t2 = fetch.begin_more(&mut state).unwrap();
        fetch.complete(&mut state, &t2, Ok(page(&[2, 3], 4, None)));

        assert_eq!(state.items.len(), 4);
        assert_eq!(state.duplicate_ids(), vec![2]);
    }

    #[test]
    fn test_filters_travel_with_requests() {
        let fetch = FetchController::new(10).with_filter("is_active", "true");
        let mut state: QueryState<Row> = QueryState::new();
        let ticket = fetch.begin_first_page(&mut state, FetchKind::Initial);
        assert_eq!(
            ticket.request.filters,
            vec![("is_active".to_string(), "true".to_string())]
        );
    }
}
