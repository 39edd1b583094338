//! One management screen: a paginated, searchable list of one resource.
//!
//! `ListScreen` is synchronous. User actions return [`Command`]s describing
//! the request to send; whoever runs the screen sends them and feeds the
//! results back through [`ListScreen::apply`]. This keeps every state
//! transition testable without a network or a runtime.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::api::{Changes, FieldErrors, changed_fields};
use crate::audit::{AuditSummary, render_record_audit};
use crate::error::{LabdeskError, Result};
use crate::resources::{DraftMode, Resource};
use crate::types::{Page, RecordId};

use super::debounce::Debouncer;
use super::fetch::{FetchController, FetchKind, FetchOutcome, FetchTicket};
use super::optimistic::{MutationOutcome, OptimisticApplier, PendingMutation};
use super::scroll::{IntersectionEntry, ObserverHandle, ScrollTrigger};
use super::state::{LoadPhase, QueryState};

/// Severity of a [`Notice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient message about the outcome of a user action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
}

impl Notice {
    pub fn new(message: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NoticeLevel::Error)
    }
}

/// A create request, tagged with the query it was issued from
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub generation: u64,
    pub draft: Changes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteTicket {
    pub id: RecordId,
    pub generation: u64,
}

/// A request the screen wants sent
#[derive(Debug, Clone)]
pub enum Command<R> {
    Fetch(FetchTicket),
    Update(PendingMutation<R>),
    Create(CreateTicket),
    Delete(DeleteTicket),
}

/// The result of a [`Command`], fed back into the screen
#[derive(Debug)]
pub enum Completion<R> {
    Fetched(FetchTicket, Result<Page<R>>),
    Updated(PendingMutation<R>, Result<Option<R>>),
    Created(CreateTicket, Result<R>),
    Deleted(DeleteTicket, Result<()>),
}

/// One rendered list row
#[derive(Debug, Clone, Serialize)]
pub struct RowView<R> {
    pub record: R,
    pub audit: Option<AuditSummary>,
    /// A mutation or delete is in flight; controls should be disabled
    pub busy: bool,
}

/// Everything needed to draw the screen
#[derive(Debug, Clone, Serialize)]
pub struct ScreenView<R> {
    pub search_term: String,
    /// Typed but not yet committed search input
    pub pending_search: Option<String>,
    pub rows: Vec<RowView<R>>,
    pub total_count: u64,
    pub phase: LoadPhase,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub is_searching: bool,
    pub error: Option<String>,
    pub show_sentinel: bool,
    /// Handle to report sentinel visibility with
    #[serde(skip)]
    pub sentinel: Option<ObserverHandle>,
    pub empty_message: Option<String>,
    pub notice: Option<Notice>,
    pub form_errors: Option<FieldErrors>,
}

impl<R> Default for ScreenView<R> {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            pending_search: None,
            rows: Vec::new(),
            total_count: 0,
            phase: LoadPhase::Idle,
            is_loading_initial: false,
            is_loading_more: false,
            is_searching: false,
            error: None,
            show_sentinel: false,
            sentinel: None,
            empty_message: None,
            notice: None,
            form_errors: None,
        }
    }
}

pub struct ListScreen<R: Resource> {
    state: QueryState<R>,
    fetch: FetchController,
    debouncer: Debouncer,
    scroll: ScrollTrigger,
    sentinel: Option<ObserverHandle>,
    mutations: OptimisticApplier,
    deleting: HashSet<RecordId>,
    notice: Option<Notice>,
    form_errors: Option<FieldErrors>,
}

impl<R: Resource> ListScreen<R> {
    pub fn new(fetch: FetchController) -> Self {
        Self {
            state: QueryState::new(),
            fetch,
            debouncer: Debouncer::new(R::SEARCH_DEBOUNCE),
            scroll: ScrollTrigger::default(),
            sentinel: None,
            mutations: OptimisticApplier::new(),
            deleting: HashSet::new(),
            notice: None,
            form_errors: None,
        }
    }

    /// A screen already showing `items`, e.g. a single record fetched by ID
    pub fn from_records(fetch: FetchController, items: Vec<R>) -> Self {
        let mut screen = Self::new(fetch);
        screen.state.total_count = items.len() as u64;
        screen.state.items = items;
        screen.state.phase = LoadPhase::Loaded;
        screen.state.generation = 1;
        screen
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debouncer = Debouncer::new(delay);
        self
    }

    pub fn with_root_margin(mut self, root_margin: u32) -> Self {
        self.scroll = ScrollTrigger::new(root_margin);
        self
    }

    pub fn state(&self) -> &QueryState<R> {
        &self.state
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn form_errors(&self) -> Option<&FieldErrors> {
        self.form_errors.as_ref()
    }

    pub fn is_busy(&self, id: RecordId) -> bool {
        self.mutations.is_busy(id) || self.deleting.contains(&id)
    }

    pub fn debounce_delay(&self) -> Duration {
        self.debouncer.delay()
    }

    /// Start observing the sentinel and load page one
    pub fn mount(&mut self) -> Command<R> {
        self.sentinel = Some(self.scroll.reconnect());
        Command::Fetch(self.fetch.begin_first_page(&mut self.state, FetchKind::Initial))
    }

    /// Tear the screen down. Anything still in flight is discarded on arrival.
    pub fn unmount(&mut self) {
        self.scroll.disconnect();
        self.sentinel = None;
        self.debouncer.cancel();
        self.state.clear_loading();
        self.state.generation += 1;
    }

    /// The search input changed; nothing is sent until it settles
    pub fn edit_search(&mut self, term: impl Into<String>, now: Instant) {
        self.debouncer.edit(term, now);
        if self.state.phase == LoadPhase::Loaded {
            self.state.phase = LoadPhase::Searching;
        }
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Commit the pending search if its quiet window has passed
    pub fn poll_search(&mut self, now: Instant) -> Option<Command<R>> {
        let term = self.debouncer.poll(now)?;
        self.commit_search(term)
    }

    /// Start a new query for `term`.
    ///
    /// Returns `None` when `term` is what is already shown.
    pub fn commit_search(&mut self, term: impl Into<String>) -> Option<Command<R>> {
        let term = term.into().trim().to_string();
        if term == self.state.search_term && self.state.generation > 0 {
            if self.state.phase == LoadPhase::Searching {
                self.state.phase = LoadPhase::Loaded;
            }
            return None;
        }

        tracing::debug!(from = %self.state.search_term, to = %term, "search changed");
        self.state.reset_for(term);
        self.sentinel = Some(self.scroll.reconnect());
        Some(Command::Fetch(
            self.fetch.begin_first_page(&mut self.state, FetchKind::Search),
        ))
    }

    /// The sentinel was observed; load the next page if it is time
    pub fn sentinel_intersected(
        &mut self,
        handle: ObserverHandle,
        entry: IntersectionEntry,
    ) -> Option<Command<R>> {
        let wanted = self.scroll.notify(
            handle,
            entry,
            self.state.has_more(),
            self.state.is_loading(),
        );
        if !wanted {
            return None;
        }
        self.load_more()
    }

    /// Explicit request for the next page
    pub fn load_more(&mut self) -> Option<Command<R>> {
        self.fetch.begin_more(&mut self.state).map(Command::Fetch)
    }

    /// Reload page one of the current query
    pub fn refresh(&mut self) -> Command<R> {
        Command::Fetch(self.fetch.begin_first_page(&mut self.state, FetchKind::Initial))
    }

    /// Recover from an error by reloading page one
    pub fn retry(&mut self) -> Command<R> {
        self.notice = None;
        self.refresh()
    }

    /// Toggle the active flag of a loaded record optimistically
    pub fn set_active(&mut self, id: RecordId, active: bool) -> Result<Option<Command<R>>> {
        let record = self.state.get(id).ok_or(LabdeskError::RecordNotFound(id))?;
        let updated = record.with_active(active).ok_or_else(|| {
            LabdeskError::Other(format!("{} records have no active flag", R::LABEL))
        })?;
        self.mutate(updated)
    }

    /// Show `new_state` immediately and send the changed fields
    pub fn mutate(&mut self, new_state: R) -> Result<Option<Command<R>>> {
        if R::READ_ONLY {
            return Err(LabdeskError::ReadOnly(R::LABEL));
        }
        let id = new_state.id();
        if self.deleting.contains(&id) {
            return Err(LabdeskError::MutationInFlight(id));
        }

        let current = self.state.get(id).ok_or(LabdeskError::RecordNotFound(id))?;
        let errors = R::validate(&changed_fields(current, &new_state)?, DraftMode::Update);
        errors.into_result()?;

        self.form_errors = None;
        let pending = self.mutations.begin(&mut self.state, new_state)?;
        Ok(pending.map(Command::Update))
    }

    /// Validate a new record locally and, if it passes, send it
    pub fn create(&mut self, draft: Changes) -> Result<Command<R>> {
        if R::READ_ONLY {
            return Err(LabdeskError::ReadOnly(R::LABEL));
        }
        R::validate(&draft, DraftMode::Create).into_result()?;

        self.form_errors = None;
        Ok(Command::Create(CreateTicket {
            generation: self.state.generation,
            draft,
        }))
    }

    /// Delete a loaded record. Not optimistic: the row changes on success.
    pub fn delete(&mut self, id: RecordId) -> Result<Command<R>> {
        if R::READ_ONLY {
            return Err(LabdeskError::ReadOnly(R::LABEL));
        }
        if self.state.get(id).is_none() {
            return Err(LabdeskError::RecordNotFound(id));
        }
        if self.is_busy(id) {
            return Err(LabdeskError::MutationInFlight(id));
        }

        self.deleting.insert(id);
        Ok(Command::Delete(DeleteTicket {
            id,
            generation: self.state.generation,
        }))
    }

    /// Surface an action that failed before anything was sent
    pub fn reject(&mut self, err: &LabdeskError) {
        self.form_errors = err.field_errors().cloned();
        self.notice = Some(Notice::error(err.user_message()));
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Feed a request result back into the screen
    pub fn apply(&mut self, completion: Completion<R>) {
        match completion {
            Completion::Fetched(ticket, result) => {
                if let FetchOutcome::Replaced { count } | FetchOutcome::Appended { count } =
                    self.fetch.complete(&mut self.state, &ticket, result)
                {
                    tracing::debug!(count, total = self.state.total_count, "page applied");
                }
            }
            Completion::Updated(pending, result) => {
                if let Err(e) = &result {
                    self.form_errors = e.field_errors().cloned();
                }
                match self.mutations.complete(&mut self.state, pending, result) {
                    MutationOutcome::Confirmed { .. } => {
                        self.notice =
                            Some(Notice::success(format!("{} updated.", capitalize(R::LABEL))));
                    }
                    MutationOutcome::RolledBack(message) => {
                        self.notice = Some(Notice::error(message));
                    }
                    MutationOutcome::Superseded => {}
                }
            }
            Completion::Created(ticket, result) => match result {
                Ok(record) => {
                    if ticket.generation == self.state.generation {
                        self.state.items.insert(0, record);
                        self.state.total_count += 1;
                    }
                    self.notice =
                        Some(Notice::success(format!("{} created.", capitalize(R::LABEL))));
                }
                Err(e) => self.reject(&e),
            },
            Completion::Deleted(ticket, result) => {
                self.deleting.remove(&ticket.id);
                match result {
                    Ok(()) => {
                        if ticket.generation == self.state.generation {
                            self.remove_deleted(ticket.id);
                        }
                        let verb = if R::SOFT_DELETE { "deactivated" } else { "deleted" };
                        self.notice =
                            Some(Notice::success(format!("{} {verb}.", capitalize(R::LABEL))));
                    }
                    Err(e) => {
                        tracing::warn!(id = ticket.id, "delete failed: {e}");
                        self.reject(&e);
                    }
                }
            }
        }
    }

    fn remove_deleted(&mut self, id: RecordId) {
        let Some(index) = self.state.position(id) else {
            return;
        };
        if R::SOFT_DELETE
            && let Some(inactive) = self.state.items[index].with_active(false)
        {
            self.state.items[index] = inactive;
            return;
        }
        self.state.items.remove(index);
        self.state.total_count = self.state.total_count.saturating_sub(1);
    }

    pub fn view(&self) -> ScreenView<R> {
        let rows = self
            .state
            .items
            .iter()
            .map(|record| RowView {
                record: record.clone(),
                audit: record.audit().and_then(render_record_audit),
                busy: self.is_busy(record.id()),
            })
            .collect();
        let show_sentinel = ScrollTrigger::should_render_sentinel(self.state.has_more());

        ScreenView {
            search_term: self.state.search_term.clone(),
            pending_search: self.debouncer.pending().map(str::to_string),
            rows,
            total_count: self.state.total_count,
            phase: self.state.phase,
            is_loading_initial: self.state.is_loading_initial,
            is_loading_more: self.state.is_loading_more,
            is_searching: self.state.is_searching,
            error: self.state.error.clone(),
            show_sentinel,
            sentinel: self.sentinel.filter(|_| show_sentinel),
            empty_message: self.empty_message(),
            notice: self.notice.clone(),
            form_errors: self.form_errors.clone(),
        }
    }

    fn empty_message(&self) -> Option<String> {
        if !self.state.is_empty_result() {
            return None;
        }
        if self.state.search_term.is_empty() {
            Some(format!("There are no {} records yet.", R::LABEL))
        } else {
            Some(format!(
                "No {} records match \"{}\".",
                R::LABEL,
                self.state.search_term
            ))
        }
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiErrorKind;
    use crate::resources::{AuditLogEntry, Patient};
    use crate::types::Cursor;
    use serde_json::json;

    fn patient(id: RecordId, is_active: bool) -> Patient {
        serde_json::from_value(json!({
            "id": id,
            "first_name": "Ana",
            "last_name": format!("Paciente {id}"),
            "dni": format!("{}", 30_000_000 + id),
            "is_active": is_active,
            "created_by": {"username": "recepcion"},
            "created_at": "2024-02-01T12:00:00Z"
        }))
        .unwrap()
    }

    fn page(
        ids: std::ops::RangeInclusive<RecordId>,
        total: u64,
        next: Option<&str>,
    ) -> Page<Patient> {
        Page {
            items: ids.map(|id| patient(id, true)).collect(),
            total_count: total,
            next_cursor: next.map(Cursor::new),
        }
    }

    fn fetch_ticket(command: Command<Patient>) -> FetchTicket {
        match command {
            Command::Fetch(ticket) => ticket,
            other => panic!("expected a fetch, got {other:?}"),
        }
    }

    fn mounted(first: Page<Patient>) -> ListScreen<Patient> {
        let mut screen = ListScreen::new(FetchController::new(3));
        let ticket = fetch_ticket(screen.mount());
        screen.apply(Completion::Fetched(ticket, Ok(first)));
        screen
    }

    #[test]
    fn test_mount_loads_page_one() {
        let screen = mounted(page(1..=3, 5, Some("p2")));
        let view = screen.view();
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.total_count, 5);
        assert!(view.show_sentinel);
        assert!(view.sentinel.is_some());
        assert_eq!(view.phase, LoadPhase::Loaded);
        assert!(view.rows[0].audit.is_some());
    }

    #[test]
    fn test_sentinel_loads_next_page_once() {
        let mut screen = mounted(page(1..=3, 5, Some("p2")));
        let handle = screen.view().sentinel.unwrap();

        let more = screen
            .sentinel_intersected(handle, IntersectionEntry::visible())
            .map(fetch_ticket)
            .unwrap();
        assert!(screen
            .sentinel_intersected(handle, IntersectionEntry::visible())
            .is_none());

        screen.apply(Completion::Fetched(more, Ok(page(4..=5, 5, None))));
        let view = screen.view();
        let ids: Vec<RecordId> = view.rows.iter().map(|r| r.record.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert!(!view.show_sentinel);
    }

    #[test]
    fn test_root_margin_loads_before_sentinel_is_visible() {
        let fetch = FetchController::new(3);
        let mut screen = ListScreen::<Patient>::new(fetch).with_root_margin(2);
        let ticket = fetch_ticket(screen.mount());
        screen.apply(Completion::Fetched(ticket, Ok(page(1..=3, 5, Some("p2")))));
        let handle = screen.view().sentinel.unwrap();

        assert!(screen
            .sentinel_intersected(handle, IntersectionEntry::below(3))
            .is_none());
        assert!(screen
            .sentinel_intersected(handle, IntersectionEntry::below(2))
            .is_some());
    }

    #[test]
    fn test_search_edit_does_not_fetch_until_committed() {
        let mut screen = mounted(page(1..=3, 3, None));
        let now = Instant::now();

        screen.edit_search("an", now);
        screen.edit_search("ana", now + Duration::from_millis(200));
        assert_eq!(screen.view().phase, LoadPhase::Searching);
        assert_eq!(screen.view().pending_search.as_deref(), Some("ana"));
        assert!(screen.poll_search(now + Duration::from_millis(600)).is_none());

        let ticket = screen
            .poll_search(now + Duration::from_millis(700))
            .map(fetch_ticket)
            .unwrap();
        assert_eq!(ticket.request.search_term, "ana");
        assert_eq!(ticket.kind, FetchKind::Search);

        let view = screen.view();
        assert!(view.is_searching);
        assert!(view.rows.is_empty());
        assert!(view.pending_search.is_none());
    }

    #[test]
    fn test_committing_same_term_sends_nothing() {
        let mut screen = mounted(page(1..=3, 3, None));
        let now = Instant::now();
        screen.edit_search("", now);
        assert!(screen.poll_search(now + Duration::from_secs(1)).is_none());
        assert_eq!(screen.view().phase, LoadPhase::Loaded);
        assert_eq!(screen.view().rows.len(), 3);
    }

    #[test]
    fn test_search_term_is_trimmed() {
        let mut screen = mounted(page(1..=3, 3, None));
        let ticket = fetch_ticket(screen.commit_search("  ana ").unwrap());
        assert_eq!(ticket.request.search_term, "ana");
        assert!(screen.commit_search("ana").is_none());
    }

    #[test]
    fn test_search_reconnects_sentinel() {
        let mut screen = mounted(page(1..=3, 6, Some("p2")));
        let old = screen.view().sentinel.unwrap();

        let ticket = fetch_ticket(screen.commit_search("ana").unwrap());
        screen.apply(Completion::Fetched(ticket, Ok(page(7..=9, 6, Some("p2b")))));

        assert!(screen
            .sentinel_intersected(old, IntersectionEntry::visible())
            .is_none());
        let new = screen.view().sentinel.unwrap();
        assert!(screen
            .sentinel_intersected(new, IntersectionEntry::visible())
            .is_some());
    }

    #[test]
    fn test_set_active_rolls_back_on_rejection() {
        let mut screen = mounted(page(1..=3, 3, None));

        let pending = match screen.set_active(2, false).unwrap() {
            Some(Command::Update(pending)) => pending,
            other => panic!("expected an update, got {other:?}"),
        };
        assert_eq!(pending.changes.get("is_active"), Some(&json!(false)));
        let view = screen.view();
        assert!(!view.rows[1].record.is_active);
        assert!(view.rows[1].busy);

        screen.apply(Completion::Updated(
            pending,
            Err(LabdeskError::Network("timed out".to_string())),
        ));
        let view = screen.view();
        assert!(view.rows[1].record.is_active);
        assert!(!view.rows[1].busy);
        assert_eq!(view.notice.unwrap().level, NoticeLevel::Error);
    }

    #[test]
    fn test_double_toggle_is_rejected_while_in_flight() {
        let mut screen = mounted(page(1..=3, 3, None));
        let _first = screen.set_active(1, false).unwrap();
        let err = screen.set_active(1, true).unwrap_err();
        assert!(matches!(err, LabdeskError::MutationInFlight(1)));
    }

    #[test]
    fn test_update_with_invalid_fields_is_blocked_locally() {
        let mut screen = mounted(page(1..=3, 3, None));
        let mut edited = screen.state().items[0].clone();
        edited.first_name = "   ".to_string();

        let err = screen.mutate(edited).unwrap_err();
        assert!(err.field_errors().unwrap().get("first_name").is_some());
        assert!(!screen.is_busy(1));
        assert_eq!(screen.state().items[0].first_name, "Ana");
    }

    #[test]
    fn test_create_prepends_record() {
        let mut screen = mounted(page(1..=3, 3, None));
        let draft = json!({"first_name": "Luis", "last_name": "Pérez", "dni": "28999111"});

        let ticket = match screen.create(draft.as_object().cloned().unwrap()).unwrap() {
            Command::Create(ticket) => ticket,
            other => panic!("expected a create, got {other:?}"),
        };
        screen.apply(Completion::Created(ticket, Ok(patient(10, true))));

        let view = screen.view();
        assert_eq!(view.rows[0].record.id, 10);
        assert_eq!(view.total_count, 4);
        assert_eq!(view.notice.unwrap().message, "Patient created.");
    }

    #[test]
    fn test_create_validation_failure_sends_nothing() {
        let mut screen = mounted(page(1..=3, 3, None));
        let draft = json!({"first_name": "Luis", "dni": "28A"});
        let err = screen.create(draft.as_object().cloned().unwrap()).unwrap_err();

        let fields = err.field_errors().unwrap();
        assert!(fields.get("last_name").is_some());
        assert!(fields.get("dni").is_some());
    }

    #[test]
    fn test_create_field_errors_from_server() {
        let mut screen = mounted(page(1..=3, 3, None));
        let draft = json!({"first_name": "Luis", "last_name": "Pérez", "dni": "28999111"});
        let ticket = match screen.create(draft.as_object().cloned().unwrap()).unwrap() {
            Command::Create(ticket) => ticket,
            other => panic!("expected a create, got {other:?}"),
        };

        let mut fields = FieldErrors::new();
        fields.push("dni", "A patient with this DNI already exists.");
        screen.apply(Completion::Created(
            ticket,
            Err(LabdeskError::Api {
                status: 400,
                kind: ApiErrorKind::Fields {
                    summary: "dni: A patient with this DNI already exists.".to_string(),
                    fields,
                },
            }),
        ));

        let view = screen.view();
        assert_eq!(view.rows.len(), 3);
        assert_eq!(
            view.form_errors.unwrap().first_for("dni"),
            Some("A patient with this DNI already exists.")
        );
    }

    #[test]
    fn test_soft_delete_marks_inactive() {
        let mut screen = mounted(page(1..=3, 3, None));
        let ticket = match screen.delete(2).unwrap() {
            Command::Delete(ticket) => ticket,
            other => panic!("expected a delete, got {other:?}"),
        };
        assert!(screen.view().rows[1].busy);

        screen.apply(Completion::Deleted(ticket, Ok(())));
        let view = screen.view();
        assert_eq!(view.rows.len(), 3);
        assert!(!view.rows[1].record.is_active);
        assert!(!view.rows[1].busy);
        assert_eq!(view.notice.unwrap().message, "Patient deactivated.");
    }

    #[test]
    fn test_failed_delete_keeps_row() {
        let mut screen = mounted(page(1..=3, 3, None));
        let Command::Delete(ticket) = screen.delete(3).unwrap() else {
            panic!("expected a delete");
        };
        screen.apply(Completion::Deleted(
            ticket,
            Err(LabdeskError::Api {
                status: 409,
                kind: ApiErrorKind::General("Patient has protocols.".to_string()),
            }),
        ));

        let view = screen.view();
        assert!(view.rows[2].record.is_active);
        assert_eq!(view.notice.unwrap().message, "Patient has protocols.");
    }

    #[test]
    fn test_read_only_resource_rejects_mutations() {
        let mut screen: ListScreen<AuditLogEntry> = ListScreen::new(FetchController::default());
        let err = screen.create(Changes::new()).unwrap_err();
        assert!(matches!(err, LabdeskError::ReadOnly(_)));
        assert_eq!(screen.debounce_delay(), Duration::from_millis(300));
    }

    #[test]
    fn test_error_then_retry() {
        let mut screen = ListScreen::<Patient>::new(FetchController::default());
        let ticket = fetch_ticket(screen.mount());
        screen.apply(Completion::Fetched(
            ticket,
            Err(LabdeskError::Network("refused".to_string())),
        ));
        let view = screen.view();
        assert_eq!(view.phase, LoadPhase::Error);
        assert!(view.error.is_some());
        assert!(!view.is_loading_initial);
        assert!(view.empty_message.is_none());

        let ticket = fetch_ticket(screen.retry());
        assert_eq!(screen.view().phase, LoadPhase::LoadingInitial);
        screen.apply(Completion::Fetched(ticket, Ok(page(1..=2, 2, None))));
        assert_eq!(screen.view().rows.len(), 2);
        assert!(screen.view().error.is_none());
    }

    #[test]
    fn test_empty_collection_message() {
        let screen = mounted(Page::empty());
        let view = screen.view();
        assert_eq!(
            view.empty_message.as_deref(),
            Some("There are no patient records yet.")
        );
        assert!(!view.show_sentinel);
        assert!(view.sentinel.is_none());
    }

    #[test]
    fn test_toggle_rejected_while_refreshing_rolls_back() {
        let mut screen = mounted(page(1..=3, 3, None));
        let pending = match screen.set_active(1, false).unwrap() {
            Some(Command::Update(pending)) => pending,
            other => panic!("expected an update, got {other:?}"),
        };
        let refresh = fetch_ticket(screen.refresh());

        screen.apply(Completion::Updated(
            pending,
            Err(LabdeskError::Network("timed out".to_string())),
        ));
        assert!(screen.view().rows[0].record.is_active);

        screen.apply(Completion::Fetched(
            refresh,
            Err(LabdeskError::Network("refused".to_string())),
        ));
        let view = screen.view();
        assert!(view.rows[0].record.is_active);
        assert!(!view.rows[0].busy);
        assert_eq!(view.phase, LoadPhase::Error);
    }

    #[test]
    fn test_clearing_optional_field_sends_null() {
        let mut first = page(1..=1, 1, None);
        first.items[0].email = Some("ana@lab.test".to_string());
        let mut screen = mounted(first);

        let mut edited = screen.state().items[0].clone();
        edited.email = None;
        let pending = match screen.mutate(edited).unwrap() {
            Some(Command::Update(pending)) => pending,
            other => panic!("expected an update, got {other:?}"),
        };
        assert_eq!(pending.changes.get("email"), Some(&serde_json::Value::Null));
        assert_eq!(pending.changes.len(), 1);
        assert!(screen.view().rows[0].record.email.is_none());
    }

    #[test]
    fn test_unmount_discards_late_pages() {
        let mut screen = ListScreen::<Patient>::new(FetchController::default());
        let ticket = fetch_ticket(screen.mount());
        screen.unmount();
        screen.apply(Completion::Fetched(ticket, Ok(page(1..=2, 2, None))));
        assert!(screen.view().rows.is_empty());
        assert!(screen.view().sentinel.is_none());
    }
}
