//! Generic paginated collection controller.
//!
//! Every management screen is a [`ListScreen`] over one resource type:
//! debounced search, page-one-then-continuations loading driven by a scroll
//! sentinel, optimistic mutation with rollback, and stale-response discard.
//! [`ScreenDriver`] runs a screen as a single async task.

pub mod debounce;
pub mod driver;
pub mod fetch;
pub mod optimistic;
pub mod screen;
pub mod scroll;
pub mod state;

pub use debounce::{Debouncer, spawn_debounced};
pub use driver::{ScreenDriver, ScreenEvent, ScreenHandle, execute};
pub use fetch::{DEFAULT_PAGE_SIZE, FetchController, FetchKind, FetchOutcome, FetchTicket};
pub use optimistic::{MutationOutcome, OptimisticApplier, PendingMutation};
pub use screen::{
    Command, Completion, CreateTicket, DeleteTicket, ListScreen, Notice, NoticeLevel, RowView,
    ScreenView,
};
pub use scroll::{IntersectionEntry, ObserverHandle, ScrollTrigger};
pub use state::{LoadPhase, QueryState};
