//! Record audit trails: who created a record, who last changed it, and its
//! version history.

pub mod render;
pub mod types;

pub use render::{
    ActorView, AuditStamp, AuditSummary, DEFAULT_HISTORY_CAP, HistoryLine, HistoryListing,
    SYSTEM_ACTOR, action_label, history_listing, render_audit, render_record_audit,
};
pub use types::{Actor, AuditFields, AuditInfo, HistoryEntry};
