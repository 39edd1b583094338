//! Entity types served by the laboratory API.
//!
//! Each entity is a thin payload: the list screens only need an ID, the audit
//! fields, an optional active flag and something to show in a row.

pub mod analysis;
pub mod audit_log;
pub mod doctor;
pub mod insurance;
pub mod patient;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::{Changes, FieldErrors};
use crate::error::{LabdeskError, Result};
use crate::types::Record;

pub use analysis::Analysis;
pub use audit_log::AuditLogEntry;
pub use doctor::Doctor;
pub use insurance::Insurance;
pub use patient::Patient;

/// Search debounce used by most management screens
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// A record type with its own REST collection
pub trait Resource: Record + Serialize + DeserializeOwned {
    /// Collection path under the API base URL, e.g. `patients`
    const COLLECTION: &'static str;
    /// Singular human label, e.g. `patient`
    const LABEL: &'static str;
    const SEARCH_DEBOUNCE: Duration = DEFAULT_SEARCH_DEBOUNCE;
    /// `DELETE` deactivates instead of removing
    const SOFT_DELETE: bool = false;
    const READ_ONLY: bool = false;

    /// Local pre-flight checks on a create or update body
    fn validate(_draft: &Changes, _mode: DraftMode) -> FieldErrors {
        FieldErrors::new()
    }

    /// Main text for a list row
    fn title(&self) -> String;

    /// Secondary text for a list row
    fn subtitle(&self) -> Option<String> {
        None
    }
}

/// Whether a draft is a full create body or a partial update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Create,
    Update,
}

/// Resources addressable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResourceKind {
    Patients,
    Doctors,
    Insurances,
    Analyses,
    AuditLogs,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Patients,
        ResourceKind::Doctors,
        ResourceKind::Insurances,
        ResourceKind::Analyses,
        ResourceKind::AuditLogs,
    ];

    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::Patients => Patient::COLLECTION,
            ResourceKind::Doctors => Doctor::COLLECTION,
            ResourceKind::Insurances => Insurance::COLLECTION,
            ResourceKind::Analyses => Analysis::COLLECTION,
            ResourceKind::AuditLogs => AuditLogEntry::COLLECTION,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Patients => "patients",
            ResourceKind::Doctors => "doctors",
            ResourceKind::Insurances => "insurances",
            ResourceKind::Analyses => "analyses",
            ResourceKind::AuditLogs => "audit-logs",
        };
        f.write_str(name)
    }
}

impl FromStr for ResourceKind {
    type Err = LabdeskError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s.to_lowercase() || kind.collection() == s)
            .ok_or_else(|| LabdeskError::UnknownResource(s.to_string()))
    }
}

/// Require a non-blank string field.
///
/// Creates must carry the field; updates only fail when they blank it out.
pub(crate) fn require_text(
    draft: &Changes,
    field: &str,
    mode: DraftMode,
    errors: &mut FieldErrors,
) {
    if mode == DraftMode::Update && !draft.contains_key(field) {
        return;
    }
    let present = draft
        .get(field)
        .and_then(|v| v.as_str())
        .is_some_and(|s| !s.trim().is_empty());
    if !present {
        errors.push(field, "This field is required.");
    }
}

/// Validate an optional field, only when the draft carries it
pub(crate) fn check_text<F>(draft: &Changes, field: &str, errors: &mut FieldErrors, check: F)
where
    F: Fn(&str) -> Option<&'static str>,
{
    if let Some(value) = draft.get(field).and_then(|v| v.as_str())
        && let Some(message) = check(value.trim())
    {
        errors.push(field, message);
    }
}
