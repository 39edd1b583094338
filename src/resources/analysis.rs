use serde::{Deserialize, Serialize};

use crate::api::{Changes, FieldErrors};
use crate::audit::AuditFields;
use crate::types::{Record, RecordId};

use super::{DraftMode, Resource, require_text};

/// An entry in the analysis catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: RecordId,
    pub code: String,
    pub name: String,
    /// Billing units charged for the analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measure_unit: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditFields,
}

fn default_active() -> bool {
    true
}

impl Record for Analysis {
    fn id(&self) -> RecordId {
        self.id
    }

    fn audit(&self) -> Option<&AuditFields> {
        Some(&self.audit)
    }

    fn is_active(&self) -> Option<bool> {
        Some(self.is_active)
    }

    fn with_active(&self, active: bool) -> Option<Self> {
        Some(Self {
            is_active: active,
            ..self.clone()
        })
    }
}

impl Resource for Analysis {
    const COLLECTION: &'static str = "analyses";
    const LABEL: &'static str = "analysis";

    fn validate(draft: &Changes, mode: DraftMode) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(draft, "code", mode, &mut errors);
        require_text(draft, "name", mode, &mut errors);
        errors
    }

    fn title(&self) -> String {
        format!("{} {}", self.code, self.name)
    }

    fn subtitle(&self) -> Option<String> {
        self.measure_unit.clone()
    }
}
