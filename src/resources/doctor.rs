use serde::{Deserialize, Serialize};

use crate::api::{Changes, FieldErrors};
use crate::audit::AuditFields;
use crate::types::{Record, RecordId};

use super::{DraftMode, Resource, require_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    /// Medical license number
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditFields,
}

fn default_active() -> bool {
    true
}

impl Record for Doctor {
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

impl Resource for Doctor {
    const COLLECTION: &'static str = "doctors";
    const LABEL: &'static str = "doctor";
    const SOFT_DELETE: bool = true;

    fn validate(draft: &Changes, mode: DraftMode) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(draft, "first_name", mode, &mut errors);
        require_text(draft, "last_name", mode, &mut errors);
        require_text(draft, "license", mode, &mut errors);
        errors
    }

    fn title(&self) -> String {
        format!("Dr. {} {}", self.first_name, self.last_name)
    }

    fn subtitle(&self) -> Option<String> {
        match &self.specialty {
            Some(specialty) => Some(format!("MP {} · {specialty}", self.license)),
            None => Some(format!("MP {}", self.license)),
        }
    }
}
