use serde::{Deserialize, Serialize};

use crate::api::{Changes, FieldErrors};
use crate::audit::AuditFields;
use crate::types::{Record, RecordId};

use super::{DraftMode, Resource, check_text, require_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    /// National identity document number
    pub dni: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance: Option<RecordId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditFields,
}

fn default_active() -> bool {
    true
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for Patient {
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

impl Resource for Patient {
    const COLLECTION: &'static str = "patients";
    const LABEL: &'static str = "patient";
    const SOFT_DELETE: bool = true;

    fn validate(draft: &Changes, mode: DraftMode) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(draft, "first_name", mode, &mut errors);
        require_text(draft, "last_name", mode, &mut errors);
        require_text(draft, "dni", mode, &mut errors);
        check_text(draft, "dni", &mut errors, |dni| {
            if !dni.is_empty() && !dni.chars().all(|c| c.is_ascii_digit()) {
                Some("DNI must contain digits only.")
            } else {
                None
            }
        });
        check_text(draft, "email", &mut errors, |email| {
            if !email.is_empty() && !email.contains('@') {
                Some("Enter a valid email address.")
            } else {
                None
            }
        });
        errors
    }

    fn title(&self) -> String {
        self.full_name()
    }

    fn subtitle(&self) -> Option<String> {
        Some(format!("DNI {}", self.dni))
    }
}
