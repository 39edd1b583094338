use serde::{Deserialize, Serialize};

use crate::api::{Changes, FieldErrors};
use crate::audit::AuditFields;
use crate::types::{Record, RecordId};

use super::{DraftMode, Resource, check_text, require_text};

/// An insurance provider that covers patient analyses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insurance {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Value of one billing unit, as sent by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_value: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: AuditFields,
}

fn default_active() -> bool {
    true
}

impl Record for Insurance {
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

impl Resource for Insurance {
    const COLLECTION: &'static str = "insurances";
    const LABEL: &'static str = "insurance";

    fn validate(draft: &Changes, mode: DraftMode) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(draft, "name", mode, &mut errors);
        check_text(draft, "unit_value", &mut errors, |value| {
            if !value.is_empty() && value.parse::<f64>().is_err() {
                Some("Enter a number.")
            } else {
                None
            }
        });
        errors
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn subtitle(&self) -> Option<String> {
        self.code.clone()
    }
}
