use thiserror::Error;

use crate::api::error::{ApiErrorKind, FieldErrors};
use crate::types::RecordId;

#[derive(Error, Debug)]
pub enum LabdeskError {
    // Local pre-flight validation, no request was sent
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    // Errors reported by the API in a structured body
    #[error("{}", api_message(.status, .kind))]
    Api { status: u16, kind: ApiErrorKind },

    // Transport failures (DNS, refused connection, timeout, broken body)
    #[error("network error: {0}")]
    Network(String),

    #[error("record {0} not found")]
    RecordNotFound(RecordId),

    #[error("a change to record {0} is already in progress")]
    MutationInFlight(RecordId),

    #[error("{0} records are read-only")]
    ReadOnly(&'static str),

    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

fn api_message(status: &u16, kind: &ApiErrorKind) -> String {
    match kind.message() {
        Some(message) => message,
        None => format!("request failed with HTTP {status}"),
    }
}

impl From<reqwest::Error> for LabdeskError {
    fn from(err: reqwest::Error) -> Self {
        // A decode failure on a 2xx body is a contract problem, not connectivity
        if err.is_decode() {
            return LabdeskError::Other(format!("unexpected response from server: {err}"));
        }
        if let Some(status) = err.status() {
            return LabdeskError::Api {
                status: status.as_u16(),
                kind: ApiErrorKind::Unrecognized,
            };
        }
        LabdeskError::Network(err.to_string())
    }
}

impl LabdeskError {
    /// Text shown to the user in an error banner or notice.
    ///
    /// Transport errors collapse into one generic connectivity message so
    /// they read differently from anything the API said.
    pub fn user_message(&self) -> String {
        match self {
            LabdeskError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Per-field messages to show inline next to inputs, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            LabdeskError::Validation(fields) => Some(fields),
            LabdeskError::Api {
                kind: ApiErrorKind::Fields { fields, .. },
                ..
            } => Some(fields),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, LabdeskError::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, LabdeskError>;
