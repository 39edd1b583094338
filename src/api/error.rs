//! Structured API error bodies.
//!
//! The server reports failures in a handful of shapes:
//!
//! ```json
//! {"detail": "Not found."}
//! {"error": "Patient has pending protocols"}
//! {"message": "Invalid token"}
//! {"dni": ["A patient with this DNI already exists."]}
//! {"errors": {"email": ["Enter a valid email address."]}}
//! ```
//!
//! [`parse_api_error`] turns any of them into an [`ApiErrorKind`] with a fixed
//! precedence: `detail`, then `error`, then `message`, then the first
//! array-valued field rendered as `"field: firstValue"`.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Ordered per-field messages, for inline display next to form inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        let message = message.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field, vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn first_for(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    /// `"field: firstValue"` for the first field, used as a one-line summary
    pub fn summary(&self) -> Option<String> {
        self.entries.first().map(|(field, messages)| match messages.first() {
            Some(first) => format!("{field}: {first}"),
            None => field.clone(),
        })
    }

    /// Convert into a `Result`, failing when any field has a message
    pub fn into_result(self) -> crate::error::Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(crate::error::LabdeskError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// What the server said went wrong
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// A general message (`detail`, `error` or `message`) for a banner
    General(String),
    /// Per-field messages; `summary` is the first one as `"field: value"`
    Fields { summary: String, fields: FieldErrors },
    /// The body carried nothing usable
    Unrecognized,
}

impl ApiErrorKind {
    pub fn message(&self) -> Option<String> {
        match self {
            ApiErrorKind::General(message) => Some(message.clone()),
            ApiErrorKind::Fields { summary, .. } => Some(summary.clone()),
            ApiErrorKind::Unrecognized => None,
        }
    }
}

const MESSAGE_KEYS: [&str; 3] = ["detail", "error", "message"];

/// Classify an API error body.
pub fn parse_api_error(body: &Value) -> ApiErrorKind {
    let Some(object) = body.as_object() else {
        return match body {
            Value::String(s) if !s.trim().is_empty() => ApiErrorKind::General(s.trim().to_string()),
            Value::Array(items) => first_string(items)
                .map(ApiErrorKind::General)
                .unwrap_or(ApiErrorKind::Unrecognized),
            _ => ApiErrorKind::Unrecognized,
        };
    };

    for key in MESSAGE_KEYS {
        if let Some(message) = object.get(key).and_then(message_text) {
            return ApiErrorKind::General(message);
        }
    }

    let mut fields = FieldErrors::new();
    for (field, value) in object {
        if let Value::Array(items) = value {
            for message in items.iter().filter_map(Value::as_str) {
                fields.push(field.clone(), message);
            }
        }
    }

    // Nested `errors: {field: [..]}` bodies
    if let Some(Value::Object(nested)) = object.get("errors") {
        for (field, value) in nested {
            match value {
                Value::Array(items) => {
                    for message in items.iter().filter_map(Value::as_str) {
                        fields.push(field.clone(), message);
                    }
                }
                Value::String(message) => fields.push(field.clone(), message.clone()),
                _ => {}
            }
        }
    }

    match fields.summary() {
        Some(summary) => ApiErrorKind::Fields { summary, fields },
        None => ApiErrorKind::Unrecognized,
    }
}

/// Classify a raw response body that may not be JSON at all
pub fn parse_api_error_text(body: &str) -> ApiErrorKind {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => parse_api_error(&value),
        // HTML error pages are noise, not a message
        Err(_) => ApiErrorKind::Unrecognized,
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => first_string(items),
        _ => None,
    }
}

fn first_string(items: &[Value]) -> Option<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .find(|s| !s.trim().is_empty())
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_wins_over_everything() {
        let body = json!({
            "message": "m",
            "error": "e",
            "detail": "Not found.",
            "name": ["required"]
        });
        assert_eq!(parse_api_error(&body), ApiErrorKind::General("Not found.".to_string()));
    }

    #[test]
    fn test_error_before_message() {
        let body = json!({"message": "m", "error": "Patient has pending protocols"});
        assert_eq!(
            parse_api_error(&body),
            ApiErrorKind::General("Patient has pending protocols".to_string())
        );
    }

    #[test]
    fn test_message_used_last() {
        let body = json!({"message": "Invalid token"});
        assert_eq!(parse_api_error(&body).message().as_deref(), Some("Invalid token"));
    }

    #[test]
    fn test_first_array_field_in_document_order() {
        let body = json!({
            "dni": ["A patient with this DNI already exists."],
            "email": ["Enter a valid email address.", "Too long."]
        });
        let kind = parse_api_error(&body);
        let ApiErrorKind::Fields { summary, fields } = kind else {
            panic!("expected field errors");
        };
        assert_eq!(summary, "dni: A patient with this DNI already exists.");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("email").unwrap().len(), 2);
    }

    #[test]
    fn test_nested_errors_object() {
        let body = json!({"errors": {"email": ["Enter a valid email address."]}});
        let kind = parse_api_error(&body);
        assert_eq!(
            kind.message().as_deref(),
            Some("email: Enter a valid email address.")
        );
    }

    #[test]
    fn test_blank_detail_is_skipped() {
        let body = json!({"detail": "  ", "message": "fallback"});
        assert_eq!(parse_api_error(&body).message().as_deref(), Some("fallback"));
    }

    #[test]
    fn test_detail_as_list() {
        let body = json!({"detail": ["Only one active protocol allowed."]});
        assert_eq!(
            parse_api_error(&body).message().as_deref(),
            Some("Only one active protocol allowed.")
        );
    }

    #[test]
    fn test_non_field_errors_array_top_level() {
        let body = json!(["Something broke"]);
        assert_eq!(
            parse_api_error(&body),
            ApiErrorKind::General("Something broke".to_string())
        );
    }

    #[test]
    fn test_unrecognized_bodies() {
        assert_eq!(parse_api_error(&json!({})), ApiErrorKind::Unrecognized);
        assert_eq!(parse_api_error(&json!({"count": 3})), ApiErrorKind::Unrecognized);
        assert_eq!(parse_api_error(&Value::Null), ApiErrorKind::Unrecognized);
        assert_eq!(
            parse_api_error_text("<html>502 Bad Gateway</html>"),
            ApiErrorKind::Unrecognized
        );
    }

    #[test]
    fn test_field_errors_display_and_result() {
        let mut fields = FieldErrors::new();
        fields.push("first_name", "Required.");
        fields.push("first_name", "Too short.");
        fields.push("dni", "Digits only.");
        assert_eq!(fields.to_string(), "first_name: Required. Too short.; dni: Digits only.");
        assert!(fields.into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
