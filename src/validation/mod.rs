// Request validation with grouped per-field errors
use axum::extract::Query;
use axum::http::Uri;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ApiError;

/// Ordered field -> messages multimap. Violations accumulate here so a
/// response reports every broken field at once instead of one per round trip.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
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
        if let Some((_, messages)) = self.entries.iter_mut().find(|(f, _)| *f == field) {
            messages.push(message);
        } else {
            self.entries.push((field, vec![message]));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn field_count(&self) -> usize {
        self.entries.len()
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Structural validation beyond what deserialization enforces. Implementations
/// collect every violation rather than stopping at the first.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// Shape all collected violations into a single validation failure:
/// `{"fields": {<field>: [messages...]}}` under the standard error envelope.
pub fn format_validation_error(errors: FieldErrors) -> ApiError {
    let mut fields = serde_json::Map::new();
    for (field, messages) in errors.entries {
        fields.insert(field, json!(messages));
    }
    ApiError::invalid_request(json!({ "fields": fields }))
}

/// Deserialize and validate an already-parsed JSON value
pub fn validate_request<T>(value: Value) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(value).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.push("body", format!("invalid request shape: {}", e));
        format_validation_error(errors)
    })?;
    parsed.validate().map_err(format_validation_error)?;
    Ok(parsed)
}

/// Validate a raw JSON body. Unparsable JSON is a validation failure, not a
/// panic or a bare 500.
pub fn validate_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.push("body", format!("invalid JSON: {}", e));
        format_validation_error(errors)
    })?;
    validate_request(value)
}

/// Validate query parameters from the request URI
pub fn validate_query<T>(uri: &Uri) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let Query(params) = Query::<T>::try_from_uri(uri).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.push("query", format!("invalid query string: {}", e));
        format_validation_error(errors)
    })?;
    params.validate().map_err(format_validation_error)?;
    Ok(params)
}
