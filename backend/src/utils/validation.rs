//! Helpers for turning `validator` failures into service errors.

use crate::errors::ServiceError;
use validator::{Validate, ValidationErrors};

/// Formats validator::ValidationErrors into a single readable message
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                format!(
                    "{}: {}",
                    field,
                    error.message.as_ref().unwrap_or(&"Invalid value".into())
                )
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

/// Runs the derived validation rules, mapping failures to `ServiceError::Validation`
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|errors| ServiceError::validation(format_validation_errors(&errors)))
}
