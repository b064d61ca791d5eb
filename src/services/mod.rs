pub mod cart;
pub mod diary;
pub mod order;

use validator::ValidationErrors;

use crate::error::AppError;

/// A successful service call: the affected entity plus the message shown to
/// the user on the page they land on.
#[derive(Debug)]
pub struct Outcome<T> {
    pub message: String,
    pub data: T,
}

impl<T> Outcome<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// First field-level message from a `validator` run, by field name so the
/// reported problem is stable across runs.
pub(crate) fn validation_error(errors: ValidationErrors) -> AppError {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by_key(|(field, _)| **field);

    let message = fields
        .into_iter()
        .flat_map(|(_, errs)| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request".into());

    AppError::Validation(message)
}
