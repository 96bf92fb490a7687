use crate::error::{AppError, AppResult};

/// Reject a missing or blank required field
pub fn validate_required(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Like `validate_required`, but only when the field was supplied
pub fn validate_optional(value: Option<&str>, field: &str) -> AppResult<()> {
    match value {
        Some(value) => validate_required(value, field),
        None => Ok(()),
    }
}
