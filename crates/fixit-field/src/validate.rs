//! Required-field validation.

use crate::error::FieldError;
use crate::key::Selection;
use crate::policy::FieldFlags;

/// Message shown inline when a required field is left empty.
pub const REQUIRED_FIELD_MESSAGE: &str = "You can't leave this blank.";

/// `Err(FieldError::Required)` when `flags.required` and nothing is selected.
pub fn validate(flags: &FieldFlags, selection: &Selection) -> Result<(), FieldError> {
    if flags.required && selection.is_empty() {
        return Err(FieldError::Required);
    }
    Ok(())
}
