//! Input validation primitives.

use crate::error::{Error, Result};

/// Require a collection to be non-empty.
pub fn require_non_empty_vec<'a, T>(vec: &'a [T], field: &str, message: &str) -> Result<&'a [T]> {
    if vec.is_empty() {
        Err(Error::validation_missing_argument(vec![field.to_string()])
            .with_hint(message.to_string()))
    } else {
        Ok(vec)
    }
}
