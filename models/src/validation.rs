// models/src/validation.rs
//
// Field rules shared by the payload types. Each helper records its violation
// into a `FieldErrors` and returns the cleaned value when there is one.

use serde_json::Value;

use crate::errors::{FieldErrors, ValidationError};

/// Required, trimmed, bounded text.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    match value.map(str::trim) {
        None => {
            errors.add(field, ValidationError::Required);
            None
        }
        Some("") => {
            errors.add(field, ValidationError::Empty);
            None
        }
        Some(text) => bounded(errors, field, text, max),
    }
}

/// Optional bounded text; blank strings collapse to `None`.
pub fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Option<String> {
    match value.map(str::trim) {
        None | Some("") => None,
        Some(text) => bounded(errors, field, text, max),
    }
}

fn bounded(errors: &mut FieldErrors, field: &str, text: &str, max: usize) -> Option<String> {
    if text.chars().count() > max {
        errors.add(field, ValidationError::TooLong(max));
        None
    } else {
        Some(text.to_string())
    }
}

pub fn required_id(errors: &mut FieldErrors, field: &str, value: Option<u64>) -> Option<u64> {
    if value.is_none() {
        errors.add(field, ValidationError::Required);
    }
    value
}

pub fn email(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    let email = required_text(errors, field, value, 255)?;
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'))
        .unwrap_or(false);
    if valid {
        Some(email.to_lowercase())
    } else {
        errors.add(field, ValidationError::Invalid("must be a valid email address".into()));
        None
    }
}

pub fn password(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    match value {
        None => {
            errors.add(field, ValidationError::Required);
            None
        }
        Some(p) if p.chars().count() < 8 => {
            errors.add(field, ValidationError::TooShort(8));
            None
        }
        Some(p) if p.len() > 72 => {
            // bcrypt ignores bytes past 72
            errors.add(field, ValidationError::TooLong(72));
            None
        }
        Some(p) => Some(p.to_string()),
    }
}

/// Opaque JSON blobs must at least be objects.
pub fn json_object(errors: &mut FieldErrors, field: &str, value: Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(Value::Object(map)),
        Some(_) => {
            errors.add(field, ValidationError::Invalid("must be a JSON object".into()));
            None
        }
    }
}
