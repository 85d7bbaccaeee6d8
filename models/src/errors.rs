// models/src/errors.rs

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
pub use thiserror::Error;

/// A single rule violated by a payload field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("is required")]
    Required,
    #[error("must not be empty")]
    Empty,
    #[error("may not be greater than {0} characters")]
    TooLong(usize),
    #[error("must be at least {0} characters")]
    TooShort(usize),
    #[error("must be at least {0}")]
    Min(i64),
    #[error("has already been taken")]
    Taken,
    #[error("refers to a record that does not exist")]
    Missing,
    #[error("must be one of: {0}")]
    NotIn(String),
    #[error("is invalid: {0}")]
    Invalid(String),
}

/// Per-field validation messages, keyed by payload field name.
///
/// Serializes as `{"field": ["message", ...]}`, the shape the dashboard
/// renders next to each form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an error set holding one violation.
    pub fn single(field: &str, error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(field, error);
        errors
    }

    /// One field carrying an already worded message.
    pub fn single_message(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.0.insert(field.to_string(), vec![message.to_string()]);
        errors
    }

    /// Records a violation on `field`, rendered as a sentence.
    pub fn add(&mut self, field: &str, error: ValidationError) {
        let message = format!("The {} field {}.", field.replace('_', " "), error);
        self.0.entry(field.to_string()).or_default().push(message);
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Total number of messages across all fields.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn first_message(&self) -> Option<&str> {
        self.0.values().flat_map(|m| m.iter()).next().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.first_message() else {
            return write!(f, "The given data was invalid.");
        };
        match self.len() - 1 {
            0 => write!(f, "{}", first),
            1 => write!(f, "{} (and 1 more error)", first),
            n => write!(f, "{} (and {} more errors)", first, n),
        }
    }
}

impl std::error::Error for FieldErrors {}

/// A status change the workflow does not allow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot move {entity} from `{from}` to `{to}`")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{0}")]
    Validation(#[from] FieldErrors),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_render_field_sentences() {
        let mut errors = FieldErrors::new();
        errors.add("patient_id", ValidationError::Required);
        assert_eq!(
            errors.get("patient_id").unwrap(),
            ["The patient id field is required.".to_string()]
        );
    }

    #[test]
    fn should_summarize_extra_errors() {
        let mut errors = FieldErrors::new();
        errors.add("description", ValidationError::Required);
        assert_eq!(errors.to_string(), "The description field is required.");

        errors.add("patient_id", ValidationError::Missing);
        assert!(errors.to_string().ends_with("(and 1 more error)"));

        errors.add("user_id", ValidationError::Missing);
        assert!(errors.to_string().ends_with("(and 2 more errors)"));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn should_serialize_as_field_map() {
        let errors = FieldErrors::single("size_bytes", ValidationError::Min(0));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["size_bytes"][0], "The size bytes field must be at least 0.");
    }

    #[test]
    fn empty_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
