// models/src/identifiers.rs

use core::ops::Deref;
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Row identifier allocated by the store.
pub type RecordId = u64;

/// A staff identity code (badge or registry number). Identity codes are
/// short, case-sensitive and unique across users.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityCode(String);

impl IdentityCode {
    pub const MAX_LEN: usize = 32;

    /// Creates a new identity code.
    ///
    /// # Errors
    /// Returns a `ValidationError` if `value` is empty, longer than
    /// `MAX_LEN` bytes, or contains anything other than ASCII
    /// alphanumerics, `-` and `_`.
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::Empty);
        }
        if value.len() > Self::MAX_LEN {
            return Err(ValidationError::TooLong(Self::MAX_LEN));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ValidationError::Invalid(
                "may only contain letters, digits, dashes and underscores".into(),
            ));
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for IdentityCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for IdentityCode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for IdentityCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for IdentityCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for IdentityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<IdentityCode> for String {
    fn from(value: IdentityCode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::IdentityCode;
    use crate::errors::ValidationError;
    use core::str::FromStr;

    #[test]
    fn should_not_create_empty_identity_code() {
        let code = IdentityCode::new("".to_string());
        assert_eq!(code.unwrap_err(), ValidationError::Empty);
    }

    #[test]
    fn should_not_create_too_long_identity_code() {
        let code = IdentityCode::new("a".repeat(33));
        assert_eq!(code.unwrap_err(), ValidationError::TooLong(32));
    }

    #[test]
    fn should_reject_spaces() {
        assert!(IdentityCode::new("PS 001".to_string()).is_err());
    }

    #[test]
    fn should_convert_identity_code_from_str() {
        let code = IdentityCode::from_str("PS-001_a");
        assert!(code.is_ok());
        assert_eq!(code.unwrap().as_ref(), "PS-001_a");
    }

    #[test]
    fn should_refuse_invalid_code_on_deserialize() {
        let parsed: Result<IdentityCode, _> = serde_json::from_str("\"bad code!\"");
        assert!(parsed.is_err());
    }
}
