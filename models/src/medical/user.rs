// models/src/medical/user.rs
//
// Staff accounts. The stored `User` keeps the bcrypt hash; API responses use
// `UserSummary`, which never carries it.

use std::fmt;
use std::str::FromStr;

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, ModelResult, ValidationError};
use crate::identifiers::{IdentityCode, RecordId};
use crate::validation;

/// Staff role. Decides what a user may do and which emergencies they see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Admin,
    /// Pronto Soccorso (emergency department) operator.
    PsOperator,
    Specialist,
    /// 118 dispatch / ambulance operator.
    #[serde(rename = "operator_118")]
    Operator118,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Admin,
        Permission::PsOperator,
        Permission::Specialist,
        Permission::Operator118,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Admin => "admin",
            Permission::PsOperator => "ps_operator",
            Permission::Specialist => "specialist",
            Permission::Operator118 => "operator_118",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ValidationError::NotIn("admin, ps_operator, specialist, operator_118".into()))
    }
}

// --- DTO for new user registration ---
// Holds the plaintext password until it is hashed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub identity_code: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub permission: Option<Permission>,
    pub department_id: Option<RecordId>,
}

/// A `NewUser` that passed field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidNewUser {
    pub name: String,
    pub surname: String,
    pub identity_code: IdentityCode,
    pub email: String,
    pub password: String,
    pub permission: Permission,
    pub department_id: Option<RecordId>,
}

impl NewUser {
    /// Checks field rules. Uniqueness and department existence are the
    /// store's business.
    pub fn validate(self) -> Result<ValidNewUser, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = validation::required_text(&mut errors, "name", self.name.as_deref(), 100);
        let surname = validation::required_text(&mut errors, "surname", self.surname.as_deref(), 100);
        let identity_code = match self.identity_code {
            None => {
                errors.add("identity_code", ValidationError::Required);
                None
            }
            Some(code) => IdentityCode::new(code.trim().to_string())
                .map_err(|e| errors.add("identity_code", e))
                .ok(),
        };
        let email = validation::email(&mut errors, "email", self.email.as_deref());
        let password = validation::password(&mut errors, "password", self.password.as_deref());
        if self.permission.is_none() {
            errors.add("permission", ValidationError::Required);
        }
        if self.permission == Some(Permission::Specialist) && self.department_id.is_none() {
            errors.add(
                "department_id",
                ValidationError::Invalid("is required for specialists".into()),
            );
        }

        match (name, surname, identity_code, email, password, self.permission) {
            (Some(name), Some(surname), Some(identity_code), Some(email), Some(password), Some(permission))
                if errors.is_empty() =>
            {
                Ok(ValidNewUser {
                    name,
                    surname,
                    identity_code,
                    email,
                    password,
                    permission,
                    department_id: self.department_id,
                })
            }
            _ => Err(errors),
        }
    }
}

// --- Stored user ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub name: String,
    pub surname: String,
    pub identity_code: IdentityCode,
    pub email: String,
    pub password_hash: String,
    pub permission: Permission,
    pub department_id: Option<RecordId>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Hashes a plaintext password.
    pub fn hash_password(password: &str) -> Result<String, BcryptError> {
        hash(password, DEFAULT_COST)
    }

    /// Verifies a plaintext password against a stored hash.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, BcryptError> {
        verify(password, hash)
    }

    /// Creates a `User` from a validated registration, hashing the password.
    /// The id is assigned by the store on insert.
    pub fn from_new_user(new_user: ValidNewUser, now: DateTime<Utc>) -> ModelResult<Self> {
        let password_hash = Self::hash_password(&new_user.password)?;
        Ok(User {
            id: 0,
            name: new_user.name,
            surname: new_user.surname,
            identity_code: new_user.identity_code,
            email: new_user.email,
            password_hash,
            permission: new_user.permission,
            department_id: new_user.department_id,
            last_login: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }

    pub fn is_specialist(&self) -> bool {
        self.permission == Permission::Specialist
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary::from(self)
    }

    /// Applies a profile update. The password, when present, is re-hashed.
    pub fn apply_profile(&mut self, patch: ValidProfilePatch, now: DateTime<Utc>) -> ModelResult<()> {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(surname) = patch.surname {
            self.surname = surname;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password_hash = Self::hash_password(&password)?;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: RecordId,
    pub name: String,
    pub surname: String,
    pub identity_code: IdentityCode,
    pub email: String,
    pub permission: Permission,
    pub department_id: Option<RecordId>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            name: user.name.clone(),
            surname: user.surname.clone(),
            identity_code: user.identity_code.clone(),
            email: user.email.clone(),
            permission: user.permission,
            department_id: user.department_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidProfilePatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl ProfilePatch {
    pub fn validate(self) -> Result<ValidProfilePatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self
            .name
            .as_deref()
            .and_then(|n| validation::required_text(&mut errors, "name", Some(n), 100));
        let surname = self
            .surname
            .as_deref()
            .and_then(|s| validation::required_text(&mut errors, "surname", Some(s), 100));
        let email = self
            .email
            .as_deref()
            .and_then(|e| validation::email(&mut errors, "email", Some(e)));
        let password = self
            .password
            .as_deref()
            .and_then(|p| validation::password(&mut errors, "password", Some(p)));
        errors.into_result()?;
        Ok(ValidProfilePatch { name, surname, email, password })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String, // plaintext login attempt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> NewUser {
        NewUser {
            name: Some("Giulia".into()),
            surname: Some("Rossi".into()),
            identity_code: Some("SPC-0001".into()),
            email: Some("giulia.rossi@hospital.example".into()),
            password: Some("correct horse".into()),
            permission: Some(Permission::Specialist),
            department_id: Some(3),
        }
    }

    #[test]
    fn should_validate_complete_registration() {
        let valid = registration().validate().unwrap();
        assert_eq!(valid.permission, Permission::Specialist);
        assert_eq!(valid.identity_code.as_ref(), "SPC-0001");
    }

    #[test]
    fn should_require_department_for_specialists() {
        let mut new_user = registration();
        new_user.department_id = None;
        let errors = new_user.validate().unwrap_err();
        assert!(errors.has("department_id"));
    }

    #[test]
    fn should_collect_every_missing_field() {
        let errors = NewUser::default().validate().unwrap_err();
        for field in ["name", "surname", "identity_code", "email", "password", "permission"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn should_hash_and_verify_password() {
        let user = User::from_new_user(registration().validate().unwrap(), Utc::now()).unwrap();
        assert_ne!(user.password_hash, "correct horse");
        assert!(User::verify_password("correct horse", &user.password_hash).unwrap());
        assert!(!User::verify_password("wrong", &user.password_hash).unwrap());
    }

    #[test]
    fn summary_omits_password_hash() {
        let user = User::from_new_user(registration().validate().unwrap(), Utc::now()).unwrap();
        let json = serde_json::to_value(user.summary()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["permission"], "specialist");
    }

    #[test]
    fn should_parse_permission_names() {
        assert_eq!("operator_118".parse::<Permission>().unwrap(), Permission::Operator118);
        assert!("nurse".parse::<Permission>().is_err());
        let json = serde_json::to_string(&Permission::Operator118).unwrap();
        assert_eq!(json, "\"operator_118\"");
    }
}
