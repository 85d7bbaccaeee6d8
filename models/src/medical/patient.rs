// models/src/medical/patient.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, ValidationError};
use crate::identifiers::RecordId;
use crate::validation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    pub name: String,
    pub surname: String,
    pub birth_date: Option<NaiveDate>,
    pub fiscal_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPatient {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub fiscal_code: Option<String>,
}

impl NewPatient {
    pub fn validate(self, now: DateTime<Utc>) -> Result<Patient, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = validation::required_text(&mut errors, "name", self.name.as_deref(), 100);
        let surname = validation::required_text(&mut errors, "surname", self.surname.as_deref(), 100);
        check_birth_date(&mut errors, self.birth_date, now);
        let fiscal_code = fiscal_code(&mut errors, self.fiscal_code.as_deref());
        errors.into_result()?;

        Ok(Patient {
            id: 0,
            name: name.unwrap_or_default(),
            surname: surname.unwrap_or_default(),
            birth_date: self.birth_date,
            fiscal_code,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub fiscal_code: Option<Option<String>>,
}

impl PatientPatch {
    pub fn apply(self, patient: &mut Patient, now: DateTime<Utc>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self
            .name
            .as_deref()
            .and_then(|n| validation::required_text(&mut errors, "name", Some(n), 100));
        let surname = self
            .surname
            .as_deref()
            .and_then(|s| validation::required_text(&mut errors, "surname", Some(s), 100));
        if let Some(birth_date) = self.birth_date {
            check_birth_date(&mut errors, birth_date, now);
        }
        let fiscal = self
            .fiscal_code
            .as_ref()
            .map(|code| fiscal_code(&mut errors, code.as_deref()));
        errors.into_result()?;

        if let Some(name) = name {
            patient.name = name;
        }
        if let Some(surname) = surname {
            patient.surname = surname;
        }
        if let Some(birth_date) = self.birth_date {
            patient.birth_date = birth_date;
        }
        if let Some(fiscal) = fiscal {
            patient.fiscal_code = fiscal;
        }
        patient.updated_at = now;
        Ok(())
    }
}

fn check_birth_date(errors: &mut FieldErrors, birth_date: Option<NaiveDate>, now: DateTime<Utc>) {
    if let Some(date) = birth_date {
        if date > now.date_naive() {
            errors.add("birth_date", ValidationError::Invalid("must not be in the future".into()));
        }
    }
}

/// Italian codice fiscale: 16 alphanumerics, stored upper-case.
fn fiscal_code(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    let code = validation::optional_text(errors, "fiscal_code", value, 16)?;
    if code.len() == 16 && code.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(code.to_ascii_uppercase())
    } else {
        errors.add("fiscal_code", ValidationError::Invalid("must be 16 letters or digits".into()));
        None
    }
}
