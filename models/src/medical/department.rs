// models/src/medical/department.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FieldErrors;
use crate::identifiers::RecordId;
use crate::validation;

/// A hospital department that specialists belong to and visits are sent to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDepartment {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl NewDepartment {
    pub fn validate(self, now: DateTime<Utc>) -> Result<Department, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = validation::required_text(&mut errors, "name", self.name.as_deref(), 100);
        let description = validation::optional_text(&mut errors, "description", self.description.as_deref(), 1000);
        errors.into_result()?;
        Ok(Department {
            id: 0,
            name: name.unwrap_or_default(),
            description,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
}

impl DepartmentPatch {
    pub fn apply(self, department: &mut Department, now: DateTime<Utc>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self
            .name
            .as_deref()
            .and_then(|n| validation::required_text(&mut errors, "name", Some(n), 100));
        let description = self
            .description
            .as_ref()
            .map(|d| validation::optional_text(&mut errors, "description", d.as_deref(), 1000));
        errors.into_result()?;
        if let Some(name) = name {
            department.name = name;
        }
        if let Some(description) = description {
            department.description = description;
        }
        department.updated_at = now;
        Ok(())
    }
}
