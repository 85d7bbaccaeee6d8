// models/src/medical/investigation.rs
//
// Diagnostic investigation catalog and the investigations actually performed
// during an emergency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, ValidationError};
use crate::identifiers::RecordId;
use crate::validation;

pub const NOTES_MAX: usize = 5000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    pub id: RecordId,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewInvestigation {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl NewInvestigation {
    pub fn validate(self, now: DateTime<Utc>) -> Result<Investigation, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = validation::required_text(&mut errors, "name", self.name.as_deref(), 150);
        let category = validation::optional_text(&mut errors, "category", self.category.as_deref(), 100);
        let description =
            validation::optional_text(&mut errors, "description", self.description.as_deref(), 1000);
        errors.into_result()?;
        Ok(Investigation {
            id: 0,
            name: name.unwrap_or_default(),
            category,
            description,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvestigationPatch {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub category: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
}

impl InvestigationPatch {
    pub fn apply(self, investigation: &mut Investigation, now: DateTime<Utc>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self
            .name
            .as_deref()
            .and_then(|n| validation::required_text(&mut errors, "name", Some(n), 150));
        let category = self
            .category
            .as_ref()
            .map(|c| validation::optional_text(&mut errors, "category", c.as_deref(), 100));
        let description = self
            .description
            .as_ref()
            .map(|d| validation::optional_text(&mut errors, "description", d.as_deref(), 1000));
        errors.into_result()?;

        if let Some(name) = name {
            investigation.name = name;
        }
        if let Some(category) = category {
            investigation.category = category;
        }
        if let Some(description) = description {
            investigation.description = description;
        }
        investigation.updated_at = now;
        Ok(())
    }
}

/// An investigation carried out on the patient of an emergency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationPerformed {
    pub id: RecordId,
    pub emergency_id: RecordId,
    pub investigation_id: RecordId,
    pub performed_by: RecordId,
    pub performed_at: DateTime<Utc>,
    pub outcome: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewInvestigationPerformed {
    pub emergency_id: Option<RecordId>,
    pub investigation_id: Option<RecordId>,
    /// Defaults to the acting user.
    pub performed_by: Option<RecordId>,
    /// Defaults to now; may be back-dated, never in the future.
    pub performed_at: Option<DateTime<Utc>>,
    pub outcome: Option<String>,
    pub notes: Option<String>,
}

impl NewInvestigationPerformed {
    pub fn validate(self, acting_user: RecordId, now: DateTime<Utc>) -> Result<InvestigationPerformed, FieldErrors> {
        let mut errors = FieldErrors::new();
        let emergency_id = validation::required_id(&mut errors, "emergency_id", self.emergency_id);
        let investigation_id = validation::required_id(&mut errors, "investigation_id", self.investigation_id);
        let outcome = validation::optional_text(&mut errors, "outcome", self.outcome.as_deref(), NOTES_MAX);
        let notes = validation::optional_text(&mut errors, "notes", self.notes.as_deref(), NOTES_MAX);
        let performed_at = self.performed_at.unwrap_or(now);
        if performed_at > now {
            errors.add(
                "performed_at",
                ValidationError::Invalid("must not be in the future".into()),
            );
        }
        errors.into_result()?;

        Ok(InvestigationPerformed {
            id: 0,
            emergency_id: emergency_id.unwrap_or_default(),
            investigation_id: investigation_id.unwrap_or_default(),
            performed_by: self.performed_by.unwrap_or(acting_user),
            performed_at,
            outcome,
            notes,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Only the findings are editable once an investigation is recorded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvestigationPerformedPatch {
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub outcome: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
}

impl InvestigationPerformedPatch {
    pub fn apply(self, performed: &mut InvestigationPerformed, now: DateTime<Utc>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let outcome = self
            .outcome
            .as_ref()
            .map(|o| validation::optional_text(&mut errors, "outcome", o.as_deref(), NOTES_MAX));
        let notes = self
            .notes
            .as_ref()
            .map(|n| validation::optional_text(&mut errors, "notes", n.as_deref(), NOTES_MAX));
        errors.into_result()?;

        if let Some(outcome) = outcome {
            performed.outcome = outcome;
        }
        if let Some(notes) = notes {
            performed.notes = notes;
        }
        performed.updated_at = now;
        Ok(())
    }
}
