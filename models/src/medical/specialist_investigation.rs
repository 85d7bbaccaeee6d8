// models/src/medical/specialist_investigation.rs
//
// Department-level investigation catalog and the requests the ED sends
// against it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, ModelError, ValidationError};
use crate::identifiers::RecordId;
use crate::validation;
use crate::workflow::Workflow;

pub const OUTCOME_MAX: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistInvestigation {
    pub id: RecordId,
    pub department_id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSpecialistInvestigation {
    pub department_id: Option<RecordId>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl NewSpecialistInvestigation {
    pub fn validate(self, now: DateTime<Utc>) -> Result<SpecialistInvestigation, FieldErrors> {
        let mut errors = FieldErrors::new();
        let department_id = validation::required_id(&mut errors, "department_id", self.department_id);
        let name = validation::required_text(&mut errors, "name", self.name.as_deref(), 150);
        let description =
            validation::optional_text(&mut errors, "description", self.description.as_deref(), 1000);
        errors.into_result()?;
        Ok(SpecialistInvestigation {
            id: 0,
            department_id: department_id.unwrap_or_default(),
            name: name.unwrap_or_default(),
            description,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecialistInvestigationPatch {
    pub department_id: Option<RecordId>,
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
}

impl SpecialistInvestigationPatch {
    pub fn apply(self, item: &mut SpecialistInvestigation, now: DateTime<Utc>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self
            .name
            .as_deref()
            .and_then(|n| validation::required_text(&mut errors, "name", Some(n), 150));
        let description = self
            .description
            .as_ref()
            .map(|d| validation::optional_text(&mut errors, "description", d.as_deref(), 1000));
        errors.into_result()?;

        if let Some(department_id) = self.department_id {
            item.department_id = department_id;
        }
        if let Some(name) = name {
            item.name = name;
        }
        if let Some(description) = description {
            item.description = description;
        }
        item.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Requested,
    Scheduled,
    Performed,
    Reported,
    Closed,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 6] = [
        RequestStatus::Requested,
        RequestStatus::Scheduled,
        RequestStatus::Performed,
        RequestStatus::Reported,
        RequestStatus::Closed,
        RequestStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Requested => "requested",
            RequestStatus::Scheduled => "scheduled",
            RequestStatus::Performed => "performed",
            RequestStatus::Reported => "reported",
            RequestStatus::Closed => "closed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    fn next(self) -> Option<RequestStatus> {
        match self {
            RequestStatus::Requested => Some(RequestStatus::Scheduled),
            RequestStatus::Scheduled => Some(RequestStatus::Performed),
            RequestStatus::Performed => Some(RequestStatus::Reported),
            RequestStatus::Reported => Some(RequestStatus::Closed),
            RequestStatus::Closed | RequestStatus::Cancelled => None,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Workflow for RequestStatus {
    const ENTITY: &'static str = "specialist investigation request";

    fn allows(self, to: Self) -> bool {
        if to == RequestStatus::Cancelled {
            return matches!(self, RequestStatus::Requested | RequestStatus::Scheduled);
        }
        self.next() == Some(to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistInvestigationRequest {
    pub id: RecordId,
    pub emergency_id: RecordId,
    pub specialist_investigation_id: RecordId,
    pub requested_by: RecordId,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub performed_at: Option<DateTime<Utc>>,
    pub reported_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub outcome: Option<String>,
    pub disposition: Option<String>,
    pub needs_follow_up: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SpecialistInvestigationRequest {
    pub fn is_open(&self) -> bool {
        !matches!(self.status, RequestStatus::Closed | RequestStatus::Cancelled)
    }

    pub fn change_status(&mut self, to: RequestStatus, now: DateTime<Utc>) -> Result<bool, ModelError> {
        let next = self.status.transition(to)?;
        if next == self.status {
            return Ok(false);
        }
        if next == RequestStatus::Reported && self.outcome.is_none() {
            return Err(FieldErrors::single(
                "outcome",
                ValidationError::Invalid("is required before the request is reported".into()),
            )
            .into());
        }
        match next {
            RequestStatus::Scheduled => self.scheduled_at = Some(now),
            RequestStatus::Performed => self.performed_at = Some(now),
            RequestStatus::Reported => self.reported_at = Some(now),
            RequestStatus::Closed => self.closed_at = Some(now),
            RequestStatus::Requested | RequestStatus::Cancelled => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(true)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSpecialistInvestigationRequest {
    pub emergency_id: Option<RecordId>,
    pub specialist_investigation_id: Option<RecordId>,
    pub needs_follow_up: Option<bool>,
    pub notes: Option<String>,
}

impl NewSpecialistInvestigationRequest {
    pub fn validate(
        self,
        acting_user: RecordId,
        now: DateTime<Utc>,
    ) -> Result<SpecialistInvestigationRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        let emergency_id = validation::required_id(&mut errors, "emergency_id", self.emergency_id);
        let item_id = validation::required_id(
            &mut errors,
            "specialist_investigation_id",
            self.specialist_investigation_id,
        );
        let notes = validation::optional_text(&mut errors, "notes", self.notes.as_deref(), OUTCOME_MAX);
        errors.into_result()?;

        Ok(SpecialistInvestigationRequest {
            id: 0,
            emergency_id: emergency_id.unwrap_or_default(),
            specialist_investigation_id: item_id.unwrap_or_default(),
            requested_by: acting_user,
            status: RequestStatus::Requested,
            requested_at: now,
            scheduled_at: None,
            performed_at: None,
            reported_at: None,
            closed_at: None,
            outcome: None,
            disposition: None,
            needs_follow_up: self.needs_follow_up.unwrap_or(false),
            notes,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecialistInvestigationRequestPatch {
    pub status: Option<RequestStatus>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub outcome: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub disposition: Option<Option<String>>,
    pub needs_follow_up: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub notes: Option<Option<String>>,
}

impl SpecialistInvestigationRequestPatch {
    pub fn apply(self, request: &mut SpecialistInvestigationRequest, now: DateTime<Utc>) -> Result<(), ModelError> {
        let mut errors = FieldErrors::new();
        let outcome = self
            .outcome
            .as_ref()
            .map(|o| validation::optional_text(&mut errors, "outcome", o.as_deref(), OUTCOME_MAX));
        let disposition = self
            .disposition
            .as_ref()
            .map(|d| validation::optional_text(&mut errors, "disposition", d.as_deref(), 255));
        let notes = self
            .notes
            .as_ref()
            .map(|n| validation::optional_text(&mut errors, "notes", n.as_deref(), OUTCOME_MAX));
        errors.into_result()?;

        let mut next = request.clone();
        if let Some(outcome) = outcome {
            next.outcome = outcome;
        }
        if let Some(disposition) = disposition {
            next.disposition = disposition;
        }
        if let Some(notes) = notes {
            next.notes = notes;
        }
        if let Some(needs_follow_up) = self.needs_follow_up {
            next.needs_follow_up = needs_follow_up;
        }
        if let Some(status) = self.status {
            next.change_status(status, now)?;
        }
        if matches!(next.status, RequestStatus::Reported | RequestStatus::Closed) && next.outcome.is_none() {
            return Err(FieldErrors::single(
                "outcome",
                ValidationError::Invalid("cannot be removed from a reported request".into()),
            )
            .into());
        }
        next.updated_at = now;
        *request = next;
        Ok(())
    }
}
