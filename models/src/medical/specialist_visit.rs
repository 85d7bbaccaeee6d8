// models/src/medical/specialist_visit.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, ModelError, ValidationError};
use crate::identifiers::RecordId;
use crate::validation;
use crate::workflow::Workflow;

pub const REPORT_MAX: usize = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    #[default]
    Scheduled,
    InProgress,
    Reported,
    Closed,
    Cancelled,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Scheduled => "scheduled",
            VisitStatus::InProgress => "in_progress",
            VisitStatus::Reported => "reported",
            VisitStatus::Closed => "closed",
            VisitStatus::Cancelled => "cancelled",
        }
    }

    fn rank(self) -> u8 {
        match self {
            VisitStatus::Scheduled => 0,
            VisitStatus::InProgress => 1,
            VisitStatus::Reported => 2,
            VisitStatus::Closed => 3,
            VisitStatus::Cancelled => 4,
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Workflow for VisitStatus {
    const ENTITY: &'static str = "specialist visit";

    fn allows(self, to: Self) -> bool {
        match to {
            VisitStatus::Cancelled => {
                matches!(self, VisitStatus::Scheduled | VisitStatus::InProgress)
            }
            _ => self != VisitStatus::Cancelled && to.rank() == self.rank() + 1,
        }
    }
}

/// A referral from the ED to a department specialist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistVisit {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub department_id: RecordId,
    /// Requesting user.
    pub user_id: RecordId,
    pub emergency_id: RecordId,
    pub status: VisitStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub reported_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub report: Option<String>,
    pub needs_follow_up: bool,
    pub disposition: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SpecialistVisit {
    pub fn change_status(&mut self, to: VisitStatus, now: DateTime<Utc>) -> Result<bool, ModelError> {
        let next = self.status.transition(to)?;
        if next == self.status {
            return Ok(false);
        }
        if next == VisitStatus::Reported && self.report.is_none() {
            return Err(FieldErrors::single(
                "report",
                ValidationError::Invalid("is required before the visit is reported".into()),
            )
            .into());
        }
        match next {
            VisitStatus::InProgress => self.started_at = Some(now),
            VisitStatus::Reported => self.reported_at = Some(now),
            VisitStatus::Closed => self.closed_at = Some(now),
            VisitStatus::Scheduled | VisitStatus::Cancelled => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(true)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSpecialistVisit {
    pub patient_id: Option<RecordId>,
    pub department_id: Option<RecordId>,
    pub emergency_id: Option<RecordId>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub needs_follow_up: Option<bool>,
    pub disposition: Option<String>,
}

impl NewSpecialistVisit {
    pub fn validate(self, acting_user: RecordId, now: DateTime<Utc>) -> Result<SpecialistVisit, FieldErrors> {
        let mut errors = FieldErrors::new();
        let patient_id = validation::required_id(&mut errors, "patient_id", self.patient_id);
        let department_id = validation::required_id(&mut errors, "department_id", self.department_id);
        let emergency_id = validation::required_id(&mut errors, "emergency_id", self.emergency_id);
        let disposition = validation::optional_text(&mut errors, "disposition", self.disposition.as_deref(), 255);
        errors.into_result()?;

        Ok(SpecialistVisit {
            id: 0,
            patient_id: patient_id.unwrap_or_default(),
            department_id: department_id.unwrap_or_default(),
            user_id: acting_user,
            emergency_id: emergency_id.unwrap_or_default(),
            status: VisitStatus::Scheduled,
            scheduled_at: Some(self.scheduled_at.unwrap_or(now)),
            started_at: None,
            reported_at: None,
            closed_at: None,
            report: None,
            needs_follow_up: self.needs_follow_up.unwrap_or(false),
            disposition,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecialistVisitPatch {
    pub status: Option<VisitStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub report: Option<Option<String>>,
    pub needs_follow_up: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub disposition: Option<Option<String>>,
}

impl SpecialistVisitPatch {
    /// Text fields land before the status change so a single request can
    /// attach the report and move the visit to `reported`.
    pub fn apply(self, visit: &mut SpecialistVisit, now: DateTime<Utc>) -> Result<(), ModelError> {
        let mut errors = FieldErrors::new();
        let report = self
            .report
            .as_ref()
            .map(|r| validation::optional_text(&mut errors, "report", r.as_deref(), REPORT_MAX));
        let disposition = self
            .disposition
            .as_ref()
            .map(|d| validation::optional_text(&mut errors, "disposition", d.as_deref(), 255));
        errors.into_result()?;

        let mut next = visit.clone();
        if let Some(report) = report {
            next.report = report;
        }
        if let Some(disposition) = disposition {
            next.disposition = disposition;
        }
        if let Some(scheduled_at) = self.scheduled_at {
            next.scheduled_at = Some(scheduled_at);
        }
        if let Some(needs_follow_up) = self.needs_follow_up {
            next.needs_follow_up = needs_follow_up;
        }
        if let Some(status) = self.status {
            next.change_status(status, now)?;
        }
        if matches!(next.status, VisitStatus::Reported | VisitStatus::Closed) && next.report.is_none() {
            return Err(FieldErrors::single(
                "report",
                ValidationError::Invalid("cannot be removed from a reported visit".into()),
            )
            .into());
        }
        next.updated_at = now;
        *visit = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit() -> SpecialistVisit {
        NewSpecialistVisit {
            patient_id: Some(1),
            department_id: Some(2),
            emergency_id: Some(3),
            ..Default::default()
        }
        .validate(4, Utc::now())
        .unwrap()
    }

    #[test]
    fn should_walk_forward_and_stamp() {
        let now = Utc::now();
        let mut visit = visit();
        visit.change_status(VisitStatus::InProgress, now).unwrap();
        assert_eq!(visit.started_at, Some(now));
        visit.report = Some("No acute findings".into());
        visit.change_status(VisitStatus::Reported, now).unwrap();
        visit.change_status(VisitStatus::Closed, now).unwrap();
        assert_eq!(visit.closed_at, Some(now));
    }

    #[test]
    fn should_reject_skipping_and_going_back() {
        let now = Utc::now();
        let mut visit = visit();
        assert!(matches!(
            visit.change_status(VisitStatus::Closed, now),
            Err(ModelError::Transition(_))
        ));
        visit.change_status(VisitStatus::InProgress, now).unwrap();
        assert!(visit.change_status(VisitStatus::Scheduled, now).is_err());
    }

    #[test]
    fn should_require_report_before_reported() {
        let now = Utc::now();
        let mut visit = visit();
        visit.change_status(VisitStatus::InProgress, now).unwrap();
        assert!(matches!(
            visit.change_status(VisitStatus::Reported, now),
            Err(ModelError::Validation(_))
        ));
    }

    #[test]
    fn patch_can_report_in_one_request() {
        let now = Utc::now();
        let mut visit = visit();
        visit.change_status(VisitStatus::InProgress, now).unwrap();
        let patch: SpecialistVisitPatch =
            serde_json::from_str(r#"{"report": "Fracture confirmed", "status": "reported"}"#).unwrap();
        patch.apply(&mut visit, now).unwrap();
        assert_eq!(visit.status, VisitStatus::Reported);
        assert_eq!(visit.reported_at, Some(now));
    }

    #[test]
    fn cancelled_only_before_report() {
        assert!(VisitStatus::Scheduled.allows(VisitStatus::Cancelled));
        assert!(VisitStatus::InProgress.allows(VisitStatus::Cancelled));
        assert!(!VisitStatus::Reported.allows(VisitStatus::Cancelled));
        assert!(!VisitStatus::Cancelled.allows(VisitStatus::Scheduled));
    }

    #[test]
    fn failed_patch_leaves_visit_untouched() {
        let now = Utc::now();
        let mut visit = visit();
        let before = visit.clone();
        let patch: SpecialistVisitPatch =
            serde_json::from_str(r#"{"disposition": "ward", "status": "closed"}"#).unwrap();
        assert!(patch.apply(&mut visit, now).is_err());
        assert_eq!(visit, before);
    }

    #[test]
    fn reported_visit_keeps_its_report() {
        let now = Utc::now();
        let mut visit = visit();
        visit.change_status(VisitStatus::InProgress, now).unwrap();
        let patch: SpecialistVisitPatch =
            serde_json::from_str(r#"{"report": "Fracture confirmed", "status": "reported"}"#).unwrap();
        patch.apply(&mut visit, now).unwrap();

        let clear: SpecialistVisitPatch = serde_json::from_str(r#"{"report": null}"#).unwrap();
        match clear.apply(&mut visit, now) {
            Err(ModelError::Validation(errors)) => assert!(errors.has("report")),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(visit.report.as_deref(), Some("Fracture confirmed"));

        let blank: SpecialistVisitPatch = serde_json::from_str(r#"{"report": "  "}"#).unwrap();
        assert!(blank.apply(&mut visit, now).is_err());
        assert_eq!(visit.status, VisitStatus::Reported);
    }
}
