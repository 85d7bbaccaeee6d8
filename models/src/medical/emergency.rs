// models/src/medical/emergency.rs
//
// The central triage record. Timestamps paired with a flag or a foreign key
// (`arrived_ps_at`, `specialist_called_at`, `closed_at`) are only ever
// written by the methods below, so they cannot drift from their counterpart.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{FieldErrors, TransitionError, ValidationError};
use crate::identifiers::RecordId;
use crate::validation;
use crate::workflow::Workflow;

pub const DESCRIPTION_MAX: usize = 2000;

/// Triage severity, white to red in ascending urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCode {
    Bianco,
    Verde,
    Giallo,
    Arancio,
    Rosso,
}

impl AlertCode {
    pub const ALL: [AlertCode; 5] = [
        AlertCode::Bianco,
        AlertCode::Verde,
        AlertCode::Giallo,
        AlertCode::Arancio,
        AlertCode::Rosso,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCode::Bianco => "bianco",
            AlertCode::Verde => "verde",
            AlertCode::Giallo => "giallo",
            AlertCode::Arancio => "arancio",
            AlertCode::Rosso => "rosso",
        }
    }

    /// 1 (non urgent) to 5 (immediate).
    pub fn urgency(&self) -> u8 {
        match self {
            AlertCode::Bianco => 1,
            AlertCode::Verde => 2,
            AlertCode::Giallo => 3,
            AlertCode::Arancio => 4,
            AlertCode::Rosso => 5,
        }
    }
}

impl fmt::Display for AlertCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| ValidationError::NotIn("bianco, verde, giallo, arancio, rosso".into()))
    }
}

/// Where the patient is in the department. `Closed` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyStatus {
    #[default]
    Triage,
    Waiting,
    InTreatment,
    Observation,
    Closed,
}

impl EmergencyStatus {
    pub const OPEN: [EmergencyStatus; 4] = [
        EmergencyStatus::Triage,
        EmergencyStatus::Waiting,
        EmergencyStatus::InTreatment,
        EmergencyStatus::Observation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencyStatus::Triage => "triage",
            EmergencyStatus::Waiting => "waiting",
            EmergencyStatus::InTreatment => "in_treatment",
            EmergencyStatus::Observation => "observation",
            EmergencyStatus::Closed => "closed",
        }
    }

    pub fn is_open(&self) -> bool {
        *self != EmergencyStatus::Closed
    }
}

impl fmt::Display for EmergencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmergencyStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmergencyStatus::OPEN
            .into_iter()
            .chain([EmergencyStatus::Closed])
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                ValidationError::NotIn("triage, waiting, in_treatment, observation, closed".into())
            })
    }
}

impl Workflow for EmergencyStatus {
    const ENTITY: &'static str = "emergency";

    fn allows(self, _to: Self) -> bool {
        self.is_open()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emergency {
    pub id: RecordId,
    pub description: String,
    pub alert_code: Option<AlertCode>,
    pub status: EmergencyStatus,
    /// Opaque vital signs object as captured at triage.
    pub vital_signs: Option<Value>,
    /// Creator.
    pub user_id: RecordId,
    pub patient_id: RecordId,
    pub specialist_id: Option<RecordId>,
    pub specialist_called_at: Option<DateTime<Utc>>,
    /// Set by 118 when the PS must expect the patient.
    pub notify_ps: bool,
    pub arrived_ps: bool,
    pub arrived_ps_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Emergency {
    pub fn is_closed(&self) -> bool {
        self.status == EmergencyStatus::Closed
    }

    /// 118 handoff still pending: PS notified, patient not yet arrived.
    pub fn is_incoming(&self) -> bool {
        self.notify_ps && !self.arrived_ps && !self.is_closed()
    }

    /// Marks arrival at the PS. Returns whether anything changed; repeating
    /// the same value is a no-op.
    pub fn set_arrived(&mut self, arrived: bool, now: DateTime<Utc>) -> bool {
        if self.arrived_ps == arrived {
            return false;
        }
        self.arrived_ps = arrived;
        self.arrived_ps_at = arrived.then_some(now);
        self.updated_at = now;
        true
    }

    /// Records a specialist call. `specialist_called_at` never moves
    /// backwards, even across clock skew between calls.
    pub fn assign_specialist(&mut self, specialist_id: RecordId, now: DateTime<Utc>) {
        self.specialist_id = Some(specialist_id);
        self.specialist_called_at = Some(match self.specialist_called_at {
            Some(previous) if previous > now => previous,
            _ => now,
        });
        self.updated_at = now;
    }

    pub fn clear_specialist(&mut self, now: DateTime<Utc>) {
        if self.specialist_id.take().is_some() {
            self.specialist_called_at = None;
            self.updated_at = now;
        }
    }

    /// Moves the record through its workflow. Entering `closed` stamps
    /// `closed_at`; re-applying the current status changes nothing.
    pub fn change_status(
        &mut self,
        to: EmergencyStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, TransitionError> {
        let next = self.status.transition(to)?;
        if next == self.status {
            return Ok(false);
        }
        self.status = next;
        if next == EmergencyStatus::Closed {
            self.closed_at = Some(now);
        }
        self.updated_at = now;
        Ok(true)
    }

    /// Applies the plain-field part of a patch and returns whether the
    /// record changed. `updated_at` only moves when it did. The specialist
    /// assignment is left to the caller, which must also write the
    /// notification.
    pub fn apply_patch(
        &mut self,
        patch: &ValidEmergencyPatch,
        now: DateTime<Utc>,
    ) -> Result<bool, TransitionError> {
        let mut changed = false;
        if let Some(status) = patch.status {
            changed |= self.change_status(status, now)?;
        }
        if let Some(description) = &patch.description {
            changed |= replace(&mut self.description, description.clone());
        }
        if let Some(alert_code) = patch.alert_code {
            changed |= replace(&mut self.alert_code, alert_code);
        }
        if let Some(vital_signs) = &patch.vital_signs {
            changed |= replace(&mut self.vital_signs, vital_signs.clone());
        }
        if let Some(patient_id) = patch.patient_id {
            changed |= replace(&mut self.patient_id, patient_id);
        }
        if let Some(notify_ps) = patch.notify_ps {
            changed |= replace(&mut self.notify_ps, notify_ps);
        }
        if let Some(arrived) = patch.arrived_ps {
            changed |= self.set_arrived(arrived, now);
        }
        if changed {
            self.updated_at = now;
        }
        Ok(changed)
    }

    /// Paired-field consistency, checked by tests and debug builds.
    pub fn invariants_hold(&self) -> bool {
        self.arrived_ps == self.arrived_ps_at.is_some()
            && self.specialist_id.is_some() == self.specialist_called_at.is_some()
            && self.is_closed() == self.closed_at.is_some()
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

/// Triage intake payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEmergency {
    pub description: Option<String>,
    pub alert_code: Option<AlertCode>,
    pub status: Option<EmergencyStatus>,
    pub vital_signs: Option<Value>,
    pub patient_id: Option<RecordId>,
    /// Defaults to the authenticated user.
    pub user_id: Option<RecordId>,
    pub specialist_id: Option<RecordId>,
    pub notify_ps: Option<bool>,
    pub arrived_ps: Option<bool>,
}

impl NewEmergency {
    /// Field validation. Returns the record (without specialist assignment)
    /// and the requested specialist, if any.
    pub fn validate(
        self,
        acting_user: RecordId,
        now: DateTime<Utc>,
    ) -> Result<(Emergency, Option<RecordId>), FieldErrors> {
        let mut errors = FieldErrors::new();
        let description =
            validation::required_text(&mut errors, "description", self.description.as_deref(), DESCRIPTION_MAX);
        let patient_id = validation::required_id(&mut errors, "patient_id", self.patient_id);
        let vital_signs = validation::json_object(&mut errors, "vital_signs", self.vital_signs);
        let status = self.status.unwrap_or_default();
        if !status.is_open() {
            errors.add(
                "status",
                ValidationError::Invalid("an emergency cannot be opened as closed".into()),
            );
        }
        errors.into_result()?;

        let mut emergency = Emergency {
            id: 0,
            description: description.unwrap_or_default(),
            alert_code: self.alert_code,
            status,
            vital_signs,
            user_id: self.user_id.unwrap_or(acting_user),
            patient_id: patient_id.unwrap_or_default(),
            specialist_id: None,
            specialist_called_at: None,
            notify_ps: self.notify_ps.unwrap_or(false),
            arrived_ps: false,
            arrived_ps_at: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
        };
        emergency.set_arrived(self.arrived_ps.unwrap_or(false), now);
        Ok((emergency, self.specialist_id))
    }
}

/// PATCH/PUT payload. Nullable fields distinguish "absent" from "null".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmergencyPatch {
    pub description: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub alert_code: Option<Option<AlertCode>>,
    pub status: Option<EmergencyStatus>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub vital_signs: Option<Option<Value>>,
    pub patient_id: Option<RecordId>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub specialist_id: Option<Option<RecordId>>,
    pub notify_ps: Option<bool>,
    pub arrived_ps: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidEmergencyPatch {
    pub description: Option<String>,
    pub alert_code: Option<Option<AlertCode>>,
    pub status: Option<EmergencyStatus>,
    pub vital_signs: Option<Option<Value>>,
    pub patient_id: Option<RecordId>,
    pub specialist_id: Option<Option<RecordId>>,
    pub notify_ps: Option<bool>,
    pub arrived_ps: Option<bool>,
}

impl EmergencyPatch {
    pub fn validate(self) -> Result<ValidEmergencyPatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        let description = self.description.as_deref().and_then(|d| {
            validation::required_text(&mut errors, "description", Some(d), DESCRIPTION_MAX)
        });
        let vital_signs = self
            .vital_signs
            .map(|v| validation::json_object(&mut errors, "vital_signs", v));
        errors.into_result()?;
        Ok(ValidEmergencyPatch {
            description,
            alert_code: self.alert_code,
            status: self.status,
            vital_signs,
            patient_id: self.patient_id,
            specialist_id: self.specialist_id,
            notify_ps: self.notify_ps,
            arrived_ps: self.arrived_ps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn intake() -> NewEmergency {
        NewEmergency {
            description: Some("Chest pain radiating to left arm".into()),
            alert_code: Some(AlertCode::Arancio),
            vital_signs: Some(json!({"heart_rate": 118, "spo2": 93})),
            patient_id: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn should_open_in_triage_owned_by_acting_user() {
        let (emergency, specialist) = intake().validate(42, Utc::now()).unwrap();
        assert_eq!(emergency.status, EmergencyStatus::Triage);
        assert_eq!(emergency.user_id, 42);
        assert_eq!(specialist, None);
        assert!(emergency.invariants_hold());
    }

    #[test]
    fn should_require_description_and_patient() {
        let errors = NewEmergency::default().validate(1, Utc::now()).unwrap_err();
        assert!(errors.has("description"));
        assert!(errors.has("patient_id"));
    }

    #[test]
    fn should_stamp_arrival_on_intake() {
        let mut new = intake();
        new.arrived_ps = Some(true);
        let (emergency, _) = new.validate(1, Utc::now()).unwrap();
        assert!(emergency.arrived_ps_at.is_some());
    }

    #[test]
    fn alert_code_accepts_only_known_values() {
        assert!(serde_json::from_value::<AlertCode>(json!("rosso")).is_ok());
        assert!(serde_json::from_value::<AlertCode>(json!("nero")).is_err());
        let patch: EmergencyPatch = serde_json::from_value(json!({"alert_code": null})).unwrap();
        assert_eq!(patch.alert_code, Some(None));
        assert!(serde_json::from_value::<EmergencyPatch>(json!({"alert_code": "blu"})).is_err());
    }

    #[test]
    fn arrival_is_idempotent() {
        let now = Utc::now();
        let (mut emergency, _) = intake().validate(1, now).unwrap();
        assert!(emergency.set_arrived(true, now));
        let stamped = emergency.arrived_ps_at;

        assert!(!emergency.set_arrived(true, now + Duration::minutes(5)));
        assert_eq!(emergency.arrived_ps_at, stamped);

        assert!(emergency.set_arrived(false, now));
        assert_eq!(emergency.arrived_ps_at, None);
        assert!(emergency.invariants_hold());
    }

    #[test]
    fn specialist_called_at_never_decreases() {
        let now = Utc::now();
        let (mut emergency, _) = intake().validate(1, now).unwrap();
        emergency.assign_specialist(9, now);
        emergency.assign_specialist(9, now - Duration::seconds(30));
        assert_eq!(emergency.specialist_called_at, Some(now));

        emergency.assign_specialist(10, now + Duration::seconds(1));
        assert_eq!(emergency.specialist_called_at, Some(now + Duration::seconds(1)));

        emergency.clear_specialist(now);
        assert_eq!(emergency.specialist_called_at, None);
        assert!(emergency.invariants_hold());
    }

    #[test]
    fn closed_is_terminal() {
        let now = Utc::now();
        let (mut emergency, _) = intake().validate(1, now).unwrap();
        assert!(emergency.change_status(EmergencyStatus::InTreatment, now).unwrap());
        assert!(emergency.change_status(EmergencyStatus::Closed, now).unwrap());
        assert_eq!(emergency.closed_at, Some(now));
        assert!(!emergency.change_status(EmergencyStatus::Closed, now).unwrap());

        let err = emergency.change_status(EmergencyStatus::Waiting, now).unwrap_err();
        assert_eq!(err.from, "closed");
        assert_eq!(err.to, "waiting");
        assert!(emergency.invariants_hold());
    }

    #[test]
    fn cannot_open_closed() {
        let mut new = intake();
        new.status = Some(EmergencyStatus::Closed);
        assert!(new.validate(1, Utc::now()).unwrap_err().has("status"));
    }

    #[test]
    fn patch_applies_fields_and_stamps() {
        let now = Utc::now();
        let (mut emergency, _) = intake().validate(1, now).unwrap();
        let patch: EmergencyPatch = serde_json::from_value(json!({
            "alert_code": "rosso",
            "arrived_ps": true,
            "status": "waiting",
            "vital_signs": null
        }))
        .unwrap();
        assert!(emergency.apply_patch(&patch.validate().unwrap(), now).unwrap());
        assert_eq!(emergency.alert_code, Some(AlertCode::Rosso));
        assert_eq!(emergency.status, EmergencyStatus::Waiting);
        assert_eq!(emergency.vital_signs, None);
        assert_eq!(emergency.arrived_ps_at, Some(now));
    }

    #[test]
    fn alert_codes_order_by_urgency() {
        let mut codes = vec![AlertCode::Rosso, AlertCode::Bianco, AlertCode::Giallo];
        codes.sort();
        assert_eq!(codes, vec![AlertCode::Bianco, AlertCode::Giallo, AlertCode::Rosso]);
        assert!(AlertCode::Arancio.urgency() > AlertCode::Verde.urgency());
    }

    #[test]
    fn repeated_patch_leaves_record_untouched() {
        let now = Utc::now();
        let (mut emergency, _) = intake().validate(1, now).unwrap();
        let patch: EmergencyPatch =
            serde_json::from_value(json!({"arrived_ps": true, "alert_code": "arancio"})).unwrap();
        let patch = patch.validate().unwrap();

        assert!(emergency.apply_patch(&patch, now).unwrap());
        let after_first = emergency.clone();

        assert!(!emergency.apply_patch(&patch, now + Duration::minutes(3)).unwrap());
        assert_eq!(emergency, after_first);
        assert_eq!(emergency.updated_at, now);
    }
}
