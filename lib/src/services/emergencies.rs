// lib/src/services/emergencies.rs
//
// Emergency lifecycle. Every write that calls or reminds a specialist goes
// through `commit`, which stores the emergency and its notification in one
// sled transaction.

use chrono::{DateTime, Utc};
use log::{debug, info};
use sled::transaction::{ConflictableTransactionError, TransactionResult};
use sled::Transactional;

use models::errors::{FieldErrors, ValidationError};
use models::medical::{EmergencyPatch, NewEmergency};
use models::{
    AlertCode, Emergency, EmergencyStatus, InvestigationPerformed, Notification, NotificationKind,
    Patient, Permission, RecordId, SpecialistInvestigationRequest, SpecialistVisit, User,
};

use crate::errors::{Result, TriageError};
use crate::services::integrity;
use crate::services::visibility::{fetch_visible, Visibility};
use crate::services::Actor;
use crate::storage_engine::{deserialize_record, id_key, serialize_record, TriageStore};

/// `GET /api/emergencies` query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmergencyFilter {
    pub limit: Option<usize>,
    pub status: Option<EmergencyStatus>,
    pub alert_code: Option<AlertCode>,
}

/// A specialist message to write together with the emergency.
type Call = Option<(NotificationKind, RecordId)>;

/// Reads (or starts) an emergency, lets `mutate` change it, then writes it
/// and the optional notification atomically. An unchanged record with no
/// notification is not written. `mutate` may run more than once if the
/// transaction is retried.
fn commit<F>(
    store: &TriageStore,
    id: Option<RecordId>,
    patient: Option<&Patient>,
    mutate: F,
) -> Result<(Emergency, Option<Notification>)>
where
    F: Fn(Option<Emergency>, DateTime<Utc>) -> Result<(Emergency, Call)>,
{
    let emergencies = store.tree::<Emergency>()?;
    let notifications = store.tree::<Notification>()?;

    let outcome: TransactionResult<(Emergency, Option<Notification>), TriageError> =
        (&emergencies, &notifications).transaction(|(etx, ntx)| {
            let now = Utc::now();
            let current = match id {
                Some(id) => match etx.get(&id_key(id)[..])? {
                    Some(bytes) => Some(
                        deserialize_record::<Emergency>(&bytes).map_err(ConflictableTransactionError::Abort)?,
                    ),
                    None => {
                        return Err(ConflictableTransactionError::Abort(TriageError::not_found(
                            "emergency",
                            id,
                        )))
                    }
                },
                None => None,
            };

            let (mut emergency, call) =
                mutate(current.clone(), now).map_err(ConflictableTransactionError::Abort)?;
            if call.is_none() && current.as_ref() == Some(&emergency) {
                return Ok((emergency, None));
            }
            if emergency.id == 0 {
                emergency.id = etx.generate_id()? + 1;
            }

            let notification = match call {
                Some((kind, specialist_id)) => {
                    let mut note = Notification::for_specialist(kind, specialist_id, &emergency, patient, now);
                    note.id = ntx.generate_id()? + 1;
                    let bytes = serialize_record(&note).map_err(ConflictableTransactionError::Abort)?;
                    ntx.insert(&id_key(note.id)[..], bytes)?;
                    Some(note)
                }
                None => None,
            };

            let bytes = serialize_record(&emergency).map_err(ConflictableTransactionError::Abort)?;
            etx.insert(&id_key(emergency.id)[..], bytes)?;
            Ok((emergency, notification))
        });

    let (emergency, notification) = outcome?;
    if let Some(note) = &notification {
        info!(
            "Notified specialist {} about emergency {} ({:?})",
            note.user_id, emergency.id, note.kind
        );
    }
    Ok((emergency, notification))
}

fn closed_conflict(id: RecordId) -> TriageError {
    TriageError::Conflict(format!("Emergency {} is closed.", id))
}

fn require_open(emergency: &Emergency) -> Result<()> {
    if emergency.is_closed() {
        Err(closed_conflict(emergency.id))
    } else {
        Ok(())
    }
}

pub fn get_emergency(store: &TriageStore, actor: Actor, id: RecordId) -> Result<Emergency> {
    let view = Visibility::new(store, actor)?;
    fetch_visible::<Emergency, _>(store, id, |e| Ok(view.emergency(e)))
}

/// Visible emergencies matching `filter`, newest first.
pub fn list_emergencies(store: &TriageStore, actor: Actor, filter: EmergencyFilter) -> Result<Vec<Emergency>> {
    let view = Visibility::new(store, actor)?;
    let mut emergencies = store.list_where::<Emergency, _>(|e| {
        view.emergency(e)
            && filter.status.map_or(true, |s| e.status == s)
            && filter.alert_code.map_or(true, |c| e.alert_code == Some(c))
    })?;
    emergencies.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    if let Some(limit) = filter.limit {
        emergencies.truncate(limit);
    }
    Ok(emergencies)
}

pub fn create_emergency(store: &TriageStore, actor: Actor, new_emergency: NewEmergency) -> Result<Emergency> {
    let patient_id = new_emergency.patient_id;
    let user_id = new_emergency.user_id;
    let specialist_id = new_emergency.specialist_id;
    let (validated, mut errors) = match new_emergency.validate(actor.id, Utc::now()) {
        Ok(validated) => (Some(validated), FieldErrors::new()),
        Err(errors) => (None, errors),
    };
    let patient = integrity::require::<Patient>(store, &mut errors, "patient_id", patient_id)?;
    match user_id {
        Some(user_id) if user_id != actor.id && actor.permission != Permission::Admin => errors.add(
            "user_id",
            ValidationError::Invalid("only an administrator may open an emergency for another user".into()),
        ),
        _ => {
            integrity::require::<User>(store, &mut errors, "user_id", user_id)?;
        }
    }
    integrity::require_specialist(store, &mut errors, "specialist_id", specialist_id)?;
    errors.into_result()?;
    let Some((draft, specialist_id)) = validated else {
        return Err(FieldErrors::new().into());
    };

    let (emergency, _) = commit(store, None, patient.as_ref(), |_, now| {
        let mut emergency = draft.clone();
        let call = specialist_id.map(|specialist_id| {
            emergency.assign_specialist(specialist_id, now);
            (NotificationKind::SpecialistCalled, specialist_id)
        });
        Ok((emergency, call))
    })?;
    info!(
        "Opened emergency {} for patient {} by user {}",
        emergency.id, emergency.patient_id, emergency.user_id
    );
    Ok(emergency)
}

pub fn update_emergency(
    store: &TriageStore,
    actor: Actor,
    id: RecordId,
    patch: EmergencyPatch,
) -> Result<Emergency> {
    let existing = get_emergency(store, actor, id)?;
    let valid = patch.validate()?;

    let mut errors = FieldErrors::new();
    let patient_id = valid.patient_id.unwrap_or(existing.patient_id);
    let patient = integrity::require::<Patient>(store, &mut errors, "patient_id", Some(patient_id))?;
    if patient_id != existing.patient_id
        && store.any::<SpecialistVisit, _>(|v| v.emergency_id == id && v.patient_id != patient_id)?
    {
        errors.add(
            "patient_id",
            ValidationError::Invalid("the emergency has specialist visits for another patient".into()),
        );
    }
    if let Some(Some(specialist_id)) = valid.specialist_id {
        integrity::require_specialist(store, &mut errors, "specialist_id", Some(specialist_id))?;
    }
    errors.into_result()?;

    let (emergency, _) = commit(store, Some(id), patient.as_ref(), |current, now| {
        let mut emergency = current.ok_or_else(|| TriageError::not_found("emergency", id))?;
        emergency.apply_patch(&valid, now)?;
        let call = match valid.specialist_id {
            Some(Some(specialist_id)) => {
                require_open(&emergency)?;
                emergency.assign_specialist(specialist_id, now);
                Some((NotificationKind::SpecialistCalled, specialist_id))
            }
            Some(None) => {
                emergency.clear_specialist(now);
                None
            }
            None => None,
        };
        Ok((emergency, call))
    })?;
    debug!("Updated emergency {}", emergency.id);
    Ok(emergency)
}

pub fn call_specialist(
    store: &TriageStore,
    actor: Actor,
    id: RecordId,
    specialist_id: Option<RecordId>,
) -> Result<(Emergency, Notification)> {
    let existing = get_emergency(store, actor, id)?;
    require_open(&existing)?;
    let mut errors = FieldErrors::new();
    if specialist_id.is_none() {
        errors.add("specialist_id", ValidationError::Required);
    }
    integrity::require_specialist(store, &mut errors, "specialist_id", specialist_id)?;
    errors.into_result()?;
    let Some(specialist_id) = specialist_id else {
        return Err(FieldErrors::new().into());
    };
    let patient = store.get::<Patient>(existing.patient_id)?;

    let (emergency, notification) = commit(store, Some(id), patient.as_ref(), |current, now| {
        let mut emergency = current.ok_or_else(|| TriageError::not_found("emergency", id))?;
        require_open(&emergency)?;
        emergency.assign_specialist(specialist_id, now);
        Ok((emergency, Some((NotificationKind::SpecialistCalled, specialist_id))))
    })?;
    let notification = notification.ok_or_else(|| TriageError::DatabaseError("notification was not written".into()))?;
    Ok((emergency, notification))
}

pub fn remind_specialist(store: &TriageStore, actor: Actor, id: RecordId) -> Result<Notification> {
    let existing = get_emergency(store, actor, id)?;
    let patient = store.get::<Patient>(existing.patient_id)?;

    let (_, notification) = commit(store, Some(id), patient.as_ref(), |current, _| {
        let emergency = current.ok_or_else(|| TriageError::not_found("emergency", id))?;
        require_open(&emergency)?;
        let specialist_id = emergency.specialist_id.ok_or_else(|| {
            TriageError::Conflict(format!("Emergency {} has no specialist assigned.", id))
        })?;
        Ok((emergency, Some((NotificationKind::SpecialistReminder, specialist_id))))
    })?;
    notification.ok_or_else(|| TriageError::DatabaseError("notification was not written".into()))
}

/// Marks the patient as arrived at the PS. Repeating it changes nothing.
pub fn mark_arrived(store: &TriageStore, actor: Actor, id: RecordId) -> Result<Emergency> {
    get_emergency(store, actor, id)?;
    let (emergency, _) = commit(store, Some(id), None, |current, now| {
        let mut emergency = current.ok_or_else(|| TriageError::not_found("emergency", id))?;
        emergency.set_arrived(true, now);
        Ok((emergency, None))
    })?;
    Ok(emergency)
}

pub fn close_emergency(store: &TriageStore, actor: Actor, id: RecordId) -> Result<Emergency> {
    get_emergency(store, actor, id)?;
    let (emergency, _) = commit(store, Some(id), None, |current, now| {
        let mut emergency = current.ok_or_else(|| TriageError::not_found("emergency", id))?;
        emergency.change_status(EmergencyStatus::Closed, now)?;
        Ok((emergency, None))
    })?;
    info!("Closed emergency {}", id);
    Ok(emergency)
}

/// Deletes an unreferenced emergency. Its notifications go with it.
pub fn delete_emergency(store: &TriageStore, actor: Actor, id: RecordId) -> Result<()> {
    get_emergency(store, actor, id)?;
    integrity::restrict_delete(
        "emergency",
        id,
        &[
            (
                "investigations performed",
                store.any::<InvestigationPerformed, _>(|p| p.emergency_id == id)?,
            ),
            ("specialist visits", store.any::<SpecialistVisit, _>(|v| v.emergency_id == id)?),
            (
                "specialist investigation requests",
                store.any::<SpecialistInvestigationRequest, _>(|r| r.emergency_id == id)?,
            ),
        ],
    )?;
    for note in store.list_where::<Notification, _>(|n| n.emergency_id == id)? {
        store.remove::<Notification>(note.id)?;
    }
    store.remove::<Emergency>(id)?;
    info!("Deleted emergency {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures;
    use models::Permission;
    use serde_json::json;

    struct Ward {
        store: TriageStore,
        ps: Actor,
        specialist: User,
        patient: Patient,
    }

    fn ward() -> Ward {
        let store = TriageStore::temporary().unwrap();
        let dept = fixtures::department(&store, "Cardiology");
        let ps = fixtures::user(&store, "ps1@h.example", Permission::PsOperator, None);
        let specialist = fixtures::user(&store, "doc1@h.example", Permission::Specialist, Some(dept.id));
        let patient = fixtures::patient(&store, "Mario");
        Ward { ps: fixtures::actor(&ps), store, specialist, patient }
    }

    fn intake(patient_id: RecordId) -> NewEmergency {
        NewEmergency {
            description: Some("Syncope at home".into()),
            alert_code: Some(AlertCode::Giallo),
            patient_id: Some(patient_id),
            ..Default::default()
        }
    }

    fn notifications_for(store: &TriageStore, user_id: RecordId) -> Vec<Notification> {
        store.list_where::<Notification, _>(|n| n.user_id == user_id).unwrap()
    }

    #[test]
    fn should_reject_missing_patient() {
        let w = ward();
        match create_emergency(&w.store, w.ps, intake(9999)) {
            Err(TriageError::Validation(errors)) => assert!(errors.has("patient_id")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn should_reject_unknown_creator() {
        let w = ward();
        let admin = fixtures::user(&w.store, "admin@h.example", Permission::Admin, None);
        let mut new = intake(w.patient.id);
        new.user_id = Some(4040);
        match create_emergency(&w.store, fixtures::actor(&admin), new) {
            Err(TriageError::Validation(errors)) => assert!(errors.has("user_id")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn only_admin_may_file_for_another_user() {
        let w = ward();
        let amb = fixtures::user(&w.store, "amb1@h.example", Permission::Operator118, None);
        let amb = fixtures::actor(&amb);
        let mut new = intake(w.patient.id);
        new.user_id = Some(w.ps.id);
        match create_emergency(&w.store, amb, new) {
            Err(TriageError::Validation(errors)) => assert!(errors.has("user_id")),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(w.store.list::<Emergency>().unwrap().is_empty());

        let mut own = intake(w.patient.id);
        own.user_id = Some(amb.id);
        let emergency = create_emergency(&w.store, amb, own).unwrap();
        assert_eq!(emergency.user_id, amb.id);
        assert!(get_emergency(&w.store, amb, emergency.id).is_ok());

        let admin = fixtures::user(&w.store, "admin@h.example", Permission::Admin, None);
        let mut on_behalf = intake(w.patient.id);
        on_behalf.user_id = Some(amb.id);
        let filed = create_emergency(&w.store, fixtures::actor(&admin), on_behalf).unwrap();
        assert_eq!(filed.user_id, amb.id);
    }

    #[test]
    fn repeated_patch_does_not_rewrite_the_record() {
        let w = ward();
        let emergency = create_emergency(&w.store, w.ps, intake(w.patient.id)).unwrap();
        let patch = || serde_json::from_value::<EmergencyPatch>(json!({"arrived_ps": true})).unwrap();
        let first = update_emergency(&w.store, w.ps, emergency.id, patch()).unwrap();
        let second = update_emergency(&w.store, w.ps, emergency.id, patch()).unwrap();
        assert!(first.arrived_ps);
        assert_eq!(first, second);
        assert_eq!(w.store.fetch::<Emergency>(emergency.id).unwrap(), first);
    }

    #[test]
    fn patient_cannot_change_under_specialist_visits() {
        let w = ward();
        let emergency = create_emergency(&w.store, w.ps, intake(w.patient.id)).unwrap();
        let other = fixtures::patient(&w.store, "Luigi");
        let now = Utc::now();
        w.store
            .insert(SpecialistVisit {
                id: 0,
                patient_id: w.patient.id,
                department_id: w.specialist.department_id.unwrap(),
                user_id: w.ps.id,
                emergency_id: emergency.id,
                status: models::VisitStatus::Scheduled,
                scheduled_at: None,
                started_at: None,
                reported_at: None,
                closed_at: None,
                report: None,
                needs_follow_up: false,
                disposition: None,
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        let patch: EmergencyPatch = serde_json::from_value(json!({"patient_id": other.id})).unwrap();
        match update_emergency(&w.store, w.ps, emergency.id, patch) {
            Err(TriageError::Validation(errors)) => assert!(errors.has("patient_id")),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(w.store.fetch::<Emergency>(emergency.id).unwrap().patient_id, w.patient.id);

        let same: EmergencyPatch = serde_json::from_value(json!({"patient_id": w.patient.id})).unwrap();
        assert!(update_emergency(&w.store, w.ps, emergency.id, same).is_ok());
    }

    #[test]
    fn intake_with_specialist_writes_one_notification() {
        let w = ward();
        let mut new = intake(w.patient.id);
        new.specialist_id = Some(w.specialist.id);
        let emergency = create_emergency(&w.store, w.ps, new).unwrap();
        assert!(emergency.specialist_called_at.is_some());
        let notes = notifications_for(&w.store, w.specialist.id);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].emergency_id, emergency.id);
        assert_eq!(notes[0].data["patient"], "Mario Rossi");
    }

    #[test]
    fn each_call_adds_exactly_one_notification() {
        let w = ward();
        let emergency = create_emergency(&w.store, w.ps, intake(w.patient.id)).unwrap();
        let (first, _) = call_specialist(&w.store, w.ps, emergency.id, Some(w.specialist.id)).unwrap();
        let (second, _) = call_specialist(&w.store, w.ps, emergency.id, Some(w.specialist.id)).unwrap();
        assert_eq!(notifications_for(&w.store, w.specialist.id).len(), 2);
        assert!(second.specialist_called_at >= first.specialist_called_at);
        assert!(second.invariants_hold());
    }

    #[test]
    fn calling_a_non_specialist_is_a_field_error() {
        let w = ward();
        let emergency = create_emergency(&w.store, w.ps, intake(w.patient.id)).unwrap();
        let result = call_specialist(&w.store, w.ps, emergency.id, Some(w.ps.id));
        assert!(matches!(result, Err(TriageError::Validation(e)) if e.has("specialist_id")));
        assert!(w.store.list::<Notification>().unwrap().is_empty());
    }

    #[test]
    fn reminder_requires_assigned_specialist() {
        let w = ward();
        let emergency = create_emergency(&w.store, w.ps, intake(w.patient.id)).unwrap();
        assert!(matches!(
            remind_specialist(&w.store, w.ps, emergency.id),
            Err(TriageError::Conflict(_))
        ));
        call_specialist(&w.store, w.ps, emergency.id, Some(w.specialist.id)).unwrap();
        let note = remind_specialist(&w.store, w.ps, emergency.id).unwrap();
        assert_eq!(note.kind, NotificationKind::SpecialistReminder);
        assert_eq!(notifications_for(&w.store, w.specialist.id).len(), 2);
    }

    #[test]
    fn arrival_is_idempotent() {
        let w = ward();
        let emergency = create_emergency(&w.store, w.ps, intake(w.patient.id)).unwrap();
        let first = mark_arrived(&w.store, w.ps, emergency.id).unwrap();
        let second = mark_arrived(&w.store, w.ps, emergency.id).unwrap();
        assert!(first.arrived_ps);
        assert_eq!(first.arrived_ps_at, second.arrived_ps_at);
    }

    #[test]
    fn closed_emergency_rejects_changes() {
        let w = ward();
        let emergency = create_emergency(&w.store, w.ps, intake(w.patient.id)).unwrap();
        let closed = close_emergency(&w.store, w.ps, emergency.id).unwrap();
        assert!(closed.closed_at.is_some());

        let patch: EmergencyPatch = serde_json::from_value(json!({"status": "waiting"})).unwrap();
        assert!(matches!(
            update_emergency(&w.store, w.ps, emergency.id, patch),
            Err(TriageError::InvalidTransition(_))
        ));
        assert!(matches!(
            call_specialist(&w.store, w.ps, emergency.id, Some(w.specialist.id)),
            Err(TriageError::Conflict(_))
        ));
        assert_eq!(w.store.fetch::<Emergency>(emergency.id).unwrap().status, EmergencyStatus::Closed);
    }

    #[test]
    fn patch_can_call_and_clear_specialist() {
        let w = ward();
        let emergency = create_emergency(&w.store, w.ps, intake(w.patient.id)).unwrap();
        let patch: EmergencyPatch =
            serde_json::from_value(json!({"specialist_id": w.specialist.id, "alert_code": "rosso"})).unwrap();
        let called = update_emergency(&w.store, w.ps, emergency.id, patch).unwrap();
        assert_eq!(called.specialist_id, Some(w.specialist.id));
        assert_eq!(called.alert_code, Some(AlertCode::Rosso));
        assert_eq!(notifications_for(&w.store, w.specialist.id).len(), 1);

        let patch: EmergencyPatch = serde_json::from_value(json!({"specialist_id": null})).unwrap();
        let cleared = update_emergency(&w.store, w.ps, emergency.id, patch).unwrap();
        assert_eq!(cleared.specialist_id, None);
        assert_eq!(cleared.specialist_called_at, None);
    }

    #[test]
    fn list_is_newest_first_and_filtered() {
        let w = ward();
        let first = create_emergency(&w.store, w.ps, intake(w.patient.id)).unwrap();
        let mut red = intake(w.patient.id);
        red.alert_code = Some(AlertCode::Rosso);
        let second = create_emergency(&w.store, w.ps, red).unwrap();

        let all = list_emergencies(&w.store, w.ps, EmergencyFilter::default()).unwrap();
        assert_eq!(all.iter().map(|e| e.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        let filter = EmergencyFilter { alert_code: Some(AlertCode::Rosso), ..Default::default() };
        assert_eq!(list_emergencies(&w.store, w.ps, filter).unwrap().len(), 1);

        let filter = EmergencyFilter { limit: Some(1), ..Default::default() };
        assert_eq!(list_emergencies(&w.store, w.ps, filter).unwrap()[0].id, second.id);
    }

    #[test]
    fn delete_removes_notifications_but_respects_references() {
        let w = ward();
        let mut new = intake(w.patient.id);
        new.specialist_id = Some(w.specialist.id);
        let emergency = create_emergency(&w.store, w.ps, new).unwrap();
        delete_emergency(&w.store, w.ps, emergency.id).unwrap();
        assert!(w.store.list::<Notification>().unwrap().is_empty());
        assert!(matches!(
            get_emergency(&w.store, w.ps, emergency.id),
            Err(TriageError::NotFound { .. })
        ));
    }

    #[test]
    fn operator_118_cannot_touch_others_emergencies() {
        let w = ward();
        let amb = fixtures::user(&w.store, "amb1@h.example", Permission::Operator118, None);
        let emergency = create_emergency(&w.store, w.ps, intake(w.patient.id)).unwrap();
        let amb = fixtures::actor(&amb);
        assert!(matches!(get_emergency(&w.store, amb, emergency.id), Err(TriageError::NotFound { .. })));
        assert!(matches!(mark_arrived(&w.store, amb, emergency.id), Err(TriageError::NotFound { .. })));
    }
}
