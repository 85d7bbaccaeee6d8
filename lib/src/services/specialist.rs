// lib/src/services/specialist.rs
//
// Specialist visits and specialist investigation requests.

use chrono::Utc;
use log::info;

use models::errors::{FieldErrors, ValidationError};
use models::medical::{
    NewSpecialistInvestigationRequest, NewSpecialistVisit, SpecialistInvestigationRequestPatch,
    SpecialistVisitPatch,
};
use models::{
    Attachment, Department, Emergency, Patient, RecordId, SpecialistInvestigation,
    SpecialistInvestigationRequest, SpecialistVisit,
};

use crate::errors::Result;
use crate::services::catalog::split;
use crate::services::integrity;
use crate::services::visibility::{fetch_visible, Visibility};
use crate::services::Actor;
use crate::storage_engine::TriageStore;

/// Loads the emergency a new row hangs off, hiding it like a missing one.
fn visible_emergency(
    store: &TriageStore,
    view: &Visibility<'_>,
    errors: &mut FieldErrors,
    emergency_id: Option<RecordId>,
) -> Result<Option<Emergency>> {
    match integrity::require::<Emergency>(store, errors, "emergency_id", emergency_id)? {
        Some(emergency) if view.emergency(&emergency) => Ok(Some(emergency)),
        Some(_) => {
            errors.add("emergency_id", ValidationError::Missing);
            Ok(None)
        }
        None => Ok(None),
    }
}

pub fn list_visits(store: &TriageStore, actor: Actor) -> Result<Vec<SpecialistVisit>> {
    let view = Visibility::new(store, actor)?;
    let mut visible = Vec::new();
    for visit in store.list::<SpecialistVisit>()? {
        if view.visit(&visit)? {
            visible.push(visit);
        }
    }
    Ok(visible)
}

pub fn get_visit(store: &TriageStore, actor: Actor, id: RecordId) -> Result<SpecialistVisit> {
    let view = Visibility::new(store, actor)?;
    fetch_visible::<SpecialistVisit, _>(store, id, |v| view.visit(v))
}

pub fn create_visit(store: &TriageStore, actor: Actor, new_visit: NewSpecialistVisit) -> Result<SpecialistVisit> {
    let view = Visibility::new(store, actor)?;
    let (patient_id, department_id, emergency_id) =
        (new_visit.patient_id, new_visit.department_id, new_visit.emergency_id);
    let (visit, mut errors) = split(new_visit.validate(actor.id, Utc::now()));
    integrity::require::<Patient>(store, &mut errors, "patient_id", patient_id)?;
    integrity::require::<Department>(store, &mut errors, "department_id", department_id)?;
    let emergency = visible_emergency(store, &view, &mut errors, emergency_id)?;
    if let (Some(emergency), Some(patient_id)) = (&emergency, patient_id) {
        if emergency.patient_id != patient_id {
            errors.add(
                "patient_id",
                ValidationError::Invalid("does not match the emergency's patient".into()),
            );
        }
    }
    errors.into_result()?;
    let Some(visit) = visit else {
        return Err(FieldErrors::new().into());
    };

    let visit = store.insert(visit)?;
    info!(
        "Requested specialist visit {} in department {} for emergency {}",
        visit.id, visit.department_id, visit.emergency_id
    );
    Ok(visit)
}

pub fn update_visit(
    store: &TriageStore,
    actor: Actor,
    id: RecordId,
    patch: SpecialistVisitPatch,
) -> Result<SpecialistVisit> {
    let mut visit = get_visit(store, actor, id)?;
    patch.apply(&mut visit, Utc::now())?;
    store.save(&visit)?;
    Ok(visit)
}

pub fn delete_visit(store: &TriageStore, actor: Actor, id: RecordId) -> Result<()> {
    get_visit(store, actor, id)?;
    integrity::restrict_delete(
        "specialist visit",
        id,
        &[("attachments", store.any::<Attachment, _>(|a| a.specialist_visit_id == Some(id))?)],
    )?;
    store.remove::<SpecialistVisit>(id)?;
    Ok(())
}

pub fn list_requests(store: &TriageStore, actor: Actor) -> Result<Vec<SpecialistInvestigationRequest>> {
    let view = Visibility::new(store, actor)?;
    let mut visible = Vec::new();
    for request in store.list::<SpecialistInvestigationRequest>()? {
        if view.request(&request)? {
            visible.push(request);
        }
    }
    Ok(visible)
}

pub fn get_request(store: &TriageStore, actor: Actor, id: RecordId) -> Result<SpecialistInvestigationRequest> {
    let view = Visibility::new(store, actor)?;
    fetch_visible::<SpecialistInvestigationRequest, _>(store, id, |r| view.request(r))
}

pub fn create_request(
    store: &TriageStore,
    actor: Actor,
    new_request: NewSpecialistInvestigationRequest,
) -> Result<SpecialistInvestigationRequest> {
    let view = Visibility::new(store, actor)?;
    let (emergency_id, item_id) = (new_request.emergency_id, new_request.specialist_investigation_id);
    let (request, mut errors) = split(new_request.validate(actor.id, Utc::now()));
    visible_emergency(store, &view, &mut errors, emergency_id)?;
    integrity::require::<SpecialistInvestigation>(store, &mut errors, "specialist_investigation_id", item_id)?;
    errors.into_result()?;
    let Some(request) = request else {
        return Err(FieldErrors::new().into());
    };

    let request = store.insert(request)?;
    info!(
        "Requested specialist investigation {} for emergency {}",
        request.specialist_investigation_id, request.emergency_id
    );
    Ok(request)
}

pub fn update_request(
    store: &TriageStore,
    actor: Actor,
    id: RecordId,
    patch: SpecialistInvestigationRequestPatch,
) -> Result<SpecialistInvestigationRequest> {
    let mut request = get_request(store, actor, id)?;
    patch.apply(&mut request, Utc::now())?;
    store.save(&request)?;
    Ok(request)
}

pub fn delete_request(store: &TriageStore, actor: Actor, id: RecordId) -> Result<()> {
    get_request(store, actor, id)?;
    store.remove::<SpecialistInvestigationRequest>(id)?;
    Ok(())
}
