// lib/src/services/catalog.rs
//
// Patients, departments and the two investigation catalogs. Deletes are
// restricted while other rows still point at the record.

use chrono::Utc;
use log::info;

use models::errors::FieldErrors;
use models::medical::{
    DepartmentPatch, InvestigationPatch, NewDepartment, NewInvestigation, NewPatient,
    NewSpecialistInvestigation, PatientPatch, SpecialistInvestigationPatch,
};
use models::{
    Department, Emergency, Investigation, InvestigationPerformed, Patient, RecordId,
    SpecialistInvestigation, SpecialistInvestigationRequest, SpecialistVisit, User,
};

use crate::errors::Result;
use crate::services::integrity;
use crate::storage_engine::TriageStore;

pub fn create_patient(store: &TriageStore, new_patient: NewPatient) -> Result<Patient> {
    let patient = store.insert(new_patient.validate(Utc::now())?)?;
    info!("Registered patient {}", patient.id);
    Ok(patient)
}

pub fn update_patient(store: &TriageStore, id: RecordId, patch: PatientPatch) -> Result<Patient> {
    let mut patient = store.fetch::<Patient>(id)?;
    patch.apply(&mut patient, Utc::now())?;
    store.save(&patient)?;
    Ok(patient)
}

pub fn delete_patient(store: &TriageStore, id: RecordId) -> Result<()> {
    store.fetch::<Patient>(id)?;
    integrity::restrict_delete(
        "patient",
        id,
        &[
            ("emergencies", store.any::<Emergency, _>(|e| e.patient_id == id)?),
            ("specialist visits", store.any::<SpecialistVisit, _>(|v| v.patient_id == id)?),
        ],
    )?;
    store.remove::<Patient>(id)?;
    Ok(())
}

pub fn create_department(store: &TriageStore, new_department: NewDepartment) -> Result<Department> {
    let (department, mut errors) = split(new_department.validate(Utc::now()));
    if let Some(department) = &department {
        integrity::ensure_unique::<Department, _>(store, &mut errors, "name", None, |d| {
            d.name.eq_ignore_ascii_case(&department.name)
        })?;
    }
    errors.into_result()?;
    match department {
        Some(department) => store.insert(department),
        None => Err(FieldErrors::new().into()),
    }
}

pub fn update_department(store: &TriageStore, id: RecordId, patch: DepartmentPatch) -> Result<Department> {
    let mut department = store.fetch::<Department>(id)?;
    patch.apply(&mut department, Utc::now())?;
    let mut errors = FieldErrors::new();
    integrity::ensure_unique::<Department, _>(store, &mut errors, "name", Some(id), |d| {
        d.name.eq_ignore_ascii_case(&department.name)
    })?;
    errors.into_result()?;
    store.save(&department)?;
    Ok(department)
}

pub fn delete_department(store: &TriageStore, id: RecordId) -> Result<()> {
    store.fetch::<Department>(id)?;
    integrity::restrict_delete(
        "department",
        id,
        &[
            ("users", store.any::<User, _>(|u| u.department_id == Some(id))?),
            ("specialist visits", store.any::<SpecialistVisit, _>(|v| v.department_id == id)?),
            (
                "specialist investigations",
                store.any::<SpecialistInvestigation, _>(|i| i.department_id == id)?,
            ),
        ],
    )?;
    store.remove::<Department>(id)?;
    Ok(())
}

pub fn create_investigation(store: &TriageStore, new_investigation: NewInvestigation) -> Result<Investigation> {
    let (investigation, mut errors) = split(new_investigation.validate(Utc::now()));
    if let Some(investigation) = &investigation {
        integrity::ensure_unique::<Investigation, _>(store, &mut errors, "name", None, |i| {
            i.name.eq_ignore_ascii_case(&investigation.name)
        })?;
    }
    errors.into_result()?;
    match investigation {
        Some(investigation) => store.insert(investigation),
        None => Err(FieldErrors::new().into()),
    }
}

pub fn update_investigation(store: &TriageStore, id: RecordId, patch: InvestigationPatch) -> Result<Investigation> {
    let mut investigation = store.fetch::<Investigation>(id)?;
    patch.apply(&mut investigation, Utc::now())?;
    let mut errors = FieldErrors::new();
    integrity::ensure_unique::<Investigation, _>(store, &mut errors, "name", Some(id), |i| {
        i.name.eq_ignore_ascii_case(&investigation.name)
    })?;
    errors.into_result()?;
    store.save(&investigation)?;
    Ok(investigation)
}

pub fn delete_investigation(store: &TriageStore, id: RecordId) -> Result<()> {
    store.fetch::<Investigation>(id)?;
    integrity::restrict_delete(
        "investigation",
        id,
        &[(
            "investigations performed",
            store.any::<InvestigationPerformed, _>(|p| p.investigation_id == id)?,
        )],
    )?;
    store.remove::<Investigation>(id)?;
    Ok(())
}

pub fn create_specialist_investigation(
    store: &TriageStore,
    new_item: NewSpecialistInvestigation,
) -> Result<SpecialistInvestigation> {
    let department_id = new_item.department_id;
    let (item, mut errors) = split(new_item.validate(Utc::now()));
    integrity::require::<Department>(store, &mut errors, "department_id", department_id)?;
    errors.into_result()?;
    match item {
        Some(item) => store.insert(item),
        None => Err(FieldErrors::new().into()),
    }
}

pub fn update_specialist_investigation(
    store: &TriageStore,
    id: RecordId,
    patch: SpecialistInvestigationPatch,
) -> Result<SpecialistInvestigation> {
    let mut item = store.fetch::<SpecialistInvestigation>(id)?;
    let mut errors = FieldErrors::new();
    integrity::require::<Department>(store, &mut errors, "department_id", patch.department_id)?;
    errors.into_result()?;
    patch.apply(&mut item, Utc::now())?;
    store.save(&item)?;
    Ok(item)
}

pub fn delete_specialist_investigation(store: &TriageStore, id: RecordId) -> Result<()> {
    store.fetch::<SpecialistInvestigation>(id)?;
    integrity::restrict_delete(
        "specialist investigation",
        id,
        &[(
            "specialist investigation requests",
            store.any::<SpecialistInvestigationRequest, _>(|r| r.specialist_investigation_id == id)?,
        )],
    )?;
    store.remove::<SpecialistInvestigation>(id)?;
    Ok(())
}

/// Splits a validation result so store checks can add to the same errors.
pub(crate) fn split<T>(result: std::result::Result<T, FieldErrors>) -> (Option<T>, FieldErrors) {
    match result {
        Ok(value) => (Some(value), FieldErrors::new()),
        Err(errors) => (None, errors),
    }
}
