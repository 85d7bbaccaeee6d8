// rest_api/src/handlers/catalog.rs
//
// Patients, departments and the two investigation catalogs. Everyone signed
// in may read them; writes need the matching capability.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use lib::services::catalog;
use models::medical::{
    DepartmentPatch, InvestigationPatch, NewDepartment, NewInvestigation, NewPatient,
    NewSpecialistInvestigation, PatientPatch, SpecialistInvestigationPatch,
};
use models::{Department, Investigation, Patient, RecordId, SpecialistInvestigation};
use security::Capability;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

// --- Patients ---

pub async fn list_patients(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<Vec<Patient>>> {
    Ok(Json(state.store.list::<Patient>()?))
}

pub async fn show_patient(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Patient>> {
    Ok(Json(state.store.fetch::<Patient>(id)?))
}

pub async fn create_patient(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_patient): ApiJson<NewPatient>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    user.require(&state, Capability::ManagePatients)?;
    let patient = catalog::create_patient(&state.store, new_patient)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn update_patient(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    ApiJson(patch): ApiJson<PatientPatch>,
) -> ApiResult<Json<Patient>> {
    user.require(&state, Capability::ManagePatients)?;
    Ok(Json(catalog::update_patient(&state.store, id, patch)?))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    user.require(&state, Capability::ManagePatients)?;
    catalog::delete_patient(&state.store, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Departments ---

pub async fn list_departments(State(state): State<AppState>, _user: CurrentUser) -> ApiResult<Json<Vec<Department>>> {
    Ok(Json(state.store.list::<Department>()?))
}

pub async fn show_department(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Department>> {
    Ok(Json(state.store.fetch::<Department>(id)?))
}

pub async fn create_department(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_department): ApiJson<NewDepartment>,
) -> ApiResult<(StatusCode, Json<Department>)> {
    user.require(&state, Capability::ManageCatalogs)?;
    let department = catalog::create_department(&state.store, new_department)?;
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn update_department(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    ApiJson(patch): ApiJson<DepartmentPatch>,
) -> ApiResult<Json<Department>> {
    user.require(&state, Capability::ManageCatalogs)?;
    Ok(Json(catalog::update_department(&state.store, id, patch)?))
}

pub async fn delete_department(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    user.require(&state, Capability::ManageCatalogs)?;
    catalog::delete_department(&state.store, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Investigations ---

pub async fn list_investigations(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> ApiResult<Json<Vec<Investigation>>> {
    Ok(Json(state.store.list::<Investigation>()?))
}

pub async fn show_investigation(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Investigation>> {
    Ok(Json(state.store.fetch::<Investigation>(id)?))
}

pub async fn create_investigation(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_investigation): ApiJson<NewInvestigation>,
) -> ApiResult<(StatusCode, Json<Investigation>)> {
    user.require(&state, Capability::ManageCatalogs)?;
    let investigation = catalog::create_investigation(&state.store, new_investigation)?;
    Ok((StatusCode::CREATED, Json(investigation)))
}

pub async fn update_investigation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    ApiJson(patch): ApiJson<InvestigationPatch>,
) -> ApiResult<Json<Investigation>> {
    user.require(&state, Capability::ManageCatalogs)?;
    Ok(Json(catalog::update_investigation(&state.store, id, patch)?))
}

pub async fn delete_investigation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    user.require(&state, Capability::ManageCatalogs)?;
    catalog::delete_investigation(&state.store, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Specialist investigations ---

pub async fn list_specialist_investigations(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> ApiResult<Json<Vec<SpecialistInvestigation>>> {
    Ok(Json(state.store.list::<SpecialistInvestigation>()?))
}

pub async fn show_specialist_investigation(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<SpecialistInvestigation>> {
    Ok(Json(state.store.fetch::<SpecialistInvestigation>(id)?))
}

pub async fn create_specialist_investigation(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_item): ApiJson<NewSpecialistInvestigation>,
) -> ApiResult<(StatusCode, Json<SpecialistInvestigation>)> {
    user.require(&state, Capability::ManageCatalogs)?;
    let item = catalog::create_specialist_investigation(&state.store, new_item)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_specialist_investigation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    ApiJson(patch): ApiJson<SpecialistInvestigationPatch>,
) -> ApiResult<Json<SpecialistInvestigation>> {
    user.require(&state, Capability::ManageCatalogs)?;
    Ok(Json(catalog::update_specialist_investigation(&state.store, id, patch)?))
}

pub async fn delete_specialist_investigation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    user.require(&state, Capability::ManageCatalogs)?;
    catalog::delete_specialist_investigation(&state.store, id)?;
    Ok(StatusCode::NO_CONTENT)
}
