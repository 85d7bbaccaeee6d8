// rest_api/src/handlers/clinical.rs
//
// Work recorded against an emergency: investigations performed, specialist
// visits, specialist investigation requests and their attachments. Rows the
// caller cannot see answer 404.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use lib::services::{investigations, specialist};
use models::medical::{
    AttachmentPatch, InvestigationPerformedPatch, NewAttachment, NewInvestigationPerformed,
    NewSpecialistInvestigationRequest, NewSpecialistVisit, SpecialistInvestigationRequestPatch,
    SpecialistVisitPatch,
};
use models::{Attachment, InvestigationPerformed, RecordId, SpecialistInvestigationRequest, SpecialistVisit};
use security::Capability;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

// --- Investigations performed ---

pub async fn list_performed(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<InvestigationPerformed>>> {
    Ok(Json(investigations::list_performed(&state.store, user.actor())?))
}

pub async fn show_performed(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<InvestigationPerformed>> {
    Ok(Json(investigations::get_performed(&state.store, user.actor(), id)?))
}

pub async fn create_performed(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_performed): ApiJson<NewInvestigationPerformed>,
) -> ApiResult<(StatusCode, Json<InvestigationPerformed>)> {
    user.require(&state, Capability::RecordInvestigations)?;
    let performed = investigations::record_performed(&state.store, user.actor(), new_performed)?;
    Ok((StatusCode::CREATED, Json(performed)))
}

pub async fn update_performed(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    ApiJson(patch): ApiJson<InvestigationPerformedPatch>,
) -> ApiResult<Json<InvestigationPerformed>> {
    user.require(&state, Capability::RecordInvestigations)?;
    Ok(Json(investigations::update_performed(&state.store, user.actor(), id, patch)?))
}

pub async fn delete_performed(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    user.require(&state, Capability::RecordInvestigations)?;
    investigations::delete_performed(&state.store, user.actor(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Specialist visits ---

pub async fn list_visits(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<Vec<SpecialistVisit>>> {
    Ok(Json(specialist::list_visits(&state.store, user.actor())?))
}

pub async fn show_visit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<SpecialistVisit>> {
    Ok(Json(specialist::get_visit(&state.store, user.actor(), id)?))
}

#[tracing::instrument(skip(state, user, new_visit), fields(actor = user.0.id))]
pub async fn create_visit(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_visit): ApiJson<NewSpecialistVisit>,
) -> ApiResult<(StatusCode, Json<SpecialistVisit>)> {
    user.require(&state, Capability::RequestSpecialistWork)?;
    let visit = specialist::create_visit(&state.store, user.actor(), new_visit)?;
    Ok((StatusCode::CREATED, Json(visit)))
}

pub async fn update_visit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    ApiJson(patch): ApiJson<SpecialistVisitPatch>,
) -> ApiResult<Json<SpecialistVisit>> {
    user.require(&state, Capability::UpdateSpecialistWork)?;
    Ok(Json(specialist::update_visit(&state.store, user.actor(), id, patch)?))
}

pub async fn delete_visit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    user.require(&state, Capability::RequestSpecialistWork)?;
    specialist::delete_visit(&state.store, user.actor(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Specialist investigation requests ---

pub async fn list_requests(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<SpecialistInvestigationRequest>>> {
    Ok(Json(specialist::list_requests(&state.store, user.actor())?))
}

pub async fn show_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<SpecialistInvestigationRequest>> {
    Ok(Json(specialist::get_request(&state.store, user.actor(), id)?))
}

#[tracing::instrument(skip(state, user, new_request), fields(actor = user.0.id))]
pub async fn create_request(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_request): ApiJson<NewSpecialistInvestigationRequest>,
) -> ApiResult<(StatusCode, Json<SpecialistInvestigationRequest>)> {
    user.require(&state, Capability::RequestSpecialistWork)?;
    let request = specialist::create_request(&state.store, user.actor(), new_request)?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn update_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    ApiJson(patch): ApiJson<SpecialistInvestigationRequestPatch>,
) -> ApiResult<Json<SpecialistInvestigationRequest>> {
    user.require(&state, Capability::UpdateSpecialistWork)?;
    Ok(Json(specialist::update_request(&state.store, user.actor(), id, patch)?))
}

pub async fn delete_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    user.require(&state, Capability::RequestSpecialistWork)?;
    specialist::delete_request(&state.store, user.actor(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Attachments ---

pub async fn list_attachments(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<Vec<Attachment>>> {
    Ok(Json(investigations::list_attachments(&state.store, user.actor())?))
}

pub async fn show_attachment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Attachment>> {
    Ok(Json(investigations::get_attachment(&state.store, user.actor(), id)?))
}

pub async fn create_attachment(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_attachment): ApiJson<NewAttachment>,
) -> ApiResult<(StatusCode, Json<Attachment>)> {
    user.require(&state, Capability::RecordInvestigations)?;
    let attachment = investigations::create_attachment(&state.store, user.actor(), new_attachment)?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn update_attachment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    ApiJson(patch): ApiJson<AttachmentPatch>,
) -> ApiResult<Json<Attachment>> {
    user.require(&state, Capability::RecordInvestigations)?;
    Ok(Json(investigations::update_attachment(&state.store, user.actor(), id, patch)?))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    user.require(&state, Capability::RecordInvestigations)?;
    investigations::delete_attachment(&state.store, user.actor(), id)?;
    Ok(StatusCode::NO_CONTENT)
}
