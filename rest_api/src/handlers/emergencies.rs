// rest_api/src/handlers/emergencies.rs

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use lib::services::emergencies;
use models::medical::{EmergencyPatch, NewEmergency};
use models::{Notification, RecordId};
use security::Capability;

use crate::dto::{CallResponse, CallSpecialistRequest, EmergencyQuery, EmergencyResponse};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[tracing::instrument(skip(state, user), fields(actor = user.0.id))]
pub async fn list_emergencies(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<EmergencyQuery>,
) -> ApiResult<Json<Vec<EmergencyResponse>>> {
    let found = emergencies::list_emergencies(&state.store, user.actor(), query.into())?;
    Ok(Json(EmergencyResponse::load_all(&state.store, found)?))
}

pub async fn show_emergency(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<EmergencyResponse>> {
    let emergency = emergencies::get_emergency(&state.store, user.actor(), id)?;
    Ok(Json(EmergencyResponse::load(&state.store, emergency)?))
}

#[tracing::instrument(skip(state, user, new_emergency), fields(actor = user.0.id))]
pub async fn create_emergency(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_emergency): ApiJson<NewEmergency>,
) -> ApiResult<(StatusCode, Json<EmergencyResponse>)> {
    user.require(&state, Capability::TriageEmergencies)?;
    if new_emergency.specialist_id.is_some() {
        user.require(&state, Capability::CallSpecialists)?;
    }
    let emergency = emergencies::create_emergency(&state.store, user.actor(), new_emergency)?;
    Ok((StatusCode::CREATED, Json(EmergencyResponse::load(&state.store, emergency)?)))
}

/// Serves both PATCH and PUT; absent fields are left alone.
#[tracing::instrument(skip(state, user, patch), fields(actor = user.0.id))]
pub async fn update_emergency(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    ApiJson(patch): ApiJson<EmergencyPatch>,
) -> ApiResult<Json<EmergencyResponse>> {
    user.require(&state, Capability::TriageEmergencies)?;
    if matches!(patch.specialist_id, Some(Some(_))) {
        user.require(&state, Capability::CallSpecialists)?;
    }
    let emergency = emergencies::update_emergency(&state.store, user.actor(), id, patch)?;
    Ok(Json(EmergencyResponse::load(&state.store, emergency)?))
}

pub async fn delete_emergency(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    user.require(&state, Capability::TriageEmergencies)?;
    emergencies::delete_emergency(&state.store, user.actor(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/emergencies/:id/arrive`
pub async fn arrive(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<EmergencyResponse>> {
    user.require(&state, Capability::TriageEmergencies)?;
    let emergency = emergencies::mark_arrived(&state.store, user.actor(), id)?;
    Ok(Json(EmergencyResponse::load(&state.store, emergency)?))
}

/// `POST /api/emergencies/:id/close`
pub async fn close(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<EmergencyResponse>> {
    user.require(&state, Capability::TriageEmergencies)?;
    let emergency = emergencies::close_emergency(&state.store, user.actor(), id)?;
    Ok(Json(EmergencyResponse::load(&state.store, emergency)?))
}

/// `POST /api/emergencies/:id/call-specialist`
#[tracing::instrument(skip(state, user, request), fields(actor = user.0.id))]
pub async fn call_specialist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
    ApiJson(request): ApiJson<CallSpecialistRequest>,
) -> ApiResult<Json<CallResponse>> {
    user.require(&state, Capability::CallSpecialists)?;
    let (emergency, notification) =
        emergencies::call_specialist(&state.store, user.actor(), id, request.specialist_id)?;
    Ok(Json(CallResponse {
        emergency: EmergencyResponse::load(&state.store, emergency)?,
        notification,
    }))
}

/// `POST /api/emergencies/:id/remind-specialist`
pub async fn remind_specialist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<(StatusCode, Json<Notification>)> {
    user.require(&state, Capability::CallSpecialists)?;
    let notification = emergencies::remind_specialist(&state.store, user.actor(), id)?;
    Ok((StatusCode::CREATED, Json(notification)))
}
