// rest_api/src/handlers/notifications.rs

use axum::extract::{Path, State};
use axum::Json;

use lib::services::notifications;
use models::{Notification, RecordId};

use crate::dto::{NotificationQuery, UpdatedCount};
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// `GET /api/notifications?unread=true`
pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    Ok(Json(notifications::list_for(&state.store, user.id, query.unread)?))
}

pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(notifications::mark_read(&state.store, user.id, id)?))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<UpdatedCount>> {
    let updated = notifications::mark_all_read(&state.store, user.id)?;
    Ok(Json(UpdatedCount { updated }))
}
