// rest_api/src/handlers/users.rs

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use lib::services::users;
use models::medical::NewUser;
use models::UserSummary;
use security::Capability;

use super::blocking;
use crate::dto::UserQuery;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Any signed-in user may list staff; the triage form picks specialists
/// from here.
pub async fn list_users(
    State(state): State<AppState>,
    _user: CurrentUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let found = users::list_users(&state.store, query.into())?;
    Ok(Json(found.iter().map(UserSummary::from).collect()))
}

#[tracing::instrument(skip(state, user, new_user), fields(actor = user.0.id))]
pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new_user): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    user.require(&state, Capability::ManageCatalogs)?;
    let store = state.store.clone();
    let created = blocking(move || Ok(users::create_user(&store, new_user)?)).await?;
    Ok((StatusCode::CREATED, Json(created.summary())))
}
