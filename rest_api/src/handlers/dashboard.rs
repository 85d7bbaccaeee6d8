// rest_api/src/handlers/dashboard.rs
//
// Department overview and alert code suggestions for the triage form.

use axum::extract::State;
use axum::Json;

use lib::dashboard::{self, DashboardSummary};
use lib::{TriageRequest, TriageSuggestion};
use security::Capability;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// `GET /api/dashboard`, computed over what the caller can see.
pub async fn summary(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(dashboard::load(&state.store, user.actor())?))
}

/// `POST /api/triage-suggest`
#[tracing::instrument(skip(state, user, request), fields(actor = user.0.id))]
pub async fn triage_suggest(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(request): ApiJson<TriageRequest>,
) -> ApiResult<Json<TriageSuggestion>> {
    user.require(&state, Capability::TriageEmergencies)?;
    let suggestion = state.suggester.suggest(&request).await?;
    tracing::debug!(alert_code = %suggestion.alert_code, source = %suggestion.source, "triage suggestion");
    Ok(Json(suggestion))
}
