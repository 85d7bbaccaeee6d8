// rest_api/src/handlers/auth.rs
//
// Cookie session login for the single-page dashboard.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use lib::services::users;
use models::errors::{FieldErrors, ValidationError};
use models::medical::ProfilePatch;
use models::{Login, UserSummary};
use security::cookies::{SetCookie, SESSION_COOKIE};
use security::csrf;

use super::blocking;
use crate::dto::LoginRequest;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// `GET /sanctum/csrf-cookie`
pub async fn csrf_cookie(State(state): State<AppState>) -> impl IntoResponse {
    let token = csrf::generate_csrf_token();
    let cookie = SetCookie::xsrf(&token, state.config.security.secure_cookies).header_value();
    (StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)])
}

#[tracing::instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut errors = FieldErrors::new();
    let email = payload.email.filter(|e| !e.trim().is_empty());
    let password = payload.password.filter(|p| !p.is_empty());
    if email.is_none() {
        errors.add("email", ValidationError::Required);
    }
    if password.is_none() {
        errors.add("password", ValidationError::Required);
    }
    errors.into_result().map_err(crate::error::RestApiError::Validation)?;
    let login = Login {
        email: email.unwrap_or_default(),
        password: password.unwrap_or_default(),
    };

    let store = state.store.clone();
    let user = blocking(move || Ok(security::authenticate(&store, &login)?)).await?;
    let security_config = &state.config.security;
    let token = security::issue_session_token(&user, &security_config.session_secret, security_config.session_ttl_hours)?;
    let cookie = SetCookie::session(&token, security_config.session_ttl_hours, security_config.secure_cookies).header_value();
    tracing::info!(user_id = user.id, "session started");
    Ok(([(SET_COOKIE, cookie)], Json(user.summary())))
}

pub async fn logout(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> impl IntoResponse {
    tracing::info!(user_id = user.id, "session ended");
    let cookie = SetCookie::expired(SESSION_COOKIE, state.config.security.secure_cookies).header_value();
    (StatusCode::NO_CONTENT, [(SET_COOKIE, cookie)])
}

/// `GET /api/user`
pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<UserSummary> {
    Json(user.summary())
}

/// `PATCH /api/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> ApiResult<Json<UserSummary>> {
    let store = state.store.clone();
    let updated = blocking(move || Ok(users::update_profile(&store, user.id, patch)?)).await?;
    Ok(Json(updated.summary()))
}
