// rest_api/src/middleware.rs
//
// CSRF enforcement for state-changing requests and the session extractor
// used by every authenticated handler.

use axum::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use lib::Actor;
use models::User;
use security::cookies::{self, SESSION_COOKIE, XSRF_COOKIE};
use security::{csrf, Capability};

use crate::error::{ApiResult, RestApiError};
use crate::state::AppState;

/// Reads a cookie across every `Cookie` header of the request.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| cookies::read_cookie(header, name))
        .map(str::to_string)
}

fn csrf_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(csrf::XSRF_HEADER)
        .or_else(|| headers.get(csrf::CSRF_HEADER))
        .and_then(|value| value.to_str().ok())
}

/// Rejects POST/PUT/PATCH/DELETE whose header token does not echo the
/// XSRF-TOKEN cookie.
pub async fn csrf_middleware(request: Request, next: Next) -> ApiResult<Response> {
    if csrf::requires_token(request.method().as_str()) {
        let cookie = cookie_value(request.headers(), XSRF_COOKIE);
        if let Err(err) = csrf::verify(cookie.as_deref(), csrf_header(request.headers())) {
            tracing::debug!(method = %request.method(), uri = %request.uri(), "csrf check failed");
            return Err(err.into());
        }
    }
    Ok(next.run(request).await)
}

/// The user behind the session cookie. Extracting it answers 401 when the
/// session is missing, expired or points at a deleted user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor::from(&self.0)
    }

    pub fn require(&self, state: &AppState, capability: Capability) -> ApiResult<()> {
        Ok(state.roles.require(self.0.permission, capability)?)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = cookie_value(&parts.headers, SESSION_COOKIE).ok_or(RestApiError::Unauthenticated)?;
        let claims = security::validate_session_token(&token, state.session_secret())?;
        let user = security::session_user(&state.store, &claims)?;
        Ok(CurrentUser(user))
    }
}
