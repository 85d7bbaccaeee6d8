// rest_api/src/extract.rs

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use models::errors::FieldErrors;

use crate::error::RestApiError;

/// `Json` with the API's error shape: a well-formed body of the wrong shape
/// is a 422 on the offending field, broken JSON is a 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(JsonRejection::JsonDataError(err)) => {
                let (field, message) = describe_data_error(&err.body_text());
                Err(RestApiError::Validation(FieldErrors::single_message(&field, &message)))
            }
            Err(rejection) => Err(RestApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// `Query` whose rejection is a JSON 400 instead of axum's plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection| RestApiError::BadRequest(rejection.body_text()))
    }
}

/// Splits axum's `...target type: <path>: <serde message>` text into the
/// field path and a sentence for it.
fn describe_data_error(text: &str) -> (String, String) {
    let detail = text.split_once("target type: ").map_or(text, |(_, rest)| rest);
    match detail.split_once(": ") {
        Some((path, reason)) if !path.is_empty() && path.chars().all(|c| c.is_alphanumeric() || "_.[]".contains(c)) => {
            (path.to_string(), format!("The {} field is invalid: {}.", path.replace('_', " "), reason))
        }
        _ => ("payload".to_string(), format!("The payload is invalid: {}.", detail)),
    }
}
