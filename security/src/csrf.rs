// security/src/csrf.rs
//
// Double-submit CSRF protection: the browser echoes the XSRF-TOKEN cookie
// back in a header on every state-changing request.

use uuid::Uuid;

use crate::AuthError;

pub const XSRF_HEADER: &str = "x-xsrf-token";
pub const CSRF_HEADER: &str = "x-csrf-token";

pub fn generate_csrf_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Safe methods skip the check.
pub fn requires_token(method: &str) -> bool {
    matches!(method, "POST" | "PUT" | "PATCH" | "DELETE")
}

/// Compares the cookie token with the header token without short-circuiting
/// on the first differing byte.
pub fn tokens_match(cookie: &str, header: &str) -> bool {
    if cookie.is_empty() || cookie.len() != header.len() {
        return false;
    }
    cookie
        .bytes()
        .zip(header.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

pub fn verify(cookie: Option<&str>, header: Option<&str>) -> Result<(), AuthError> {
    match (cookie, header) {
        (Some(cookie), Some(header)) if tokens_match(cookie, header) => Ok(()),
        _ => Err(AuthError::CsrfMismatch),
    }
}
