// security/src/lib.rs
//
// Session tokens, password login, CSRF tokens and the role capability
// matrix. Nothing here knows about HTTP frameworks; the REST layer reads
// cookies and headers and hands the raw strings over.

pub mod cookies;
pub mod csrf;
pub mod roles;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lib::services::users;
use lib::storage_engine::TriageStore;
use lib::TriageError;
use models::{Login, Permission, RecordId, User};

pub use roles::{Capability, RolesConfig};

/// Claims carried by the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub permission: Permission,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<RecordId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::Unauthenticated)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("These credentials do not match our records.")]
    InvalidCredentials,

    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("CSRF token mismatch.")]
    CsrfMismatch,

    #[error("This action is unauthorized: {0}")]
    Forbidden(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error(transparent)]
    Storage(#[from] TriageError),
}

/// Signs a session token for `user` valid for `ttl_hours`.
pub fn issue_session_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String, AuthError> {
    issue_session_token_at(user, secret, ttl_hours, Utc::now())
}

fn issue_session_token_at(
    user: &User,
    secret: &str,
    ttl_hours: i64,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let expires = Duration::try_hours(ttl_hours)
        .filter(|ttl| *ttl > Duration::zero())
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AuthError::JwtError(format!("Invalid session lifetime: {} hours", ttl_hours)))?;
    let claims = Claims {
        sub: user.id.to_string(),
        permission: user.permission,
        exp: expires.timestamp(),
        iat: now.timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::JwtError(format!("Failed to encode JWT: {}", e)))
}

/// Decodes and validates a session token. Expired, tampered or malformed
/// tokens all read as an absent session.
pub fn validate_session_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => debug!("Session token expired"),
                other => debug!("Rejected session token: {:?}", other),
            }
            AuthError::Unauthenticated
        })
}

/// Checks an email/password pair and records the login time.
pub fn authenticate(store: &TriageStore, login: &Login) -> Result<User, AuthError> {
    let Some(user) = users::find_by_email(store, &login.email)? else {
        debug!("Login attempt for unknown email");
        return Err(AuthError::InvalidCredentials);
    };
    let matches = User::verify_password(&login.password, &user.password_hash).map_err(|e| {
        warn!("Stored hash for user {} is unusable: {}", user.id, e);
        AuthError::InvalidCredentials
    })?;
    if !matches {
        return Err(AuthError::InvalidCredentials);
    }
    let user = users::record_login(store, user)?;
    info!("User {} logged in", user.id);
    Ok(user)
}

/// Resolves the session claims to the stored user. A deleted user ends the
/// session.
pub fn session_user(store: &TriageStore, claims: &Claims) -> Result<User, AuthError> {
    store.get::<User>(claims.user_id()?)?.ok_or(AuthError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::medical::NewUser;

    const SECRET: &str = "test-secret-with-enough-bytes-for-hs256";

    fn store_with_user() -> (TriageStore, User) {
        let store = TriageStore::temporary().unwrap();
        let user = users::create_user(
            &store,
            NewUser {
                name: Some("Marco".into()),
                surname: Some("Bianchi".into()),
                identity_code: Some("PS-0042".into()),
                email: Some("marco.bianchi@hospital.example".into()),
                password: Some("triage-password".into()),
                permission: Some(Permission::PsOperator),
                department_id: None,
            },
        )
        .unwrap();
        (store, user)
    }

    #[test]
    fn should_round_trip_session_claims() {
        let (_store, user) = store_with_user();
        let token = issue_session_token(&user, SECRET, 12).unwrap();
        let claims = validate_session_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.permission, Permission::PsOperator);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn should_reject_expired_or_foreign_tokens() {
        let (_store, user) = store_with_user();
        let stale = issue_session_token_at(&user, SECRET, 1, Utc::now() - Duration::hours(3)).unwrap();
        assert!(matches!(validate_session_token(&stale, SECRET), Err(AuthError::Unauthenticated)));

        let token = issue_session_token(&user, "another-secret-entirely-0123456789", 1).unwrap();
        assert!(matches!(validate_session_token(&token, SECRET), Err(AuthError::Unauthenticated)));
        assert!(matches!(validate_session_token("not.a.jwt", SECRET), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn should_authenticate_with_correct_password() {
        let (store, user) = store_with_user();
        let logged_in = authenticate(
            &store,
            &Login {
                email: " Marco.Bianchi@hospital.example ".into(),
                password: "triage-password".into(),
            },
        )
        .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(logged_in.last_login.is_some());
    }

    #[test]
    fn should_refuse_wrong_password_and_unknown_email() {
        let (store, _user) = store_with_user();
        let wrong = Login {
            email: "marco.bianchi@hospital.example".into(),
            password: "guess".into(),
        };
        assert!(matches!(authenticate(&store, &wrong), Err(AuthError::InvalidCredentials)));
        let unknown = Login {
            email: "nobody@hospital.example".into(),
            password: "triage-password".into(),
        };
        assert!(matches!(authenticate(&store, &unknown), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn session_ends_when_user_is_gone() {
        let (store, user) = store_with_user();
        let claims = validate_session_token(&issue_session_token(&user, SECRET, 1).unwrap(), SECRET).unwrap();
        assert_eq!(session_user(&store, &claims).unwrap().id, user.id);
        store.remove::<User>(user.id).unwrap();
        assert!(matches!(session_user(&store, &claims), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn should_refuse_unusable_session_lifetimes() {
        let (_store, user) = store_with_user();
        for ttl in [0, -1, i64::MAX] {
            assert!(matches!(issue_session_token(&user, SECRET, ttl), Err(AuthError::JwtError(_))));
        }
    }
}
