// lib/src/services/users.rs

use chrono::Utc;
use log::info;

use models::errors::FieldErrors;
use models::medical::{NewUser, ProfilePatch};
use models::{Department, Permission, RecordId, User};

use crate::errors::Result;
use crate::services::integrity;
use crate::storage_engine::TriageStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub permission: Option<Permission>,
    pub department_id: Option<RecordId>,
}

pub fn create_user(store: &TriageStore, new_user: NewUser) -> Result<User> {
    let (valid, mut errors) = match new_user.validate() {
        Ok(valid) => (Some(valid), FieldErrors::new()),
        Err(errors) => (None, errors),
    };
    if let Some(valid) = &valid {
        integrity::require::<Department>(store, &mut errors, "department_id", valid.department_id)?;
        integrity::ensure_unique::<User, _>(store, &mut errors, "email", None, |u| u.email == valid.email)?;
        integrity::ensure_unique::<User, _>(store, &mut errors, "identity_code", None, |u| {
            u.identity_code == valid.identity_code
        })?;
    }
    errors.into_result()?;
    let Some(valid) = valid else {
        return Err(FieldErrors::new().into());
    };

    let user = store.insert(User::from_new_user(valid, Utc::now())?)?;
    info!("Created {} user {} ({})", user.permission, user.id, user.email);
    Ok(user)
}

pub fn find_by_email(store: &TriageStore, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    Ok(store.list_where::<User, _>(|u| u.email == email)?.into_iter().next())
}

pub fn list_users(store: &TriageStore, filter: UserFilter) -> Result<Vec<User>> {
    store.list_where::<User, _>(|u| {
        filter.permission.map_or(true, |p| u.permission == p)
            && filter.department_id.map_or(true, |d| u.department_id == Some(d))
    })
}

pub fn update_profile(store: &TriageStore, user_id: RecordId, patch: ProfilePatch) -> Result<User> {
    let mut user = store.fetch::<User>(user_id)?;
    let valid = patch.validate()?;
    if let Some(email) = &valid.email {
        let mut errors = FieldErrors::new();
        integrity::ensure_unique::<User, _>(store, &mut errors, "email", Some(user_id), |u| &u.email == email)?;
        errors.into_result()?;
    }
    user.apply_profile(valid, Utc::now())?;
    store.save(&user)?;
    Ok(user)
}

pub fn record_login(store: &TriageStore, mut user: User) -> Result<User> {
    user.last_login = Some(Utc::now());
    store.save(&user)?;
    Ok(user)
}
