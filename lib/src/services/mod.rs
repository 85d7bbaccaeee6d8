// lib/src/services/mod.rs
//
// Operations behind the REST controllers. Each one validates its payload,
// checks foreign keys and visibility for the acting user, then writes
// through the store. Capability checks happen before these are called.

pub mod catalog;
pub mod emergencies;
pub mod integrity;
pub mod investigations;
pub mod notifications;
pub mod specialist;
pub mod users;
pub mod visibility;

use models::{Permission, RecordId, User};

/// The authenticated user an operation runs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: RecordId,
    pub permission: Permission,
    pub department_id: Option<RecordId>,
}

impl Actor {
    pub fn sees_everything(&self) -> bool {
        matches!(self.permission, Permission::Admin | Permission::PsOperator)
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            id: user.id,
            permission: user.permission,
            department_id: user.department_id,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use models::medical::{NewDepartment, NewPatient};
    use models::{Department, IdentityCode, Patient, Permission, User};

    use super::Actor;
    use crate::storage_engine::TriageStore;

    /// Inserts a user directly; the password hash is never checked here.
    pub fn user(store: &TriageStore, email: &str, permission: Permission, department_id: Option<u64>) -> User {
        let handle = email.split('@').next().unwrap_or("user");
        let now = Utc::now();
        let user = User {
            id: 0,
            name: "Test".into(),
            surname: handle.into(),
            identity_code: IdentityCode::new(handle.to_uppercase()).unwrap(),
            email: email.into(),
            password_hash: "unused".into(),
            permission,
            department_id,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        store.insert(user).unwrap()
    }

    pub fn patient(store: &TriageStore, name: &str) -> Patient {
        let patient = NewPatient {
            name: Some(name.into()),
            surname: Some("Rossi".into()),
            ..Default::default()
        }
        .validate(Utc::now())
        .unwrap();
        store.insert(patient).unwrap()
    }

    pub fn department(store: &TriageStore, name: &str) -> Department {
        let department = NewDepartment {
            name: Some(name.into()),
            description: None,
        }
        .validate(Utc::now())
        .unwrap();
        store.insert(department).unwrap()
    }

    pub fn actor(user: &User) -> Actor {
        Actor::from(user)
    }
}
