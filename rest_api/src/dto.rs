// rest_api/src/dto.rs
//
// Query strings and response shapes that differ from the stored records.

use serde::{Deserialize, Serialize};

use lib::services::emergencies::EmergencyFilter;
use lib::services::users::UserFilter;
use lib::TriageStore;
use models::{AlertCode, Department, Emergency, EmergencyStatus, Notification, Patient, Permission, RecordId, User, UserSummary};

#[derive(Debug, Default, Deserialize)]
pub struct EmergencyQuery {
    pub limit: Option<usize>,
    pub status: Option<EmergencyStatus>,
    pub alert_code: Option<AlertCode>,
}

impl From<EmergencyQuery> for EmergencyFilter {
    fn from(query: EmergencyQuery) -> Self {
        EmergencyFilter {
            limit: query.limit,
            status: query.status,
            alert_code: query.alert_code,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub permission: Option<Permission>,
    pub department_id: Option<RecordId>,
}

impl From<UserQuery> for UserFilter {
    fn from(query: UserQuery) -> Self {
        UserFilter {
            permission: query.permission,
            department_id: query.department_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallSpecialistRequest {
    pub specialist_id: Option<RecordId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecialistSummary {
    #[serde(flatten)]
    pub user: UserSummary,
    pub department: Option<Department>,
}

/// An emergency with its patient, creator and specialist loaded.
#[derive(Debug, Clone, Serialize)]
pub struct EmergencyResponse {
    #[serde(flatten)]
    pub emergency: Emergency,
    pub patient: Option<Patient>,
    pub user: Option<UserSummary>,
    pub specialist: Option<SpecialistSummary>,
}

impl EmergencyResponse {
    pub fn load(store: &TriageStore, emergency: Emergency) -> lib::Result<Self> {
        let patient = store.get::<Patient>(emergency.patient_id)?;
        let user = store.get::<User>(emergency.user_id)?.map(|u| u.summary());
        let specialist = match emergency.specialist_id {
            Some(id) => match store.get::<User>(id)? {
                Some(specialist) => {
                    let department = match specialist.department_id {
                        Some(department_id) => store.get::<Department>(department_id)?,
                        None => None,
                    };
                    Some(SpecialistSummary {
                        user: specialist.summary(),
                        department,
                    })
                }
                None => None,
            },
            None => None,
        };
        Ok(EmergencyResponse {
            emergency,
            patient,
            user,
            specialist,
        })
    }

    pub fn load_all(store: &TriageStore, emergencies: Vec<Emergency>) -> lib::Result<Vec<Self>> {
        emergencies.into_iter().map(|e| Self::load(store, e)).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallResponse {
    pub emergency: EmergencyResponse,
    pub notification: Notification,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UpdatedCount {
    pub updated: usize,
}
