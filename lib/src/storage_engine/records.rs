// lib/src/storage_engine/records.rs

use serde::de::DeserializeOwned;
use serde::Serialize;

use models::medical::{
    Attachment, Department, Emergency, Investigation, InvestigationPerformed, Notification,
    Patient, SpecialistInvestigation, SpecialistInvestigationRequest, SpecialistVisit, User,
};
use models::RecordId;

/// A record kind kept in its own sled tree.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Sled tree name.
    const TREE: &'static str;
    /// Human name used in errors and logs.
    const ENTITY: &'static str;

    fn id(&self) -> RecordId;
    fn set_id(&mut self, id: RecordId);
}

macro_rules! record {
    ($ty:ty, $tree:literal, $entity:literal) => {
        impl Record for $ty {
            const TREE: &'static str = $tree;
            const ENTITY: &'static str = $entity;

            fn id(&self) -> RecordId {
                self.id
            }

            fn set_id(&mut self, id: RecordId) {
                self.id = id;
            }
        }
    };
}

record!(User, "users", "user");
record!(Patient, "patients", "patient");
record!(Department, "departments", "department");
record!(Emergency, "emergencies", "emergency");
record!(Investigation, "investigations", "investigation");
record!(InvestigationPerformed, "investigations_performed", "investigation performed");
record!(SpecialistVisit, "specialist_visits", "specialist visit");
record!(SpecialistInvestigation, "specialist_investigations", "specialist investigation");
record!(
    SpecialistInvestigationRequest,
    "specialist_investigation_requests",
    "specialist investigation request"
);
record!(Attachment, "attachments", "attachment");
record!(Notification, "notifications", "notification");
