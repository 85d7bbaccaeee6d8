// models/src/lib.rs
// Shared types for the triage service: stored records, payloads and their
// validation, status workflows.

pub mod errors;
pub mod identifiers;
pub mod medical;
pub mod validation;
pub mod workflow;

pub use errors::{FieldErrors, ModelError, ModelResult, TransitionError, ValidationError};
pub use identifiers::{IdentityCode, RecordId};
pub use workflow::Workflow;

pub use medical::{
    AlertCode, Attachment, AttachmentOwner, Department, Emergency, EmergencyStatus, Investigation,
    InvestigationPerformed, Login, Notification, NotificationKind, Patient, Permission,
    RequestStatus, SpecialistInvestigation, SpecialistInvestigationRequest, SpecialistVisit, User,
    UserSummary, VisitStatus,
};
