// models/src/medical/mod.rs

pub mod attachment;
pub mod department;
pub mod emergency;
pub mod investigation;
pub mod notification;
pub mod patient;
pub mod specialist_investigation;
pub mod specialist_visit;
pub mod user;

pub use attachment::{Attachment, AttachmentOwner, AttachmentPatch, NewAttachment};
pub use department::{Department, DepartmentPatch, NewDepartment};
pub use emergency::{
    AlertCode, Emergency, EmergencyPatch, EmergencyStatus, NewEmergency, ValidEmergencyPatch,
};
pub use investigation::{
    Investigation, InvestigationPatch, InvestigationPerformed, InvestigationPerformedPatch,
    NewInvestigation, NewInvestigationPerformed,
};
pub use notification::{Notification, NotificationKind};
pub use patient::{NewPatient, Patient, PatientPatch};
pub use specialist_investigation::{
    NewSpecialistInvestigation, NewSpecialistInvestigationRequest, RequestStatus,
    SpecialistInvestigation, SpecialistInvestigationPatch, SpecialistInvestigationRequest,
    SpecialistInvestigationRequestPatch,
};
pub use specialist_visit::{NewSpecialistVisit, SpecialistVisit, SpecialistVisitPatch, VisitStatus};
pub use user::{
    Login, NewUser, Permission, ProfilePatch, User, UserSummary, ValidNewUser, ValidProfilePatch,
};
