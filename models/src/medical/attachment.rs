// models/src/medical/attachment.rs
//
// Metadata for files attached to a performed investigation or a specialist
// visit. The bytes live elsewhere; only the path is recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, ValidationError};
use crate::identifiers::RecordId;
use crate::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentOwner {
    InvestigationPerformed(RecordId),
    SpecialistVisit(RecordId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: RecordId,
    pub investigation_performed_id: Option<RecordId>,
    pub specialist_visit_id: Option<RecordId>,
    pub path: String,
    pub original_name: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attachment {
    pub fn owner(&self) -> Option<AttachmentOwner> {
        match (self.investigation_performed_id, self.specialist_visit_id) {
            (Some(id), None) => Some(AttachmentOwner::InvestigationPerformed(id)),
            (None, Some(id)) => Some(AttachmentOwner::SpecialistVisit(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAttachment {
    pub investigation_performed_id: Option<RecordId>,
    pub specialist_visit_id: Option<RecordId>,
    pub path: Option<String>,
    pub original_name: Option<String>,
    pub mime_type: Option<String>,
    /// Signed so a negative size surfaces as a field error, not a parse error.
    pub size_bytes: Option<i64>,
}

fn size_bytes(errors: &mut FieldErrors, value: Option<i64>) -> Option<u64> {
    let size = value?;
    match u64::try_from(size) {
        Ok(size) => Some(size),
        Err(_) => {
            errors.add("size_bytes", ValidationError::Min(0));
            None
        }
    }
}

fn check_owner(errors: &mut FieldErrors, performed: Option<RecordId>, visit: Option<RecordId>) {
    match (performed, visit) {
        (Some(_), None) | (None, Some(_)) => {}
        (None, None) => errors.add(
            "investigation_performed_id",
            ValidationError::Invalid("or specialist visit id must be given".into()),
        ),
        (Some(_), Some(_)) => errors.add(
            "specialist_visit_id",
            ValidationError::Invalid("cannot be combined with investigation performed id".into()),
        ),
    }
}

impl NewAttachment {
    pub fn validate(self, now: DateTime<Utc>) -> Result<Attachment, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_owner(&mut errors, self.investigation_performed_id, self.specialist_visit_id);
        let path = validation::required_text(&mut errors, "path", self.path.as_deref(), 1024);
        let original_name =
            validation::required_text(&mut errors, "original_name", self.original_name.as_deref(), 255);
        let mime_type = validation::optional_text(&mut errors, "mime_type", self.mime_type.as_deref(), 127);
        let size_bytes = size_bytes(&mut errors, self.size_bytes);
        errors.into_result()?;

        Ok(Attachment {
            id: 0,
            investigation_performed_id: self.investigation_performed_id,
            specialist_visit_id: self.specialist_visit_id,
            path: path.unwrap_or_default(),
            original_name: original_name.unwrap_or_default(),
            mime_type,
            size_bytes,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentPatch {
    pub investigation_performed_id: Option<RecordId>,
    pub specialist_visit_id: Option<RecordId>,
    pub path: Option<String>,
    pub original_name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub mime_type: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub size_bytes: Option<Option<i64>>,
}

impl AttachmentPatch {
    /// Moving an attachment to the other owner kind clears the previous one.
    pub fn apply(self, attachment: &mut Attachment, now: DateTime<Utc>) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let (performed, visit) = match (self.investigation_performed_id, self.specialist_visit_id) {
            (None, None) => (attachment.investigation_performed_id, attachment.specialist_visit_id),
            (Some(id), None) => (Some(id), None),
            (None, Some(id)) => (None, Some(id)),
            (p, v) => (p, v),
        };
        check_owner(&mut errors, performed, visit);
        let path = self
            .path
            .as_deref()
            .and_then(|p| validation::required_text(&mut errors, "path", Some(p), 1024));
        let original_name = self
            .original_name
            .as_deref()
            .and_then(|n| validation::required_text(&mut errors, "original_name", Some(n), 255));
        let mime_type = self
            .mime_type
            .as_ref()
            .map(|m| validation::optional_text(&mut errors, "mime_type", m.as_deref(), 127));
        let size = self.size_bytes.map(|s| size_bytes(&mut errors, s));
        errors.into_result()?;

        attachment.investigation_performed_id = performed;
        attachment.specialist_visit_id = visit;
        if let Some(path) = path {
            attachment.path = path;
        }
        if let Some(original_name) = original_name {
            attachment.original_name = original_name;
        }
        if let Some(mime_type) = mime_type {
            attachment.mime_type = mime_type;
        }
        if let Some(size) = size {
            attachment.size_bytes = size;
        }
        attachment.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> NewAttachment {
        NewAttachment {
            investigation_performed_id: Some(1),
            path: Some("attachments/ecg-001.pdf".into()),
            original_name: Some("ecg.pdf".into()),
            mime_type: Some("application/pdf".into()),
            size_bytes: Some(20_480),
            ..Default::default()
        }
    }

    #[test]
    fn should_accept_single_owner() {
        let attachment = upload().validate(Utc::now()).unwrap();
        assert_eq!(attachment.owner(), Some(AttachmentOwner::InvestigationPerformed(1)));
        assert_eq!(attachment.size_bytes, Some(20_480));
    }

    #[test]
    fn should_reject_negative_size() {
        let mut new = upload();
        new.size_bytes = Some(-1);
        let errors = new.validate(Utc::now()).unwrap_err();
        assert_eq!(
            errors.get("size_bytes").unwrap(),
            ["The size bytes field must be at least 0.".to_string()]
        );
    }

    #[test]
    fn should_require_exactly_one_owner() {
        let mut orphan = upload();
        orphan.investigation_performed_id = None;
        assert!(orphan.validate(Utc::now()).is_err());

        let mut both = upload();
        both.specialist_visit_id = Some(2);
        assert!(both.validate(Utc::now()).unwrap_err().has("specialist_visit_id"));
    }

    #[test]
    fn patch_moves_owner() {
        let now = Utc::now();
        let mut attachment = upload().validate(now).unwrap();
        let patch: AttachmentPatch = serde_json::from_str(r#"{"specialist_visit_id": 8}"#).unwrap();
        patch.apply(&mut attachment, now).unwrap();
        assert_eq!(attachment.owner(), Some(AttachmentOwner::SpecialistVisit(8)));
    }

    #[test]
    fn patch_rejects_negative_size() {
        let now = Utc::now();
        let mut attachment = upload().validate(now).unwrap();
        let patch: AttachmentPatch = serde_json::from_str(r#"{"size_bytes": -5}"#).unwrap();
        assert!(patch.apply(&mut attachment, now).unwrap_err().has("size_bytes"));
        assert_eq!(attachment.size_bytes, Some(20_480));
    }
}
