// lib/src/services/investigations.rs
//
// Investigations performed during an emergency and the attachments filed
// against them or against specialist visits.

use chrono::Utc;
use log::info;

use models::errors::{FieldErrors, ValidationError};
use models::medical::{AttachmentPatch, InvestigationPerformedPatch, NewAttachment, NewInvestigationPerformed};
use models::{
    Attachment, AttachmentOwner, Emergency, Investigation, InvestigationPerformed, RecordId,
    SpecialistVisit, User,
};

use crate::errors::Result;
use crate::services::catalog::split;
use crate::services::integrity;
use crate::services::visibility::{fetch_visible, Visibility};
use crate::services::Actor;
use crate::storage_engine::TriageStore;

pub fn list_performed(store: &TriageStore, actor: Actor) -> Result<Vec<InvestigationPerformed>> {
    let view = Visibility::new(store, actor)?;
    let mut visible = Vec::new();
    for performed in store.list::<InvestigationPerformed>()? {
        if view.performed(&performed)? {
            visible.push(performed);
        }
    }
    Ok(visible)
}

pub fn get_performed(store: &TriageStore, actor: Actor, id: RecordId) -> Result<InvestigationPerformed> {
    let view = Visibility::new(store, actor)?;
    fetch_visible::<InvestigationPerformed, _>(store, id, |p| view.performed(p))
}

pub fn record_performed(
    store: &TriageStore,
    actor: Actor,
    new_performed: NewInvestigationPerformed,
) -> Result<InvestigationPerformed> {
    let view = Visibility::new(store, actor)?;
    let (emergency_id, investigation_id, performed_by) = (
        new_performed.emergency_id,
        new_performed.investigation_id,
        new_performed.performed_by,
    );
    let (performed, mut errors) = split(new_performed.validate(actor.id, Utc::now()));
    if let Some(emergency) = integrity::require::<Emergency>(store, &mut errors, "emergency_id", emergency_id)? {
        if !view.emergency(&emergency) {
            errors.add("emergency_id", ValidationError::Missing);
        }
    }
    integrity::require::<Investigation>(store, &mut errors, "investigation_id", investigation_id)?;
    integrity::require::<User>(store, &mut errors, "performed_by", performed_by)?;
    errors.into_result()?;
    let Some(performed) = performed else {
        return Err(FieldErrors::new().into());
    };

    let performed = store.insert(performed)?;
    info!(
        "Recorded investigation {} on emergency {}",
        performed.investigation_id, performed.emergency_id
    );
    Ok(performed)
}

pub fn update_performed(
    store: &TriageStore,
    actor: Actor,
    id: RecordId,
    patch: InvestigationPerformedPatch,
) -> Result<InvestigationPerformed> {
    let mut performed = get_performed(store, actor, id)?;
    patch.apply(&mut performed, Utc::now())?;
    store.save(&performed)?;
    Ok(performed)
}

pub fn delete_performed(store: &TriageStore, actor: Actor, id: RecordId) -> Result<()> {
    get_performed(store, actor, id)?;
    integrity::restrict_delete(
        "investigation performed",
        id,
        &[(
            "attachments",
            store.any::<Attachment, _>(|a| a.investigation_performed_id == Some(id))?,
        )],
    )?;
    store.remove::<InvestigationPerformed>(id)?;
    Ok(())
}

/// Checks the owner row exists and is visible to the actor.
fn check_owner(store: &TriageStore, view: &Visibility<'_>, attachment: &Attachment) -> Result<()> {
    let mut errors = FieldErrors::new();
    match attachment.owner() {
        Some(AttachmentOwner::InvestigationPerformed(id)) => {
            let owner = integrity::require::<InvestigationPerformed>(
                store,
                &mut errors,
                "investigation_performed_id",
                Some(id),
            )?;
            if let Some(owner) = owner {
                if !view.performed(&owner)? {
                    errors.add("investigation_performed_id", ValidationError::Missing);
                }
            }
        }
        Some(AttachmentOwner::SpecialistVisit(id)) => {
            let owner = integrity::require::<SpecialistVisit>(store, &mut errors, "specialist_visit_id", Some(id))?;
            if let Some(owner) = owner {
                if !view.visit(&owner)? {
                    errors.add("specialist_visit_id", ValidationError::Missing);
                }
            }
        }
        None => errors.add(
            "investigation_performed_id",
            ValidationError::Invalid("or specialist visit id must be given".into()),
        ),
    }
    Ok(errors.into_result()?)
}

pub fn list_attachments(store: &TriageStore, actor: Actor) -> Result<Vec<Attachment>> {
    let view = Visibility::new(store, actor)?;
    let mut visible = Vec::new();
    for attachment in store.list::<Attachment>()? {
        if view.attachment(&attachment)? {
            visible.push(attachment);
        }
    }
    Ok(visible)
}

pub fn get_attachment(store: &TriageStore, actor: Actor, id: RecordId) -> Result<Attachment> {
    let view = Visibility::new(store, actor)?;
    fetch_visible::<Attachment, _>(store, id, |a| view.attachment(a))
}

pub fn create_attachment(store: &TriageStore, actor: Actor, new_attachment: NewAttachment) -> Result<Attachment> {
    let view = Visibility::new(store, actor)?;
    let attachment = new_attachment.validate(Utc::now())?;
    check_owner(store, &view, &attachment)?;
    let attachment = store.insert(attachment)?;
    info!("Filed attachment {} ({})", attachment.id, attachment.original_name);
    Ok(attachment)
}

pub fn update_attachment(
    store: &TriageStore,
    actor: Actor,
    id: RecordId,
    patch: AttachmentPatch,
) -> Result<Attachment> {
    let view = Visibility::new(store, actor)?;
    let mut attachment = fetch_visible::<Attachment, _>(store, id, |a| view.attachment(a))?;
    patch.apply(&mut attachment, Utc::now())?;
    check_owner(store, &view, &attachment)?;
    store.save(&attachment)?;
    Ok(attachment)
}

pub fn delete_attachment(store: &TriageStore, actor: Actor, id: RecordId) -> Result<()> {
    get_attachment(store, actor, id)?;
    store.remove::<Attachment>(id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TriageError;
    use crate::services::{catalog, emergencies, fixtures};
    use models::medical::{NewEmergency, NewInvestigation};
    use models::Permission;

    struct Setup {
        store: TriageStore,
        ps: Actor,
        emergency: Emergency,
        investigation: Investigation,
    }

    fn setup() -> Setup {
        let store = TriageStore::temporary().unwrap();
        let ps = fixtures::actor(&fixtures::user(&store, "ps1@h.example", Permission::PsOperator, None));
        let patient = fixtures::patient(&store, "Giorgio");
        let emergency = emergencies::create_emergency(
            &store,
            ps,
            NewEmergency {
                description: Some("Wrist pain after fall".into()),
                patient_id: Some(patient.id),
                ..Default::default()
            },
        )
        .unwrap();
        let investigation = catalog::create_investigation(
            &store,
            NewInvestigation { name: Some("X-ray".into()), category: Some("imaging".into()), description: None },
        )
        .unwrap();
        Setup { store, ps, emergency, investigation }
    }

    fn performed(s: &Setup) -> InvestigationPerformed {
        record_performed(
            &s.store,
            s.ps,
            NewInvestigationPerformed {
                emergency_id: Some(s.emergency.id),
                investigation_id: Some(s.investigation.id),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn should_record_and_protect_referenced_rows() {
        let s = setup();
        let performed = performed(&s);
        assert_eq!(performed.performed_by, s.ps.id);
        assert!(matches!(
            catalog::delete_investigation(&s.store, s.investigation.id),
            Err(TriageError::Conflict(_))
        ));
        assert!(matches!(
            emergencies::delete_emergency(&s.store, s.ps, s.emergency.id),
            Err(TriageError::Conflict(_))
        ));
    }

    #[test]
    fn attachment_needs_existing_owner() {
        let s = setup();
        let result = create_attachment(
            &s.store,
            s.ps,
            NewAttachment {
                investigation_performed_id: Some(4321),
                path: Some("files/x.png".into()),
                original_name: Some("x.png".into()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(TriageError::Validation(e)) if e.has("investigation_performed_id")));
    }

    #[test]
    fn attachment_size_must_not_be_negative() {
        let s = setup();
        let performed = performed(&s);
        let result = create_attachment(
            &s.store,
            s.ps,
            NewAttachment {
                investigation_performed_id: Some(performed.id),
                path: Some("files/x.png".into()),
                original_name: Some("x.png".into()),
                size_bytes: Some(-10),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(TriageError::Validation(e)) if e.has("size_bytes")));
    }

    #[test]
    fn attachment_blocks_deleting_its_owner() {
        let s = setup();
        let performed = performed(&s);
        let attachment = create_attachment(
            &s.store,
            s.ps,
            NewAttachment {
                investigation_performed_id: Some(performed.id),
                path: Some("files/xray.png".into()),
                original_name: Some("xray.png".into()),
                mime_type: Some("image/png".into()),
                size_bytes: Some(1024),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(matches!(
            delete_performed(&s.store, s.ps, performed.id),
            Err(TriageError::Conflict(_))
        ));
        delete_attachment(&s.store, s.ps, attachment.id).unwrap();
        delete_performed(&s.store, s.ps, performed.id).unwrap();
    }
}
