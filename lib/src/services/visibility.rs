// lib/src/services/visibility.rs
//
// Row visibility per role. Admins and PS operators see everything; 118
// operators see what they opened; specialists see what was addressed to them
// or to their department. Anything else answers as not found.

use std::collections::HashSet;

use models::{
    Attachment, AttachmentOwner, Emergency, InvestigationPerformed, Permission, RecordId,
    SpecialistInvestigation, SpecialistInvestigationRequest, SpecialistVisit,
};

use crate::errors::{Result, TriageError};
use crate::services::Actor;
use crate::storage_engine::{Record, TriageStore};

/// Emergencies with a visit or request addressed to `department_id`.
pub fn department_emergencies(store: &TriageStore, department_id: RecordId) -> Result<HashSet<RecordId>> {
    let mut ids: HashSet<RecordId> = store
        .list_where::<SpecialistVisit, _>(|v| v.department_id == department_id)?
        .into_iter()
        .map(|v| v.emergency_id)
        .collect();
    let items: HashSet<RecordId> = store
        .list_where::<SpecialistInvestigation, _>(|i| i.department_id == department_id)?
        .into_iter()
        .map(|i| i.id)
        .collect();
    if !items.is_empty() {
        ids.extend(
            store
                .list_where::<SpecialistInvestigationRequest, _>(|r| {
                    items.contains(&r.specialist_investigation_id)
                })?
                .into_iter()
                .map(|r| r.emergency_id),
        );
    }
    Ok(ids)
}

/// Precomputed view of what one actor may read.
pub struct Visibility<'a> {
    store: &'a TriageStore,
    actor: Actor,
    department_emergencies: HashSet<RecordId>,
}

impl<'a> Visibility<'a> {
    pub fn new(store: &'a TriageStore, actor: Actor) -> Result<Self> {
        let department_emergencies = match (actor.permission, actor.department_id) {
            (Permission::Specialist, Some(department_id)) => department_emergencies(store, department_id)?,
            _ => HashSet::new(),
        };
        Ok(Visibility { store, actor, department_emergencies })
    }

    pub fn actor(&self) -> Actor {
        self.actor
    }

    pub fn emergency(&self, emergency: &Emergency) -> bool {
        if self.actor.sees_everything() {
            return true;
        }
        match self.actor.permission {
            Permission::Operator118 => emergency.user_id == self.actor.id,
            Permission::Specialist => {
                emergency.specialist_id == Some(self.actor.id)
                    || self.department_emergencies.contains(&emergency.id)
            }
            Permission::Admin | Permission::PsOperator => true,
        }
    }

    fn emergency_id(&self, emergency_id: RecordId) -> Result<bool> {
        if self.actor.sees_everything() {
            return Ok(true);
        }
        Ok(self
            .store
            .get::<Emergency>(emergency_id)?
            .map(|e| self.emergency(&e))
            .unwrap_or(false))
    }

    pub fn visit(&self, visit: &SpecialistVisit) -> Result<bool> {
        match self.actor.permission {
            Permission::Specialist => Ok(self.actor.department_id == Some(visit.department_id)),
            _ => self.emergency_id(visit.emergency_id),
        }
    }

    pub fn request(&self, request: &SpecialistInvestigationRequest) -> Result<bool> {
        match self.actor.permission {
            Permission::Specialist => {
                let department = self
                    .store
                    .get::<SpecialistInvestigation>(request.specialist_investigation_id)?
                    .map(|item| item.department_id);
                Ok(department.is_some() && department == self.actor.department_id)
            }
            _ => self.emergency_id(request.emergency_id),
        }
    }

    pub fn performed(&self, performed: &InvestigationPerformed) -> Result<bool> {
        self.emergency_id(performed.emergency_id)
    }

    pub fn attachment(&self, attachment: &Attachment) -> Result<bool> {
        match attachment.owner() {
            Some(AttachmentOwner::InvestigationPerformed(id)) => match self.store.get::<InvestigationPerformed>(id)? {
                Some(performed) => self.performed(&performed),
                None => Ok(self.actor.sees_everything()),
            },
            Some(AttachmentOwner::SpecialistVisit(id)) => match self.store.get::<SpecialistVisit>(id)? {
                Some(visit) => self.visit(&visit),
                None => Ok(self.actor.sees_everything()),
            },
            None => Ok(self.actor.sees_everything()),
        }
    }
}

/// Fetches a record the actor may see; hidden rows are `NotFound`.
pub fn fetch_visible<R, F>(store: &TriageStore, id: RecordId, visible: F) -> Result<R>
where
    R: Record,
    F: FnOnce(&R) -> Result<bool>,
{
    let record = store.fetch::<R>(id)?;
    if visible(&record)? {
        Ok(record)
    } else {
        Err(TriageError::not_found(R::ENTITY, id))
    }
}
