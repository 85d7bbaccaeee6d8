// lib/src/services/integrity.rs
//
// Foreign key and uniqueness checks. Missing targets become field errors so
// they are reported together with the payload's own violations.

use log::debug;

use models::errors::{FieldErrors, ValidationError};
use models::{Permission, RecordId, User};

use crate::errors::{Result, TriageError};
use crate::storage_engine::{Record, TriageStore};

/// Loads the referenced record, recording `Missing` on `field` when absent.
pub fn require<R: Record>(
    store: &TriageStore,
    errors: &mut FieldErrors,
    field: &str,
    id: Option<RecordId>,
) -> Result<Option<R>> {
    let Some(id) = id else {
        return Ok(None);
    };
    let found = store.get::<R>(id)?;
    if found.is_none() {
        errors.add(field, ValidationError::Missing);
    }
    Ok(found)
}

/// Like `require`, and the user must hold the specialist permission.
pub fn require_specialist(
    store: &TriageStore,
    errors: &mut FieldErrors,
    field: &str,
    id: Option<RecordId>,
) -> Result<Option<User>> {
    match require::<User>(store, errors, field, id)? {
        Some(user) if user.permission == Permission::Specialist => Ok(Some(user)),
        Some(_) => {
            errors.add(field, ValidationError::Invalid("must refer to a specialist".into()));
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Records `Taken` on `field` when another record (not `except`) matches.
pub fn ensure_unique<R, F>(
    store: &TriageStore,
    errors: &mut FieldErrors,
    field: &str,
    except: Option<RecordId>,
    matches: F,
) -> Result<()>
where
    R: Record,
    F: Fn(&R) -> bool,
{
    if store.any::<R, _>(|record| Some(record.id()) != except && matches(record))? {
        errors.add(field, ValidationError::Taken);
    }
    Ok(())
}

/// Refuses a delete while any listed relation still points at the row.
pub fn restrict_delete(entity: &'static str, id: RecordId, references: &[(&'static str, bool)]) -> Result<()> {
    let holders: Vec<&str> = references
        .iter()
        .filter(|(_, referenced)| *referenced)
        .map(|(name, _)| *name)
        .collect();
    if holders.is_empty() {
        return Ok(());
    }
    debug!("Refusing to delete {} {}: referenced by {:?}", entity, id, holders);
    Err(TriageError::Conflict(format!(
        "Cannot delete {} {}: it is still referenced by {}.",
        entity,
        id,
        holders.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures;
    use models::{Department, Patient};

    #[test]
    fn should_flag_missing_reference() {
        let store = TriageStore::temporary().unwrap();
        let patient = fixtures::patient(&store, "Anna");
        let mut errors = FieldErrors::new();
        assert!(require::<Patient>(&store, &mut errors, "patient_id", Some(patient.id)).unwrap().is_some());
        assert!(require::<Patient>(&store, &mut errors, "patient_id", None).unwrap().is_none());
        assert!(errors.is_empty());
        assert!(require::<Patient>(&store, &mut errors, "patient_id", Some(999)).unwrap().is_none());
        assert!(errors.has("patient_id"));
    }

    #[test]
    fn should_require_specialist_permission() {
        let store = TriageStore::temporary().unwrap();
        let dept = fixtures::department(&store, "Cardiology");
        let nurse = fixtures::user(&store, "ps1@h.example", Permission::PsOperator, None);
        let doc = fixtures::user(&store, "doc1@h.example", Permission::Specialist, Some(dept.id));

        let mut errors = FieldErrors::new();
        assert!(require_specialist(&store, &mut errors, "specialist_id", Some(doc.id)).unwrap().is_some());
        assert!(require_specialist(&store, &mut errors, "specialist_id", Some(nurse.id)).unwrap().is_none());
        assert!(errors.has("specialist_id"));
    }

    #[test]
    fn should_detect_duplicates_except_self() {
        let store = TriageStore::temporary().unwrap();
        let dept = fixtures::department(&store, "Radiology");
        let mut errors = FieldErrors::new();
        ensure_unique::<Department, _>(&store, &mut errors, "name", Some(dept.id), |d| d.name == "Radiology").unwrap();
        assert!(errors.is_empty());
        ensure_unique::<Department, _>(&store, &mut errors, "name", None, |d| d.name == "Radiology").unwrap();
        assert!(errors.has("name"));
    }

    #[test]
    fn restrict_names_referencing_relations() {
        assert!(restrict_delete("patient", 1, &[("emergencies", false)]).is_ok());
        match restrict_delete("patient", 1, &[("emergencies", true), ("specialist visits", true)]) {
            Err(TriageError::Conflict(message)) => {
                assert!(message.contains("emergencies, specialist visits"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
