// lib/src/services/notifications.rs

use chrono::Utc;
use log::debug;

use models::{Notification, RecordId};

use crate::errors::{Result, TriageError};
use crate::storage_engine::TriageStore;

/// The user's notifications, newest first.
pub fn list_for(store: &TriageStore, user_id: RecordId, unread_only: bool) -> Result<Vec<Notification>> {
    let mut notes = store.list_where::<Notification, _>(|n| n.user_id == user_id && (!unread_only || !n.is_read()))?;
    notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(notes)
}

/// Someone else's notification is reported as missing.
pub fn mark_read(store: &TriageStore, user_id: RecordId, id: RecordId) -> Result<Notification> {
    let mut note = store
        .get::<Notification>(id)?
        .filter(|n| n.user_id == user_id)
        .ok_or_else(|| TriageError::not_found("notification", id))?;
    if note.mark_read(Utc::now()) {
        store.save(&note)?;
    }
    Ok(note)
}

/// Returns how many notifications changed.
pub fn mark_all_read(store: &TriageStore, user_id: RecordId) -> Result<usize> {
    let now = Utc::now();
    let mut changed = 0;
    for mut note in store.list_where::<Notification, _>(|n| n.user_id == user_id && !n.is_read())? {
        note.mark_read(now);
        store.save(&note)?;
        changed += 1;
    }
    debug!("Marked {} notifications read for user {}", changed, user_id);
    Ok(changed)
}
