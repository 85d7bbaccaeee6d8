// models/src/medical/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::identifiers::RecordId;
use crate::medical::emergency::Emergency;
use crate::medical::patient::Patient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SpecialistCalled,
    SpecialistReminder,
}

/// In-app message for one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    pub user_id: RecordId,
    pub kind: NotificationKind,
    pub emergency_id: RecordId,
    pub data: Value,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Builds the message sent to the specialist for an emergency.
    pub fn for_specialist(
        kind: NotificationKind,
        specialist_id: RecordId,
        emergency: &Emergency,
        patient: Option<&Patient>,
        now: DateTime<Utc>,
    ) -> Self {
        let message = match kind {
            NotificationKind::SpecialistCalled => {
                format!("You have been called for emergency #{}", emergency.id)
            }
            NotificationKind::SpecialistReminder => {
                format!("Reminder: emergency #{} is waiting for you", emergency.id)
            }
        };
        Notification {
            id: 0,
            user_id: specialist_id,
            kind,
            emergency_id: emergency.id,
            data: json!({
                "message": message,
                "patient": patient.map(Patient::full_name),
                "alert_code": emergency.alert_code,
            }),
            read_at: None,
            created_at: now,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Returns whether the notification was unread.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.read_at.is_some() {
            return false;
        }
        self.read_at = Some(now);
        true
    }
}
