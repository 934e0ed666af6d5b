//! Notification data model.
//!
//! Mirrors the backend's notification resource. The synchronizer keeps a
//! newest-first list of these and maintains the unread count alongside it.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Category of a notification, as sent by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A customer booked a new appointment.
    NewAppointment,
    /// An appointment was cancelled.
    AppointmentCancelled,
    /// An appointment was completed.
    AppointmentCompleted,
    /// A staff member accepted an invite and joined a branch.
    NewStaffJoined,
    /// A running promotion is about to expire.
    PromotionExpiring,
    /// Platform-level announcement.
    System,
}

/// A single notification entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Backend-assigned id.
    pub id: DbId,
    /// Short headline shown in the notification panel.
    pub title: String,
    /// Optional longer body text.
    #[serde(default)]
    pub message: Option<String>,
    /// Notification category.
    pub kind: NotificationKind,
    /// Whether the current user has read this entry.
    pub is_read: bool,
    /// When the backend created the entry (UTC).
    pub created_at: Timestamp,
    /// Id of the entity the notification refers to (appointment,
    /// promotion, ...), when there is one.
    #[serde(default)]
    pub reference_id: Option<DbId>,
}
