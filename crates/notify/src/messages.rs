//! Push channel message types and parser.
//!
//! The backend pushes JSON messages over WebSocket with the shape
//! `{"type": "<kind>", "data": {...}}`. This module deserializes them
//! into a strongly-typed [`PushEvent`] enum and encodes the client's
//! group membership invocations.

use serde::Deserialize;

use glowdesk_core::notification::Notification;
use glowdesk_core::types::DbId;

/// All server-to-client push events.
///
/// Deserialized via the internally-tagged `"type"` field with
/// associated `"data"` content.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PushEvent {
    /// A new notification was created for this business.
    #[serde(rename = "new_notification")]
    NewNotification(Notification),

    /// A peer client marked one notification read.
    #[serde(rename = "notification_read")]
    NotificationRead { id: DbId },

    /// A peer client marked every notification read.
    #[serde(rename = "all_notifications_read")]
    AllNotificationsRead,

    /// A peer client deleted one notification.
    #[serde(rename = "notification_deleted")]
    NotificationDeleted { id: DbId },

    /// A peer client cleared the whole list.
    #[serde(rename = "all_notifications_cleared")]
    AllNotificationsCleared,
}

/// Client-to-server invocations for business group membership.
#[derive(Debug, Clone)]
pub enum ClientInvocation {
    /// Announce membership in the business's notification group.
    JoinBusinessGroup { business_id: DbId },
    /// Announce departure before closing the channel.
    LeaveBusinessGroup { business_id: DbId },
}

impl ClientInvocation {
    /// Encode the invocation as a text frame payload.
    pub fn encode(&self) -> String {
        let value = match self {
            Self::JoinBusinessGroup { business_id } => serde_json::json!({
                "type": "join_business_group",
                "data": { "business_id": business_id },
            }),
            Self::LeaveBusinessGroup { business_id } => serde_json::json!({
                "type": "leave_business_group",
                "data": { "business_id": business_id },
            }),
        };
        value.to_string()
    }
}

/// Parse a push channel text frame into a typed event.
///
/// Returns `Err` for malformed JSON or unknown `type` values.
/// Callers should log unknown types and continue.
pub fn parse_event(text: &str) -> Result<PushEvent, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_new_notification_event() {
        let json = r#"{"type":"new_notification","data":{
            "id": 9,
            "title": "New appointment",
            "kind": "new_appointment",
            "is_read": false,
            "created_at": "2026-03-01T10:00:00Z"
        }}"#;
        let event = parse_event(json).unwrap();
        match event {
            PushEvent::NewNotification(n) => {
                assert_eq!(n.id, 9);
                assert!(!n.is_read);
            }
            other => panic!("Expected NewNotification, got {other:?}"),
        }
    }

    #[test]
    fn parse_notification_read_event() {
        let json = r#"{"type":"notification_read","data":{"id":5}}"#;
        let event = parse_event(json).unwrap();
        match event {
            PushEvent::NotificationRead { id } => assert_eq!(id, 5),
            other => panic!("Expected NotificationRead, got {other:?}"),
        }
    }

    #[test]
    fn parse_all_notifications_read_event() {
        let json = r#"{"type":"all_notifications_read"}"#;
        let event = parse_event(json).unwrap();
        match event {
            PushEvent::AllNotificationsRead => {}
            other => panic!("Expected AllNotificationsRead, got {other:?}"),
        }
    }

    #[test]
    fn parse_notification_deleted_event() {
        let json = r#"{"type":"notification_deleted","data":{"id":12}}"#;
        let event = parse_event(json).unwrap();
        match event {
            PushEvent::NotificationDeleted { id } => assert_eq!(id, 12),
            other => panic!("Expected NotificationDeleted, got {other:?}"),
        }
    }

    #[test]
    fn parse_all_notifications_cleared_event() {
        let json = r#"{"type":"all_notifications_cleared"}"#;
        let event = parse_event(json).unwrap();
        match event {
            PushEvent::AllNotificationsCleared => {}
            other => panic!("Expected AllNotificationsCleared, got {other:?}"),
        }
    }

    #[test]
    fn parse_unknown_type_returns_error() {
        assert!(parse_event(r#"{"type":"mystery","data":{}}"#).is_err());
    }

    #[test]
    fn parse_invalid_json_returns_error() {
        assert!(parse_event("not json at all").is_err());
    }

    #[test]
    fn encode_join_invocation() {
        let text = ClientInvocation::JoinBusinessGroup { business_id: 7 }.encode();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "join_business_group");
        assert_eq!(value["data"]["business_id"], 7);
    }

    #[test]
    fn encode_leave_invocation() {
        let text = ClientInvocation::LeaveBusinessGroup { business_id: 7 }.encode();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "leave_business_group");
        assert_eq!(value["data"]["business_id"], 7);
    }
}
