use chrono::{DateTime, Utc};
use common::NotificationKind;
use serde::{Deserialize, Serialize};

use crate::entity::notification;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct NotificationListQuery {
    /// Only unread notifications.
    pub unread: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub related_entity_type: Option<String>,
    pub related_entity_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(m: notification::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            message: m.message,
            kind: m.kind,
            is_read: m.is_read,
            related_entity_type: m.related_entity_type,
            related_entity_id: m.related_entity_id,
            created_at: m.created_at,
            read_at: m.read_at,
        }
    }
}
