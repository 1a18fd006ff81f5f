use crate::models::{NotificationKind, NotificationRecord};
use crate::observers::UnreadBadge;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub time_text: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: String,
}

impl From<NotificationRecord> for NotificationResponse {
    fn from(record: NotificationRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            message: record.message,
            time_text: record.time_text,
            kind: record.kind,
            is_read: record.is_read,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub count: i64,
    pub badge: Option<String>,
}

impl From<i64> for UnreadCountResponse {
    fn from(count: i64) -> Self {
        Self {
            count,
            badge: UnreadBadge::from_count(count).label(),
        }
    }
}
