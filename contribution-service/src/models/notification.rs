use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

pub const UPLOAD_SUCCESS_TITLE: &str = "Upload successful";
pub const TODAY_LABEL: &str = "Today";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "SUCCESS"),
            NotificationKind::Error => write!(f, "ERROR"),
            NotificationKind::Info => write!(f, "INFO"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(NotificationKind::Success),
            "ERROR" => Ok(NotificationKind::Error),
            "INFO" => Ok(NotificationKind::Info),
            other => Err(anyhow::anyhow!("unknown notification kind '{}'", other)),
        }
    }
}

/// A notification persisted in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub time_text: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(crate) struct NotificationRow {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub time_text: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for NotificationRecord {
    type Error = anyhow::Error;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            message: row.message,
            time_text: row.time_text,
            kind: row.kind.parse()?,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

/// A notification about to be inserted; new notifications are always unread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub time_text: String,
    pub kind: NotificationKind,
}

impl NewNotification {
    pub fn upload_succeeded(document_title: &str, document_id: &str) -> Self {
        Self {
            title: UPLOAD_SUCCESS_TITLE.to_string(),
            message: format!("Document: {} (ID: {})", document_title, document_id),
            time_text: TODAY_LABEL.to_string(),
            kind: NotificationKind::Success,
        }
    }
}
