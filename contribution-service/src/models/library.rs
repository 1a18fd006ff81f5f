use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DocumentItem;

/// A document the user bookmarked, as kept in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SavedDocument {
    pub document_id: String,
    pub title: String,
    pub meta_info: String,
    pub saved_at: DateTime<Utc>,
}

impl From<SavedDocument> for DocumentItem {
    fn from(saved: SavedDocument) -> Self {
        DocumentItem {
            id: saved.document_id,
            title: saved.title,
            meta: saved.meta_info,
        }
    }
}

/// Input for the saved and downloaded shelves.
#[derive(Debug, Clone)]
pub struct NewLibraryEntry {
    pub document_id: String,
    pub title: String,
    pub meta_info: String,
}
