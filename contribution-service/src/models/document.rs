use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Document metadata as stored remotely. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub author_id: String,
    /// Epoch milliseconds.
    pub upload_time: i64,
}

/// Fields written to the remote store for a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub title: String,
    pub description: Option<String>,
    pub author_id: String,
    pub upload_time: i64,
}

impl NewDocument {
    pub fn new(title: String, description: Option<String>, author_id: String) -> Self {
        Self {
            title,
            description,
            author_id,
            upload_time: Utc::now().timestamp_millis(),
        }
    }

    pub fn into_metadata(self, id: String) -> DocumentMetadata {
        DocumentMetadata {
            id,
            title: self.title,
            description: self.description,
            author_id: self.author_id,
            upload_time: self.upload_time,
        }
    }
}

/// Row shape shared by the three profile lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DocumentItem {
    pub id: String,
    pub title: String,
    pub meta: String,
}

impl DocumentItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, meta: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            meta: meta.into(),
        }
    }
}

impl From<&DocumentMetadata> for DocumentItem {
    fn from(doc: &DocumentMetadata) -> Self {
        let date = Utc
            .timestamp_millis_opt(doc.upload_time)
            .single()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        let meta = match doc.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => format!("{} · {}", description, date),
            _ => date,
        };

        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(description: Option<&str>) -> DocumentMetadata {
        DocumentMetadata {
            id: "doc_1".to_string(),
            title: "Algorithms Notes".to_string(),
            description: description.map(str::to_string),
            author_id: "user_001".to_string(),
            // 2024-03-05T00:00:00Z
            upload_time: 1_709_596_800_000,
        }
    }

    #[test]
    fn item_meta_includes_description_and_date() {
        let item = DocumentItem::from(&metadata(Some("Chapter 3 review")));
        assert_eq!(item.id, "doc_1");
        assert_eq!(item.title, "Algorithms Notes");
        assert_eq!(item.meta, "Chapter 3 review · 2024-03-05");
    }

    #[test]
    fn item_meta_without_description_is_date_only() {
        assert_eq!(DocumentItem::from(&metadata(None)).meta, "2024-03-05");
        assert_eq!(DocumentItem::from(&metadata(Some("  "))).meta, "2024-03-05");
    }

    #[test]
    fn new_document_stamps_upload_time() {
        let before = Utc::now().timestamp_millis();
        let doc = NewDocument::new("t".into(), None, "user_001".into());
        assert!(doc.upload_time >= before);
        let meta = doc.into_metadata("doc_9".into());
        assert_eq!(meta.id, "doc_9");
    }
}
