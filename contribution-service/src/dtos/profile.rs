use crate::models::{DocumentItem, NewLibraryEntry};
use crate::observers::ProfileTab;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub tab: ProfileTab,
    pub documents: Vec<DocumentItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileDeleteResponse {
    pub deleted: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LibraryEntryRequest {
    #[validate(length(min = 1, message = "Document id cannot be empty"))]
    pub document_id: String,
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: String,
    #[serde(default)]
    pub meta_info: String,
}

impl From<LibraryEntryRequest> for NewLibraryEntry {
    fn from(req: LibraryEntryRequest) -> Self {
        Self {
            document_id: req.document_id,
            title: req.title,
            meta_info: req.meta_info,
        }
    }
}
