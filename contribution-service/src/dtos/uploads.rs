use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadAccepted {
    pub submission_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadStatusResponse {
    pub is_uploading: bool,
}
