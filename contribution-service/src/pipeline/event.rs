use serde::Serialize;
use uuid::Uuid;

pub const SUCCESS_MESSAGE: &str = "Upload and metadata saved successfully!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmissionOutcome {
    Success { message: String },
    Error { message: String },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            SubmissionOutcome::Success { message } | SubmissionOutcome::Error { message } => {
                message
            }
        }
    }
}

/// The single terminal signal of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionEvent {
    pub submission_id: Uuid,
    #[serde(flatten)]
    pub outcome: SubmissionOutcome,
}
