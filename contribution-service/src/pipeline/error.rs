use thiserror::Error;

pub const FALLBACK_ERROR_MESSAGE: &str = "An error occurred while uploading";

/// Failure of one submission step. Never leaves the pipeline; it is turned
/// into an `Error` terminal event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("{0}")]
    Transfer(String),

    #[error("{0}")]
    RemoteWrite(String),

    #[error("{0}")]
    LocalWrite(String),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("{0}")]
    Unknown(String),
}

impl SubmissionError {
    pub fn step(&self) -> &'static str {
        match self {
            SubmissionError::Transfer(_) => "transfer",
            SubmissionError::RemoteWrite(_) => "remote_write",
            SubmissionError::LocalWrite(_) => "local_write",
            SubmissionError::Cancelled => "cancelled",
            SubmissionError::Unknown(_) => "unknown",
        }
    }

    /// Message shown to the user; never empty.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}
