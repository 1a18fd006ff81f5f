//! Upload submission pipeline.
//!
//! One submission runs transfer, remote metadata write and local notification
//! write in order, then fires exactly one [`SubmissionEvent`] to the
//! subscribers attached at that moment.

mod error;
mod event;
mod submission;
mod transfer;

pub use error::{SubmissionError, FALLBACK_ERROR_MESSAGE};
pub use event::{SubmissionEvent, SubmissionOutcome, SUCCESS_MESSAGE};
pub use submission::{PipelineSettings, SubmissionHandle, SubmissionPipeline, SubmissionRequest};
pub use transfer::{SimulatedTransfer, TransferStep};
