pub mod health;
pub mod notifications;
pub mod profile;
pub mod uploads;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use notifications::{
    delete_notification, list_notifications, mark_all_read, mark_read, unread_count,
};
pub use profile::{add_to_shelf, delete_document, list_documents};
pub use uploads::{submit_upload, upload_events, upload_status};
