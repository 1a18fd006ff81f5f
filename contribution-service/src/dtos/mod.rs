pub mod notifications;
pub mod profile;
pub mod uploads;

pub use notifications::{NotificationListResponse, NotificationResponse, UnreadCountResponse};
pub use profile::{DocumentListResponse, LibraryEntryRequest, ProfileDeleteResponse};
pub use uploads::{UploadAccepted, UploadRequest, UploadStatusResponse};
