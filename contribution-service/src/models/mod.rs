mod document;
mod library;
mod notification;

pub use document::{DocumentItem, DocumentMetadata, NewDocument};
pub use library::{NewLibraryEntry, SavedDocument};
pub use notification::{
    NewNotification, NotificationKind, NotificationRecord, TODAY_LABEL, UPLOAD_SUCCESS_TITLE,
};
pub(crate) use notification::NotificationRow;
