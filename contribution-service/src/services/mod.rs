pub mod live_query;
pub mod local_db;
pub mod metadata_store;
pub mod metrics;
pub mod published;

pub use live_query::{LiveQuery, WatchQuery};
pub use local_db::{LocalDb, NotificationStore};
pub use metadata_store::{MetadataStore, MockMetadataStore, MongoMetadataStore};
pub use metrics::{get_metrics, init_metrics};
pub use published::PublishedDocuments;
