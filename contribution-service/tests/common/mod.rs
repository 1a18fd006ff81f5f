#![allow(dead_code)]

use contribution_service::config::{
    ContributionConfig, MongoConfig, ObservabilityConfig, ProfileConfig, SqliteConfig,
    UploadConfig,
};
use contribution_service::services::{MetadataStore, MockMetadataStore};
use contribution_service::startup::Application;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const POLL_ATTEMPTS: usize = 100;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub metadata: Arc<MockMetadataStore>,
    pub client: reqwest::Client,
    shutdown: CancellationToken,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

pub fn test_config() -> ContributionConfig {
    ContributionConfig {
        common: CoreConfig { port: 0 },
        mongodb: MongoConfig {
            uri: None,
            database: "stushare_test".to_string(),
            collection: "documents".to_string(),
        },
        sqlite: SqliteConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        upload: UploadConfig {
            transfer_delay_ms: 300,
            remote_timeout_secs: 5,
            author_id: "user_001".to_string(),
            event_capacity: 16,
        },
        profile: ProfileConfig {
            published_refresh_secs: 60,
        },
        observability: ObservabilityConfig {
            otlp_endpoint: None,
            log_level: "info".to_string(),
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_store(MockMetadataStore::new()).await
    }

    pub async fn spawn_with_store(store: MockMetadataStore) -> Self {
        let metadata = Arc::new(store);
        let app = Application::build_with_metadata_store(
            test_config(),
            metadata.clone() as Arc<dyn MetadataStore>,
        )
        .await
        .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let shutdown = app.shutdown_token();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            metadata,
            client,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get_json(&self, path: &str) -> Value {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Response was not JSON")
    }

    pub async fn post_upload(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/uploads"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn is_uploading(&self) -> bool {
        self.get_json("/api/uploads/status").await["is_uploading"]
            .as_bool()
            .expect("is_uploading missing")
    }

    /// Waits until no upload is in flight.
    pub async fn wait_until_idle(&self) {
        for _ in 0..POLL_ATTEMPTS {
            if !self.is_uploading().await {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        panic!("Upload still in progress after timeout");
    }

    pub async fn wait_for_unread(&self, count: i64) {
        for _ in 0..POLL_ATTEMPTS {
            if self.unread().await["count"] == count {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        panic!("Unread count never reached {}", count);
    }

    pub async fn wait_for_documents(&self, tab: &str, len: usize) -> Vec<Value> {
        for _ in 0..POLL_ATTEMPTS {
            let documents = self.profile_documents(tab).await;
            if documents.len() == len {
                return documents;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        panic!("The {} tab never held {} documents", tab, len);
    }

    pub async fn profile_documents(&self, tab: &str) -> Vec<Value> {
        self.get_json(&format!("/api/profile/documents/{}", tab)).await["documents"]
            .as_array()
            .cloned()
            .expect("documents missing")
    }

    pub async fn unread(&self) -> Value {
        self.get_json("/api/notifications/unread").await
    }
}

/// Reads server-sent event chunks until one contains `needle`.
pub async fn read_sse_until(response: &mut reqwest::Response, needle: &str) -> String {
    let mut received = String::new();
    tokio::time::timeout(Duration::from_secs(10), async {
        while !received.contains(needle) {
            match response.chunk().await.expect("Failed to read event stream") {
                Some(chunk) => received.push_str(&String::from_utf8_lossy(&chunk)),
                None => break,
            }
        }
    })
    .await
    .expect("Timed out waiting for server-sent event");
    received
}
