use serde::Deserialize;
use service_core::config::{self as core_config, get_env, is_prod, parse_env};
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ContributionConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub sqlite: SqliteConfig,
    pub upload: UploadConfig,
    pub profile: ProfileConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    /// Unset outside production selects the in-memory metadata store.
    pub uri: Option<String>,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqliteConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub transfer_delay_ms: u64,
    pub remote_timeout_secs: u64,
    pub author_id: String,
    pub event_capacity: usize,
}

impl UploadConfig {
    pub fn transfer_delay(&self) -> Duration {
        Duration::from_millis(self.transfer_delay_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    pub published_refresh_secs: u64,
}

impl ProfileConfig {
    pub fn published_refresh(&self) -> Duration {
        Duration::from_secs(self.published_refresh_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub otlp_endpoint: Option<String>,
    pub log_level: String,
}

impl ContributionConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_prod();

        let mongodb_uri = if is_prod {
            Some(get_env("MONGODB_URI", None, is_prod)?)
        } else {
            env::var("MONGODB_URI").ok().filter(|uri| !uri.trim().is_empty())
        };

        Ok(ContributionConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: mongodb_uri,
                database: get_env("MONGODB_DATABASE", Some("stushare"), is_prod)?,
                collection: get_env("MONGODB_COLLECTION", Some("documents"), is_prod)?,
            },
            sqlite: SqliteConfig {
                url: get_env("SQLITE_URL", Some("sqlite://contribution.db?mode=rwc"), is_prod)?,
                max_connections: parse_env("SQLITE_MAX_CONNECTIONS", 5),
            },
            upload: UploadConfig {
                transfer_delay_ms: parse_env("UPLOAD_TRANSFER_DELAY_MS", 3000),
                remote_timeout_secs: parse_env("UPLOAD_REMOTE_TIMEOUT_SECS", 30),
                author_id: env::var("UPLOAD_AUTHOR_ID").unwrap_or_else(|_| "user_001".to_string()),
                event_capacity: parse_env("UPLOAD_EVENT_CAPACITY", 16),
            },
            profile: ProfileConfig {
                published_refresh_secs: parse_env("PUBLISHED_REFRESH_SECS", 10),
            },
            observability: ObservabilityConfig {
                otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|e| !e.is_empty()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_helpers_convert_units() {
        let upload = UploadConfig {
            transfer_delay_ms: 1500,
            remote_timeout_secs: 30,
            author_id: "user_001".to_string(),
            event_capacity: 16,
        };
        assert_eq!(upload.transfer_delay(), Duration::from_millis(1500));
        assert_eq!(upload.remote_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn published_refresh_is_never_zero() {
        let profile = ProfileConfig {
            published_refresh_secs: 0,
        };
        assert_eq!(profile.published_refresh(), Duration::from_secs(1));
    }
}
