//! Application configuration management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Cache medium configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Durable storage provider.
    #[serde(default)]
    pub storage: StorageProvider,
}

/// Cache medium configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Directory holding not-yet-committed uploads.
    #[serde(default = "default_cache_root")]
    pub root: PathBuf,
    /// Age after which an abandoned cache entry is swept.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

fn default_cache_root() -> PathBuf {
    PathBuf::from("tmp/uploads/cache")
}

fn default_max_age_secs() -> u64 {
    86400 // 24 hours
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

/// Storage provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl Default for StorageProvider {
    fn default() -> Self {
        Self::local_fs("public")
    }
}

impl StorageProvider {
    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Provider name as it appears in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
        }
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::AzureBlob { container, .. } => container,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `STOWAGE__*` environment variables (`__` separates nested keys).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("STOWAGE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_storage_provider_s3() {
        let provider = StorageProvider::s3(
            "https://account.r2.cloudflarestorage.com",
            "attachments",
            "access_key",
            "secret_key",
            "auto",
        );
        assert_eq!(provider.name(), "s3");
        assert_eq!(provider.bucket(), "attachments");
    }

    #[test]
    fn test_storage_provider_azure() {
        let provider = StorageProvider::azure_blob("stowagedev", "access_key", "attachments");
        assert_eq!(provider.name(), "azure_blob");
        assert_eq!(provider.bucket(), "attachments");
    }

    #[test]
    fn test_storage_provider_local() {
        let provider = StorageProvider::local_fs("./storage");
        assert_eq!(provider.name(), "local");
        assert_eq!(provider.bucket(), "./storage");
    }

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.root, PathBuf::from("tmp/uploads/cache"));
        assert_eq!(config.max_age_secs, 86400);
    }

    #[rstest]
    #[case(r#"{"type":"local_fs","root":"/srv/files"}"#, StorageProvider::local_fs("/srv/files"))]
    #[case(
        r#"{"type":"azure_blob","account":"acct","access_key":"key","container":"box"}"#,
        StorageProvider::azure_blob("acct", "key", "box")
    )]
    fn test_storage_provider_tagged_source(#[case] json: &str, #[case] expected: StorageProvider) {
        let config = config::Config::builder()
            .add_source(config::File::from_str(json, config::FileFormat::Json))
            .build()
            .expect("should build");
        let provider: StorageProvider = config.try_deserialize().expect("should deserialize");
        assert_eq!(provider, expected);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("STOWAGE__CACHE__ROOT", Some("/var/cache/stowage")),
                ("STOWAGE__STORAGE__TYPE", Some("local_fs")),
                ("STOWAGE__STORAGE__ROOT", Some("/var/lib/stowage")),
            ],
            || {
                let config = AppConfig::load().expect("should load");
                assert_eq!(config.cache.root, PathBuf::from("/var/cache/stowage"));
                assert_eq!(config.cache.max_age_secs, 86400);
                assert_eq!(config.storage, StorageProvider::local_fs("/var/lib/stowage"));
            },
        );
    }
}
