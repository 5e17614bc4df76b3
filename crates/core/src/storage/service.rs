//! Object storage backend using Apache OpenDAL.

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use serde::{Deserialize, Serialize};
use stowage_shared::StorageProvider;
use tracing::{debug, info, instrument};

use super::backend::{StorageBackend, StoredFile};
use super::error::StorageError;
use crate::file::{FileHandle, FileLocation};

/// Metadata persisted next to every stored file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    content_type: Option<String>,
    original_filename: String,
    size: u64,
}

/// Storage backend over any OpenDAL service.
///
/// Files live at `<store_dir>/<identifier>` with a JSON manifest at
/// `<store_dir>/<identifier>.meta.json`. Identifiers are the cache
/// identifiers the files were committed from, so they are unique per upload.
///
/// `remove` treats an entry that is already absent as success on every
/// provider: OpenDAL deletes are idempotent and neither S3 nor Azure report
/// a missing object on delete.
pub struct ObjectStorage {
    operator: Operator,
    provider: StorageProvider,
    store_dir: String,
}

impl ObjectStorage {
    /// Create a backend for `provider`, keeping files under `store_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_provider(
        provider: StorageProvider,
        store_dir: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&provider)?;
        let store_dir = store_dir.into().trim_matches('/').to_string();
        Ok(Self {
            operator,
            provider,
            store_dir,
        })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
        }
    }

    /// Map an identifier to its object key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] for identifiers that are absolute,
    /// contain empty, `.` or `..` segments, or use backslashes.
    pub fn key_for(&self, identifier: &str) -> Result<String, StorageError> {
        let valid = !identifier.is_empty()
            && !identifier.contains('\\')
            && identifier
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if !valid {
            return Err(StorageError::invalid_key(identifier));
        }

        if self.store_dir.is_empty() {
            Ok(identifier.to_string())
        } else {
            Ok(format!("{}/{identifier}", self.store_dir))
        }
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.provider.bucket()
    }

    /// Key prefix under which files are stored.
    #[must_use]
    pub fn store_dir(&self) -> &str {
        &self.store_dir
    }

    async fn read_manifest(&self, identifier: &str, key: &str) -> Result<Manifest, StorageError> {
        let manifest_key = manifest_key(key);
        let buffer = self
            .operator
            .read(&manifest_key)
            .await
            .map_err(|e| classify(e, identifier))?;

        serde_json::from_slice(&buffer.to_vec()).map_err(|e| StorageError::Manifest {
            key: manifest_key,
            reason: e.to_string(),
        })
    }
}

impl StorageBackend for ObjectStorage {
    #[instrument(skip(self, file), fields(provider = self.provider.name()))]
    async fn store(&self, file: &FileHandle) -> Result<StoredFile, StorageError> {
        let FileLocation::Cached { id, path } = &file.location else {
            return Err(StorageError::operation(
                "only files in the cache medium can be stored",
            ));
        };

        let identifier = id.to_string();
        let key = self.key_for(&identifier)?;
        let data = tokio::fs::read(path).await?;
        let size = data.len() as u64;

        self.operator.write(&key, data).await?;

        let manifest = Manifest {
            content_type: file.content_type.clone(),
            original_filename: file.original_filename.clone(),
            size,
        };
        let encoded = serde_json::to_vec(&manifest).map_err(|e| StorageError::Manifest {
            key: manifest_key(&key),
            reason: e.to_string(),
        })?;
        // Manifest goes last: its presence marks a complete commit.
        self.operator.write(&manifest_key(&key), encoded).await?;

        debug!(%key, size, "file stored");

        Ok(StoredFile {
            identifier,
            content_type: manifest.content_type,
            original_filename: manifest.original_filename,
            size,
        })
    }

    #[instrument(skip(self), fields(provider = self.provider.name()))]
    async fn retrieve(&self, identifier: &str) -> Result<FileHandle, StorageError> {
        let key = self.key_for(identifier)?;
        let manifest = self.read_manifest(identifier, &key).await?;

        Ok(FileHandle {
            location: FileLocation::Stored {
                identifier: identifier.to_string(),
            },
            content_type: manifest.content_type,
            original_filename: manifest.original_filename,
            size: Some(manifest.size),
        })
    }

    #[instrument(skip(self), fields(provider = self.provider.name()))]
    async fn remove(&self, identifier: &str) -> Result<(), StorageError> {
        let key = self.key_for(identifier)?;

        // Manifest first so an interrupted remove never leaves a retrievable entry.
        self.operator.delete(&manifest_key(&key)).await?;
        self.operator.delete(&key).await?;

        info!(%key, "file removed");
        Ok(())
    }

    async fn read(&self, identifier: &str) -> Result<Bytes, StorageError> {
        let key = self.key_for(identifier)?;
        let buffer = self
            .operator
            .read(&key)
            .await
            .map_err(|e| classify(e, identifier))?;
        Ok(buffer.to_bytes())
    }

    fn name(&self) -> &'static str {
        self.provider.name()
    }
}

fn manifest_key(key: &str) -> String {
    format!("{key}.meta.json")
}

fn classify(err: opendal::Error, identifier: &str) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::not_found(identifier)
    } else {
        StorageError::from(err)
    }
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
