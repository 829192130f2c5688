//! Attachment storage collaborator.
//!
//! The ledger never reads attachment contents. It needs two things from the
//! store: the relative directory an asset's files live under (written back
//! into `assets.attachment_url`) and best-effort removal of that directory
//! when the asset is deleted.

use std::path::PathBuf;

use async_trait::async_trait;
use ipledger_core::application_number;
use ipledger_core::asset_kind::AssetKind;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid attachment key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-asset attachment directories keyed by kind and application number.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Relative directory for one asset, e.g. `patent/CN202410000042X`.
    ///
    /// The application number must be well-formed; this keeps arbitrary
    /// strings from reaching the filesystem.
    fn base_path(&self, kind: AssetKind, application_number: &str) -> Result<String, StorageError> {
        application_number::validate(application_number)
            .map_err(|e| StorageError::InvalidKey(e.to_string()))?;
        Ok(format!("{}/{application_number}", kind.storage_prefix()))
    }

    /// Remove everything stored for one asset.
    ///
    /// Returns `true` if something was removed, `false` if nothing existed.
    async fn remove(&self, kind: AssetKind, application_number: &str) -> Result<bool, StorageError>;
}

/// Attachment store backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct LocalAttachmentStore {
    root: PathBuf,
}

impl LocalAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute directory for one asset.
    pub fn asset_dir(&self, kind: AssetKind, application_number: &str) -> Result<PathBuf, StorageError> {
        Ok(self.root.join(self.base_path(kind, application_number)?))
    }
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    async fn remove(&self, kind: AssetKind, application_number: &str) -> Result<bool, StorageError> {
        let dir = self.asset_dir(kind, application_number)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(path = %dir.display(), "Attachment directory removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
