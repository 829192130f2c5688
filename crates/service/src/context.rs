use std::sync::Arc;

use ipledger_core::application_number::ApplicationNumberGenerator;
use ipledger_db::DbPool;

use crate::config::LedgerConfig;
use crate::storage::{AttachmentStore, LocalAttachmentStore};

/// Shared state handed to every ledger operation.
///
/// Cheap to clone: the pool is reference-counted internally and everything
/// else sits behind an `Arc`.
#[derive(Clone)]
pub struct LedgerContext {
    pub pool: DbPool,
    pub config: Arc<LedgerConfig>,
    pub numbers: Arc<ApplicationNumberGenerator>,
    pub attachments: Arc<dyn AttachmentStore>,
}

impl LedgerContext {
    /// Build a context with a local attachment store rooted at
    /// `config.attachment_root`.
    pub fn new(pool: DbPool, config: LedgerConfig) -> Self {
        let store = LocalAttachmentStore::new(config.attachment_root.clone());
        Self::with_store(pool, config, Arc::new(store))
    }

    pub fn with_store(
        pool: DbPool,
        config: LedgerConfig,
        attachments: Arc<dyn AttachmentStore>,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            numbers: Arc::new(ApplicationNumberGenerator::new()),
            attachments,
        }
    }
}
