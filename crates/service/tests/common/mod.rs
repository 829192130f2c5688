#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ipledger_core::application_number::ApplicationNumberGenerator;
use ipledger_core::asset_kind::AssetKind;
use ipledger_core::types::DbId;
use ipledger_db::models::asset::Registration;
use ipledger_db::models::user::CreateUser;
use ipledger_db::repositories::UserRepo;
use ipledger_service::assets::{create_asset, CreateAssetRequest};
use ipledger_service::config::LedgerConfig;
use ipledger_service::context::LedgerContext;
use ipledger_service::identity::{Principal, Role};
use ipledger_service::storage::{AttachmentStore, StorageError};
use sqlx::PgPool;

/// Build a test `LedgerConfig` rooted at `attachment_root`.
pub fn test_config(attachment_root: &Path) -> LedgerConfig {
    LedgerConfig {
        database_url: "postgres://unused".to_string(),
        max_connections: 5,
        country_code: "CN".to_string(),
        attachment_root: attachment_root.to_path_buf(),
        tech_scan_timeout: Duration::from_secs(5),
    }
}

/// Context with a local attachment store under `attachment_root`.
pub fn test_context(pool: PgPool, attachment_root: &Path) -> LedgerContext {
    LedgerContext::new(pool, test_config(attachment_root))
}

/// Same as [`test_context`] with a deterministic number generator.
pub fn seeded_context(pool: PgPool, attachment_root: &Path, seed: u64) -> LedgerContext {
    let mut ctx = test_context(pool, attachment_root);
    ctx.numbers = Arc::new(ApplicationNumberGenerator::with_seed(seed));
    ctx
}

/// Attachment store whose removals always fail.
pub struct FailingStore;

#[async_trait]
impl AttachmentStore for FailingStore {
    async fn remove(&self, _kind: AssetKind, _number: &str) -> Result<bool, StorageError> {
        Err(StorageError::Io(std::io::Error::other("volume offline")))
    }
}

pub async fn new_user(pool: &PgPool, name: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            user_name: name.to_string(),
            email: None,
        },
    )
    .await
    .unwrap()
    .id
}

pub fn reviewer(user_id: DbId) -> Principal {
    Principal::new(user_id, Role::Reviewer)
}

pub fn request(
    kind: AssetKind,
    sub_type: &str,
    title: &str,
    authors: &[DbId],
) -> CreateAssetRequest {
    CreateAssetRequest {
        kind,
        sub_type: sub_type.to_string(),
        title: title.to_string(),
        abstract_text: format!("Abstract of {title}"),
        author_ids: authors.to_vec(),
        first_author_id: authors[0],
        attachment_placeholder: None,
    }
}

/// Register an invention patent with `authors[0]` as first author.
pub async fn new_patent(ctx: &LedgerContext, title: &str, authors: &[DbId]) -> Registration {
    create_asset(ctx, &request(AssetKind::Patent, "invention", title, authors))
        .await
        .unwrap()
}

pub async fn row_count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*)::BIGINT FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
