//! Asset/author association rows.

use ipledger_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `asset_authors` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssetAuthor {
    pub asset_id: DbId,
    pub user_id: DbId,
    pub is_first_author: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
