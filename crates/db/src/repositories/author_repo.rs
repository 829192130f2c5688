//! Repository for the `asset_authors` table.

use ipledger_core::types::DbId;
use sqlx::PgPool;

use crate::models::author::AssetAuthor;

/// Column list shared with the registration transaction.
pub(crate) const AUTHOR_COLUMNS: &str = "asset_id, user_id, is_first_author, created_at, updated_at";

/// Read access to asset/author links. Links are written only by
/// [`AssetRepo::register`](crate::repositories::AssetRepo::register).
pub struct AuthorRepo;

impl AuthorRepo {
    /// Authors of an asset, first author first.
    pub async fn list_for_asset(
        pool: &PgPool,
        asset_id: DbId,
    ) -> Result<Vec<AssetAuthor>, sqlx::Error> {
        let query = format!(
            "SELECT {AUTHOR_COLUMNS} FROM asset_authors \
             WHERE asset_id = $1 \
             ORDER BY is_first_author DESC, user_id"
        );
        sqlx::query_as::<_, AssetAuthor>(&query)
            .bind(asset_id)
            .fetch_all(pool)
            .await
    }
}
