//! Repository for the `users` table.

use ipledger_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

const COLUMNS: &str = "id, user_name, email, created_at, updated_at";

/// Provides access to the local user projection.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (user_name, email) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.user_name)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    /// Which of `ids` have no user row.
    pub async fn missing_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT u.id FROM UNNEST($1::BIGINT[]) AS u(id) \
             WHERE NOT EXISTS (SELECT 1 FROM users WHERE users.id = u.id) \
             ORDER BY u.id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }
}
