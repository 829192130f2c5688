//! Local projection of identity-directory users.

use ipledger_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub user_name: String,
    pub email: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for projecting a user into the local table.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub user_name: String,
    pub email: Option<String>,
}
