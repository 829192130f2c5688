use ipledger_core::types::DbId;
use serde::{Deserialize, Serialize};

/// Role of the acting user, as asserted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Reviewer,
    Admin,
}

/// The authenticated caller of an operation.
///
/// Identity is resolved upstream; the ledger records `user_id` on the rows it
/// writes and carries `role` into its logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: DbId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self { user_id, role }
    }
}
