//! Aggregate rows read by the statistics queries.

use ipledger_core::status::StatusId;
use serde::Serialize;
use sqlx::FromRow;

/// Applicant name with the number of assets they first-authored.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct TopApplicant {
    pub applicant: String,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct YearCount {
    pub year: i32,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TypeCount {
    pub type_code: StatusId,
    pub count: i64,
}
