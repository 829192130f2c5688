//! Fee ledger entity model and DTOs.

use chrono::NaiveDate;
use ipledger_core::error::CoreError;
use ipledger_core::fees::PaymentStatus;
use ipledger_core::status::StatusId;
use ipledger_core::types::{Cents, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `fees` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Fee {
    pub id: DbId,
    pub asset_id: DbId,
    pub fee_year: i32,
    pub amount_cents: Cents,
    pub payment_status_id: StatusId,
    pub deadline_date: NaiveDate,
    pub actual_pay_date: Option<NaiveDate>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Fee {
    pub fn payment_status(&self) -> Result<PaymentStatus, CoreError> {
        PaymentStatus::from_id(self.payment_status_id)
    }
}

/// A fee joined with the identifying fields of its asset, for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FeeListing {
    pub id: DbId,
    pub asset_id: DbId,
    pub kind_id: StatusId,
    pub application_number: String,
    pub title: String,
    pub fee_year: i32,
    pub amount_cents: Cents,
    pub payment_status_id: StatusId,
    pub deadline_date: NaiveDate,
    pub actual_pay_date: Option<NaiveDate>,
    pub created_at: Timestamp,
}

/// Insert DTO for a fee. Always created `Unpaid`.
#[derive(Debug, Clone)]
pub struct CreateFee {
    pub fee_year: i32,
    pub amount_cents: Cents,
    pub deadline_date: NaiveDate,
    pub created_at: Timestamp,
}

/// Filters for [`FeeRepo::list`](crate::repositories::FeeRepo::list).
#[derive(Debug, Clone, Default)]
pub struct FeeFilter {
    pub kind_id: Option<StatusId>,
    pub payment_status_id: Option<StatusId>,
    /// `ILIKE` pattern matched against the asset's title and application number.
    pub keyword_pattern: Option<String>,
}

/// Count and summed amount for one payment status.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentStatusGroup {
    pub payment_status_id: StatusId,
    pub count: i64,
    pub amount: Cents,
}

/// Outcome of an amount correction.
#[derive(Debug, Clone)]
pub enum AmountUpdate {
    Updated(Fee),
    /// The key matched zero or several fees; nothing was written.
    Unmatched { matches: usize },
}
