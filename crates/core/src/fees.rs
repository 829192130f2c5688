//! Fee ledger rules: payment statuses, deadlines, the amount-correction
//! allow-list, and the monthly bucket summary.

use chrono::{Datelike, Months, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::status::define_status_enum;
use crate::types::{Cents, Timestamp};

define_status_enum! {
    /// Settlement state of a fee record. Only the payment collaborator moves
    /// a record out of `Unpaid`.
    PaymentStatus ("payment_statuses") {
        Unpaid = 1 => "unpaid",
        Paid = 2 => "paid",
        Overdue = 3 => "overdue",
    }
}

/* --------------------------------------------------------------------------
Update allow-list
-------------------------------------------------------------------------- */

/// The amount field, the only one an administrative correction may touch.
pub const FIELD_AMOUNT: &str = "amount";

/// Fields owned by the payment collaborator or fixed at creation.
pub const PROTECTED_FIELDS: &[&str] = &["payment_status", "deadline_date", "actual_pay_date"];

/// Extract the corrected amount (in cents) from an update field map.
///
/// Every key other than `amount` is refused with [`CoreError::ForbiddenField`],
/// including unknown keys. Accepts camelCase spellings of the protected
/// fields so they are reported by their canonical name.
pub fn parse_amount_update(fields: &Map<String, Value>) -> Result<Cents, CoreError> {
    for key in fields.keys() {
        if key != FIELD_AMOUNT {
            let canonical = canonical_field(key);
            return Err(CoreError::ForbiddenField(canonical));
        }
    }

    let value = fields.get(FIELD_AMOUNT).ok_or_else(|| {
        CoreError::Validation("Update must include an 'amount' field".to_string())
    })?;

    let amount = value.as_i64().ok_or_else(|| {
        CoreError::Validation(format!(
            "Amount must be an integer number of cents, got {value}"
        ))
    })?;
    validate_amount(amount)?;
    Ok(amount)
}

fn canonical_field(key: &str) -> String {
    let snake = match key {
        "paymentStatus" => "payment_status",
        "deadlineDate" => "deadline_date",
        "actualPayDate" => "actual_pay_date",
        other => other,
    };
    snake.to_string()
}

/// Amounts are non-negative.
pub fn validate_amount(amount: Cents) -> Result<(), CoreError> {
    if amount < 0 {
        return Err(CoreError::Validation(format!(
            "Amount must not be negative, got {amount}"
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Deadlines
-------------------------------------------------------------------------- */

/// Payment deadline for a fee created at `created_at`: one calendar month
/// later. Month-end dates clamp (Jan 31 -> Feb 28/29).
pub fn fee_deadline(created_at: Timestamp) -> Result<NaiveDate, CoreError> {
    created_at
        .date_naive()
        .checked_add_months(Months::new(1))
        .ok_or_else(|| CoreError::Internal(format!("Deadline overflow for {created_at}")))
}

/* --------------------------------------------------------------------------
Monthly statistics
-------------------------------------------------------------------------- */

/// Range of fee records a monthly summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsWindow {
    /// Every record of the kind.
    Lifetime,
    /// Records created within one calendar month (UTC).
    CalendarMonth { year: i32, month: u32 },
}

impl StatsWindow {
    /// The window containing `now`.
    pub fn current_month(now: Timestamp) -> Self {
        StatsWindow::CalendarMonth {
            year: now.year(),
            month: now.month(),
        }
    }

    /// Half-open `[start, end)` bounds on `created_at`, or `None` for
    /// [`StatsWindow::Lifetime`].
    pub fn bounds(self) -> Result<Option<(Timestamp, Timestamp)>, CoreError> {
        let StatsWindow::CalendarMonth { year, month } = self else {
            return Ok(None);
        };
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            CoreError::Validation(format!("Invalid calendar month {year}-{month:02}"))
        })?;
        let end = start
            .checked_add_months(Months::new(1))
            .ok_or_else(|| CoreError::Validation(format!("Month {year}-{month:02} out of range")))?;
        let to_utc = |d: NaiveDate| Utc.from_utc_datetime(&d.and_time(chrono::NaiveTime::MIN));
        Ok(Some((to_utc(start), to_utc(end))))
    }
}

/// Count and amount for one payment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeeBucket {
    pub count: i64,
    pub amount: Cents,
}

/// Fee records of one kind bucketed by payment status.
///
/// `total` is accumulated from the three buckets, so
/// `pending.amount + paid.amount + overdue.amount == total.amount` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyFeeStats {
    pub pending: FeeBucket,
    pub paid: FeeBucket,
    pub overdue: FeeBucket,
    pub total: FeeBucket,
}

impl MonthlyFeeStats {
    /// Fold `(status, count, amount)` rows from a GROUP BY into buckets.
    pub fn from_groups(rows: impl IntoIterator<Item = (PaymentStatus, i64, Cents)>) -> Self {
        let mut stats = Self::default();
        for (status, count, amount) in rows {
            let bucket = match status {
                PaymentStatus::Unpaid => &mut stats.pending,
                PaymentStatus::Paid => &mut stats.paid,
                PaymentStatus::Overdue => &mut stats.overdue,
            };
            bucket.count += count;
            bucket.amount += amount;
            stats.total.count += count;
            stats.total.amount += amount;
        }
        stats
    }
}
