use ipledger_core::error::CoreError;

/// Error type returned by every ledger operation.
///
/// Domain failures travel as [`CoreError`]. Database errors that carry a
/// domain meaning (unique and foreign-key violations on named constraints)
/// are folded into `Core` on conversion; anything else stays `Database`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

/// Convenience type alias for operation return values.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Stable machine-readable code for callers that branch on the failure.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Core(core) => match core {
                CoreError::NotFound { .. } | CoreError::NotFoundByKey { .. } => "NOT_FOUND",
                CoreError::Validation(_) => "VALIDATION_ERROR",
                CoreError::Format(_) => "FORMAT_ERROR",
                CoreError::ForbiddenField(_) => "FORBIDDEN_FIELD",
                CoreError::InvalidState(_) => "INVALID_STATE",
                CoreError::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
                CoreError::Conflict(_) => "CONFLICT",
                CoreError::AnalysisTimeout { .. } => "ANALYSIS_TIMEOUT",
                CoreError::Internal(_) => "INTERNAL_ERROR",
            },
            ServiceError::Database(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        classify_sqlx_error(err)
    }
}

/// Map constraint violations onto domain errors.
///
/// - Unique violations (`23505`) on `uq_*` constraints become `Conflict`.
/// - Foreign-key violations (`23503`) become `Validation`: the request
///   referenced a row that does not exist.
/// - Everything else is logged and kept as `Database`.
fn classify_sqlx_error(err: sqlx::Error) -> ServiceError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or("unknown");
        match db_err.code().as_deref() {
            Some("23505") if constraint.starts_with("uq_") => {
                return CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                ))
                .into();
            }
            Some("23503") => {
                return CoreError::Validation(format!(
                    "Referenced row does not exist ({constraint})"
                ))
                .into();
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    ServiceError::Database(err)
}

/// True when `err` is a unique violation on the named constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_core_variants() {
        let err: ServiceError = CoreError::ConcurrencyConflict {
            entity: "Asset",
            id: 1,
        }
        .into();
        assert_eq!(err.code(), "CONCURRENCY_CONFLICT");

        let err: ServiceError = CoreError::ForbiddenField("payment_status".into()).into();
        assert_eq!(err.code(), "FORBIDDEN_FIELD");
    }

    #[test]
    fn non_constraint_errors_stay_database() {
        let err = ServiceError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ServiceError::Database(_)));
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound, "uq_fees_asset_id_fee_year"));
    }
}
