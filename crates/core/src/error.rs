use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Entity not found: {entity} with key {key}")]
    NotFoundByKey { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed input: {0}")]
    Format(String),

    #[error("Field '{0}' may not be updated through this operation")]
    ForbiddenField(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Concurrent modification of {entity} {id}; reload and retry")]
    ConcurrencyConflict { entity: &'static str, id: DbId },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Analysis did not finish within {secs}s")]
    AnalysisTimeout { secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}
