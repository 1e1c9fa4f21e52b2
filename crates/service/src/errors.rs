use thiserror::Error;

/// Domain error taxonomy surfaced by every CRUD operation.
///
/// `NotFound` and `Conflict` are expected, recoverable outcomes for the
/// boundary layer to map; `Storage` is an unexpected persistence fault and
/// fatal to the current call. Nothing is retried or swallowed here.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The requested entity, or the target of an update/delete, does not exist.
    #[error("entity {0} not found")]
    NotFound(i64),
    /// A write was blocked by a referential or uniqueness constraint.
    #[error("integrity conflict: {0}")]
    Conflict(String),
    /// Any persistence fault not covered above.
    #[error("storage failure: {0}")]
    Storage(String),
}
