use fv_core::ValidationError;
use fv_store::StoreError;
use thiserror::Error;

/// Failures surfaced to callers of the mutating network/port operations.
///
/// Controller-side failures never appear here: the transport collapses
/// them into its sentinel and the orchestrator logs them instead.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("invalid controller address: {0}")]
    Validation(#[from] ValidationError),
    #[error("network {network_id} is still in use by one or more non-auto-managed ports")]
    NetworkInUse { network_id: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => SyncError::NotFound(what),
            other => SyncError::Store(other),
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::from(StoreError::from(err))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
