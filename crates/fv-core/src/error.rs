use thiserror::Error;

/// Edge validation failures for user-supplied attribute values.
///
/// These surface before any row is written or any RPC is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid controller host: {0}")]
    InvalidHost(String),
    #[error("invalid controller port: {0}")]
    InvalidPort(String),
}
