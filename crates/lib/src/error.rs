use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The credential was rejected by the remote service.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The repository identifier did not resolve to an accessible repository.
    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("remote query failed: {0}")]
    RemoteQuery(String),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
