use catalog_client::CatalogError;
use thiserror::Error;

use crate::sync::BatchReport;

/// Error type returned by the collaborator traits in [`crate::ports`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[remain::sorted]
#[derive(Debug, Error)]
pub enum SyncError {
    /// Records that failed under [`crate::sync::BatchPolicy::ContinueOnError`].
    #[error("{0}")]
    Batch(BatchReport),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Invalid {kind}: {source}")]
    InvalidEvent {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to list {resource} in account {account_id}: {source}")]
    Lister {
        resource: &'static str,
        account_id: String,
        #[source]
        source: BoxError,
    },

    #[error("{key} must be set")]
    MissingSetting { key: &'static str },

    #[error("Failed to publish {message}: {source}")]
    Publish {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Settings(#[from] figment::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
