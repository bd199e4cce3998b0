use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the catalog client.
///
/// Transport failures (timeouts, refused connections) are reported through the
/// same variants as rejected requests, with no `status`.
#[remain::sorted]
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to request JWT token: {reason}")]
    Authentication {
        status: Option<StatusCode>,
        reason: String,
    },

    #[error("Failed to remove entity from catalog: {title}")]
    Delete {
        title: String,
        status: Option<StatusCode>,
        body: String,
    },

    /// Errors returned by reqwest while building a client
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Failed to get owner for system: {system}")]
    SystemOwnerLookup {
        system: String,
        status: Option<StatusCode>,
        body: String,
    },

    /// URL Parsing Error
    #[error(transparent)]
    UrlParserError(#[from] url::ParseError),

    #[error("Failed to add entity to catalog: {title}")]
    Write {
        title: String,
        status: Option<StatusCode>,
        body: String,
    },
}

impl CatalogError {
    /// HTTP status of the rejected request, when the catalog answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogError::Authentication { status, .. }
            | CatalogError::Delete { status, .. }
            | CatalogError::SystemOwnerLookup { status, .. }
            | CatalogError::Write { status, .. } => *status,
            CatalogError::Http(e) => e.status(),
            CatalogError::UrlParserError(_) => None,
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Outcome of a request that did not produce a 2xx response.
#[derive(Debug)]
pub(crate) struct RequestFailure {
    pub status: Option<StatusCode>,
    pub body: String,
}

impl From<reqwest::Error> for RequestFailure {
    fn from(e: reqwest::Error) -> Self {
        Self {
            status: e.status(),
            body: e.to_string(),
        }
    }
}
