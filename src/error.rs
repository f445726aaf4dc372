use thiserror::Error;

/// Failures while fetching metadata from a provider. Auth and Unavailable
/// carry user-actionable messages distinguishing 4xx from 5xx causes.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("OpenAire refresh token is invalid or expired. Please update token and try again.")]
    Auth,

    #[error("HTTP {0}: not found")]
    NotFound(u16),

    #[error("HTTP {0}: client error")]
    Client(u16),

    #[error("HTTP {0}: provider outage, retry later")]
    Unavailable(u16),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("DOI {0} returned no results")]
    NoResults(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parse failures signal provider schema drift and deliberately abort the
/// batch rather than being swallowed per DOI.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unknown result type {0}")]
    UnknownResultType(String),

    #[error("unknown resource type {resource_type} for {result_type}")]
    UnknownResourceType {
        result_type: String,
        resource_type: String,
    },
}

/// Graph store failures. Conflict marks a unique-constraint violation
/// (duplicate DOI on a concurrent or retried creation) which callers treat
/// as "already exists" rather than fatal.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("constraint violation: {0}")]
    Conflict(String),

    #[error("store query error: {0}")]
    Query(String),

    #[error("store connection error: {0}")]
    Connection(String),
}

impl From<neo4rs::Error> for StoreError {
    fn from(err: neo4rs::Error) -> Self {
        let message = err.to_string();
        if message.contains("ConstraintValidation") || message.contains("already exists") {
            StoreError::Conflict(message)
        } else {
            StoreError::Query(message)
        }
    }
}

impl From<neo4rs::DeError> for StoreError {
    fn from(err: neo4rs::DeError) -> Self {
        StoreError::Query(err.to_string())
    }
}
