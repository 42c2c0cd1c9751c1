use thiserror::Error;

/// Errors surfaced by the HTTP layer. Connection failures are not errors:
/// they come back as `Outcome::ConnectionError` so the prompt loop can keep
/// going.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;
