//! Collaborator setup errors

/// Failure to construct a remote collaborator
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// HTTP client could not be built
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Registry base URL is unusable
    #[error("invalid registry URL '{url}': {message}")]
    InvalidBaseUrl {
        /// URL as configured
        url: String,
        /// Parse failure
        message: String,
    },
}
