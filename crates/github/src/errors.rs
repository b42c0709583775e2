//! Errors raised by the GitHub adapter.

use thiserror::Error;

/// Errors from a GitHub REST call.
///
/// [`GitHubError::UnexpectedStatus`] is the expected-failure case (the API
/// answered, but not with 2xx); callers usually log it and give up. The other
/// variants mean the exchange itself broke.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The API answered with a non-2xx status.
    #[error("GitHub returned {status} for {method} {path}: {body}")]
    UnexpectedStatus {
        /// HTTP method of the request.
        method: &'static str,
        /// Request path, relative to the API root.
        path: String,
        /// Response status code.
        status: u16,
        /// Response body, for the log.
        body: String,
    },

    /// The request could not be sent or the response not received.
    #[error("GitHub request {method} {path} failed")]
    Transport {
        /// HTTP method of the request.
        method: &'static str,
        /// Request path, relative to the API root.
        path: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// A 2xx response body did not have the expected shape.
    #[error("GitHub response for {path} could not be decoded")]
    Decode {
        /// Request path, relative to the API root.
        path: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be built.
    #[error("Invalid GitHub client configuration: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },
}

impl GitHubError {
    /// The HTTP status, when the API answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
