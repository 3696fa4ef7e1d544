use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Response error: {0}")]
    Parse(String),

    #[error("Response did not include an access token")]
    MissingToken,

    #[error("Invalid email address")]
    InvalidEmail,

    /// The page was allowed without a credential, so there is nothing to send.
    #[error("Authentication required")]
    Unauthenticated,
}

impl ApiError {
    /// Status of an HTTP error response, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
