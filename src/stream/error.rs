use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    #[error("failed to initialize transport: {0}")]
    Init(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("not connected")]
    NotConnected,

    #[error("transport error: {0}")]
    Transport(String),

    /// The connection ended before it reached `open`.
    #[error("connection closed")]
    Closed,
}
