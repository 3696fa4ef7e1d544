//! Configuration for the hint stream client

use super::StreamError;
use secrecy::SecretString;
use std::{fmt, str::FromStr, time::Duration};
use url::Url;

pub const PUSH_PATH: &str = "realtime/hint";
pub const DUPLEX_PATH: &str = "realtime/ws/hint";

/// Which transport a client uses; fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Server-sent events, one subscription per query.
    Push,
    /// Websocket, one connection for many sends.
    Duplex,
}

impl TransportKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Duplex => "duplex",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "push" | "sse" => Ok(Self::Push),
            "duplex" | "ws" | "websocket" => Ok(Self::Duplex),
            other => Err(format!("invalid transport: {other}")),
        }
    }
}

/// What the student is currently writing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintQuery {
    pub text: String,
    pub form_id: Option<String>,
}

impl HintQuery {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            form_id: None,
        }
    }

    #[must_use]
    pub fn with_form_id(mut self, form_id: impl Into<String>) -> Self {
        self.form_id = Some(form_id.into());
        self
    }
}

/// Configuration for a `StreamClient`
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// API base URL (e.g., "http://localhost:8000")
    pub api_url: Url,

    pub transport: TransportKind,

    /// Sent as `Authorization: Bearer` when present
    pub credential: Option<SecretString>,

    /// How long `disconnect` waits for a graceful close before aborting
    pub close_timeout: Duration,
}

impl StreamConfig {
    #[must_use]
    pub fn new(api_url: Url, transport: TransportKind) -> Self {
        Self {
            api_url,
            transport,
            credential: None,
            close_timeout: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub fn credential(mut self, credential: Option<SecretString>) -> Self {
        self.credential = credential;
        self
    }

    #[must_use]
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// `{api}/realtime/hint?text=..[&form_id=..]`
    ///
    /// # Errors
    /// Returns an error if the API URL cannot be used as a base.
    pub fn push_endpoint(&self, query: &HintQuery) -> Result<Url, StreamError> {
        let mut url = endpoint_url(&self.api_url, PUSH_PATH)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("text", &query.text);
            if let Some(form_id) = &query.form_id {
                pairs.append_pair("form_id", form_id);
            }
        }
        Ok(url)
    }

    /// `{ws-api}/realtime/ws/hint`, with `http` mapped to `ws` and `https` to `wss`.
    ///
    /// # Errors
    /// Returns an error if the API URL is not an http(s) URL.
    pub fn duplex_endpoint(&self) -> Result<Url, StreamError> {
        let mut url = endpoint_url(&self.api_url, DUPLEX_PATH)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return Err(StreamError::Endpoint(format!(
                    "unsupported scheme for websocket: {other}"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|()| StreamError::Endpoint(format!("cannot switch scheme to {scheme}")))?;
        Ok(url)
    }
}

/// Appends `path` to the base, keeping any base path prefix.
fn endpoint_url(base: &Url, path: &str) -> Result<Url, StreamError> {
    if base.cannot_be_a_base() {
        return Err(StreamError::Endpoint(format!("not a base URL: {base}")));
    }
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    let prefix = url.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{prefix}/{}", path.trim_start_matches('/')));
    Ok(url)
}
