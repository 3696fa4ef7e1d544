//! HTTP client for the edurag API with a fixed timeout policy and sanitized
//! error bodies. Credentials are never read from the store here: login and
//! registration return a fresh one, and authenticated calls take it from an
//! [`Access`] grant.

pub mod error;

pub use error::ApiError;

use crate::{session::Access, APP_USER_AGENT};
use regex::Regex;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default request timeout applied to every call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

/// Role requested for self-service registration.
const REGISTER_ROLE: &str = "student";

#[derive(Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { base_url, client })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Exchanges email and password for a bearer credential.
    ///
    /// # Errors
    /// Returns an error for an invalid email, a failed request, or a response
    /// without `access_token`.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SecretString, ApiError> {
        self.exchange("/auth/login", email, password, None).await
    }

    /// Creates a student account and returns its bearer credential.
    ///
    /// # Errors
    /// Same as [`ApiClient::login`].
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SecretString, ApiError> {
        self.exchange("/auth/register", email, password, Some(REGISTER_ROLE))
            .await
    }

    /// Authenticated `GET` using the credential of an allowed page.
    ///
    /// # Errors
    /// Returns [`ApiError::Unauthenticated`] when the grant carries no
    /// credential, otherwise request and decoding errors.
    #[instrument(skip(self, access))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        access: &Access,
        path: &str,
    ) -> Result<T, ApiError> {
        let credential = access.credential().ok_or(ApiError::Unauthenticated)?;
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(credential.expose_secret())
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json_response(response).await
    }

    async fn exchange(
        &self,
        path: &str,
        email: &str,
        password: &SecretString,
        role: Option<&str>,
    ) -> Result<SecretString, ApiError> {
        let email = email.trim();
        if !valid_email(email) {
            return Err(ApiError::InvalidEmail);
        }

        let body = CredentialsRequest {
            email,
            password: password.expose_secret(),
            role,
        };
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let token: TokenResponse = handle_json_response(response).await?;
        match token.access_token {
            Some(token) if !token.trim().is_empty() => {
                debug!("received access token");
                Ok(SecretString::from(token))
            }
            _ => Err(ApiError::MissingToken),
        }
    }

    fn url(&self, path: &str) -> String {
        build_url_with_base(self.base_url.as_str(), path)
    }
}

/// Client-side email check before any credentials leave the machine.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Http {
            status: status.as_u16(),
            message: sanitize_body(&body),
        })
    }
}

/// Surfaces `{"detail": ..}` error bodies, then trims and truncates.
fn sanitize_body(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        });
    let text = detail.as_deref().unwrap_or(body);

    let trimmed = text.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
