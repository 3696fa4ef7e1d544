use crate::{
    api::ApiClient,
    session::{
        default_state_dir, CredentialStore, ExpiryPolicy, FileCredentialStore, RoutePolicy,
        RouteGuard, SessionReader,
    },
};
use anyhow::{Context, Result};
use std::{path::PathBuf, sync::Arc};
use url::Url;

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: Url,
    pub state_dir: PathBuf,
    pub expiry: ExpiryPolicy,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            state_dir: default_state_dir(),
            expiry: ExpiryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_state_dir(mut self, state_dir: Option<PathBuf>) -> Self {
        if let Some(state_dir) = state_dir {
            self.state_dir = state_dir;
        }
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    /// Credential store for the configured API origin.
    #[must_use]
    pub fn store(&self) -> Arc<dyn CredentialStore> {
        Arc::new(FileCredentialStore::new(&self.state_dir, &self.api_url))
    }

    #[must_use]
    pub fn reader(&self, store: Arc<dyn CredentialStore>) -> SessionReader {
        SessionReader::new(store).with_expiry(self.expiry)
    }

    #[must_use]
    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.reader(self.store()), RoutePolicy::default())
    }

    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn api(&self) -> Result<ApiClient> {
        ApiClient::new(self.api_url.clone()).context("failed to create API client")
    }
}
