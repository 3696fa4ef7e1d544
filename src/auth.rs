//! Login, registration and logout on top of the API client and the
//! credential store.

use crate::{
    api::{ApiClient, ApiError},
    session::{self, landing_page, registration_landing, CredentialStore, Role, StoreError},
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where to go after a successful login or registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landing {
    pub role: Role,
    pub path: &'static str,
}

#[derive(Clone)]
pub struct AuthFlow {
    api: ApiClient,
    store: Arc<dyn CredentialStore>,
}

impl AuthFlow {
    #[must_use]
    pub fn new(api: ApiClient, store: Arc<dyn CredentialStore>) -> Self {
        Self { api, store }
    }

    /// Stores the returned credential only after the API accepted the login.
    ///
    /// # Errors
    /// Returns an error if the API rejects the login or the credential cannot
    /// be stored.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Landing, AuthError> {
        let token = self.api.login(email, password).await?;
        let role = self.persist(token)?;
        info!("logged in as {role}");
        Ok(Landing {
            role,
            path: landing_page(role),
        })
    }

    /// Registers a student account and logs it in.
    ///
    /// # Errors
    /// Same as [`AuthFlow::login`].
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Landing, AuthError> {
        let token = self.api.register(email, password).await?;
        let role = self.persist(token)?;
        info!("registered as {role}");
        Ok(Landing {
            role,
            path: registration_landing(role),
        })
    }

    /// Clears the stored credential. Logging out twice is fine.
    ///
    /// # Errors
    /// Returns an error if the credential file cannot be removed.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        info!("logged out");
        Ok(())
    }

    fn persist(&self, token: SecretString) -> Result<Role, StoreError> {
        let role = session::decode(token.expose_secret())
            .and_then(|claims| claims.role())
            .unwrap_or(Role::Anonymous);
        self.store.set(token)?;
        Ok(role)
    }
}
