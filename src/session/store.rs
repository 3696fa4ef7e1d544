//! Storage for the one bearer credential of an API origin.
//!
//! The file store keeps one file per origin under the state directory, so
//! credentials for different API hosts never mix and separate state
//! directories behave like separate browser profiles.

use parking_lot::{Mutex, RwLock};
use secrecy::{ExposeSecret, SecretString};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const CREDENTIAL_EXTENSION: &str = "token";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write credential file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to remove credential file {path}: {source}")]
    Remove { path: PathBuf, source: io::Error },
}

/// Holds at most one credential. Operations are synchronous and idempotent.
pub trait CredentialStore: Send + Sync {
    /// Replaces the stored credential.
    ///
    /// # Errors
    /// Returns an error if the credential cannot be persisted.
    fn set(&self, token: SecretString) -> Result<(), StoreError>;

    /// Returns the stored credential, or `None` when the store is empty or
    /// unreadable.
    fn get(&self) -> Option<SecretString>;

    /// Removes the stored credential. Clearing an empty store succeeds.
    ///
    /// # Errors
    /// Returns an error if an existing credential cannot be removed.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Default state directory: `~/.edurag`, or `./.edurag` without a home.
#[must_use]
pub fn default_state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".edurag")
}

/// File name stem for an origin, lowercase `a-z0-9-` with collapsed
/// separators (`https://API.example.test:8443/x` -> `https-api-example-test-8443`).
#[must_use]
pub fn origin_slug(url: &Url) -> String {
    let origin = url.origin().ascii_serialization();
    let mut slug = String::with_capacity(origin.len());
    let mut prev_dash = false;
    for ch in origin.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    slug.trim_matches('-').to_string()
}

/// Durable, origin-scoped credential file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    // serializes writers inside this process
    lock: Mutex<()>,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(state_dir: &Path, origin: &Url) -> Self {
        let path = state_dir
            .join("credentials")
            .join(format!("{}.{CREDENTIAL_EXTENSION}", origin_slug(origin)));
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes through a uniquely named sibling temp file, so concurrent
    /// writers (other processes included) never share a staging file.
    fn write_atomic(&self, contents: &str) -> io::Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        // created 0600 on unix
        let mut file = tempfile::Builder::new()
            .prefix(".credential-")
            .suffix(".tmp")
            .tempfile_in(parent)?;
        file.write_all(contents.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn set(&self, token: SecretString) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        self.write_atomic(token.expose_secret())
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        debug!("credential stored at {}", self.path.display());
        Ok(())
    }

    fn get(&self) -> Option<SecretString> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(SecretString::from(token.to_string()))
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(
                    "failed to read credential file {}: {err}",
                    self.path.display()
                );
                None
            }
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("credential removed from {}", self.path.display());
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// In-process store, used by tests and embedders without a state directory.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn set(&self, token: SecretString) -> Result<(), StoreError> {
        *self.token.write() = Some(token);
        Ok(())
    }

    fn get(&self) -> Option<SecretString> {
        self.token.read().clone()
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.token.write() = None;
        Ok(())
    }
}
