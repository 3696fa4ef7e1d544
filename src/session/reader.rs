use super::{claims, Claims, CredentialStore, Role};
use secrecy::{ExposeSecret, SecretString};
use std::{
    fmt,
    str::FromStr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::debug;

/// Source of "now" in unix seconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// What the reader does with the `exp` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// An expired credential reads as no credential at all.
    #[default]
    Enforce,
    /// Expiry is left to the server.
    Ignore,
}

impl ExpiryPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enforce => "enforce",
            Self::Ignore => "ignore",
        }
    }
}

impl FromStr for ExpiryPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "enforce" => Ok(Self::Enforce),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("invalid expiry policy: {other}")),
        }
    }
}

/// Role and email of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub role: Role,
    pub email: Option<String>,
}

impl Session {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            role: Role::Anonymous,
            email: None,
        }
    }
}

/// Read-through view of the credential store.
///
/// Every call reads the store and decodes the credential again; there is
/// nothing to invalidate after login or logout.
#[derive(Clone)]
pub struct SessionReader {
    store: Arc<dyn CredentialStore>,
    expiry: ExpiryPolicy,
    clock: Clock,
}

impl SessionReader {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            expiry: ExpiryPolicy::default(),
            clock: Arc::new(unix_now),
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub fn expiry(&self) -> ExpiryPolicy {
        self.expiry
    }

    /// Current role; `Anonymous` when there is no usable credential or the
    /// role claim is missing or unrecognized.
    #[must_use]
    pub fn role(&self) -> Role {
        self.claims()
            .and_then(|claims| claims.role())
            .unwrap_or(Role::Anonymous)
    }

    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.claims().and_then(|claims| claims.email)
    }

    /// Role and email from a single read of the store.
    #[must_use]
    pub fn session(&self) -> Session {
        match self.claims() {
            Some(claims) => Session {
                role: claims.role().unwrap_or(Role::Anonymous),
                email: claims.email,
            },
            None => Session::anonymous(),
        }
    }

    /// Claims of the stored credential, subject to the expiry policy.
    #[must_use]
    pub fn claims(&self) -> Option<Claims> {
        self.current().map(|(_, claims)| claims)
    }

    /// The stored credential exactly as stored, whether or not it decodes.
    #[must_use]
    pub fn credential(&self) -> Option<SecretString> {
        self.store.get()
    }

    /// Credential and its claims from one store read. `None` when the store is
    /// empty, the credential does not decode, or it expired under
    /// [`ExpiryPolicy::Enforce`].
    pub(crate) fn current(&self) -> Option<(SecretString, Claims)> {
        let token = self.store.get()?;
        let claims = match claims::try_decode(token.expose_secret()) {
            Ok(claims) => claims,
            Err(err) => {
                debug!("stored credential does not decode: {err}");
                return None;
            }
        };

        if self.expiry == ExpiryPolicy::Enforce && claims.is_expired_at((self.clock)()) {
            debug!("stored credential expired at {:?}", claims.exp);
            return None;
        }

        Some((token, claims))
    }
}

impl fmt::Debug for SessionReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionReader")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}
