//! Page gating. UX-only: real access control lives on the API.

use super::{Role, SessionReader};
use secrecy::SecretString;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};
use tracing::{debug, warn};

pub const LOGIN_PATH: &str = "/login";

/// Admin console.
pub const ADMIN: &str = "admin";
/// Tutor dashboard, exam monitor and classroom rosters.
pub const TUTOR_AREA: &str = "tutorArea";
/// Student dashboard and exam pages.
pub const STUDENT_AREA: &str = "studentArea";

/// Static mapping from a page requirement to the roles allowed to view it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    rules: BTreeMap<String, BTreeSet<Role>>,
}

impl RoutePolicy {
    /// A policy without rules; every named requirement is denied.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_rule(
        mut self,
        requirement: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.rules
            .insert(requirement.into(), roles.into_iter().collect());
        self
    }

    #[must_use]
    pub fn allowed(&self, requirement: &str) -> Option<&BTreeSet<Role>> {
        self.rules.get(requirement)
    }

    pub fn requirements(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::empty()
            .with_rule(ADMIN, [Role::Admin])
            .with_rule(TUTOR_AREA, [Role::Tutor, Role::Admin])
            .with_rule(STUDENT_AREA, [Role::Student, Role::Tutor, Role::Admin])
    }
}

/// Maps an app path to the requirement guarding it; `None` for public pages.
#[must_use]
pub fn page_requirement(path: &str) -> Option<&'static str> {
    let first = path
        .trim()
        .trim_start_matches('/')
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    match first {
        "admin" => Some(ADMIN),
        "tutor" | "classrooms" => Some(TUTOR_AREA),
        "student" => Some(STUDENT_AREA),
        _ => None,
    }
}

/// Where a user lands after logging in.
#[must_use]
pub const fn landing_page(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin",
        Role::Tutor => "/tutor",
        Role::Student | Role::Anonymous => "/student",
    }
}

/// Where a user lands after registering.
#[must_use]
pub const fn registration_landing(role: Role) -> &'static str {
    match role {
        Role::Student => "/ws",
        Role::Admin | Role::Tutor | Role::Anonymous => "/",
    }
}

/// Proof that the guard allowed the current page.
///
/// Only gated pages carry a credential, so public pages cannot send one.
#[derive(Clone)]
pub struct Access {
    role: Role,
    credential: Option<SecretString>,
}

impl Access {
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn credential(&self) -> Option<&SecretString> {
        self.credential.as_ref()
    }
}

impl fmt::Debug for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Access")
            .field("role", &self.role)
            .field("credential", &self.credential.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Decision {
    Allow(Access),
    Redirect(String),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Evaluates page requirements against the current session.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    reader: SessionReader,
    policy: Arc<RoutePolicy>,
    login_path: String,
}

impl RouteGuard {
    #[must_use]
    pub fn new(reader: SessionReader, policy: RoutePolicy) -> Self {
        Self {
            reader,
            policy: Arc::new(policy),
            login_path: LOGIN_PATH.to_string(),
        }
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    #[must_use]
    pub fn reader(&self) -> &SessionReader {
        &self.reader
    }

    /// Decides for an explicit role set; `None` means a public page.
    #[must_use]
    pub fn authorize(&self, required: Option<&BTreeSet<Role>>) -> Decision {
        let Some(required) = required else {
            return Decision::Allow(Access {
                role: self.reader.role(),
                credential: None,
            });
        };

        let Some((credential, claims)) = self.reader.current() else {
            debug!("no usable credential, redirecting to {}", self.login_path);
            return self.redirect();
        };

        match claims.role() {
            Some(role) if required.contains(&role) => Decision::Allow(Access {
                role,
                credential: Some(credential),
            }),
            role => {
                debug!("role {role:?} not in {required:?}, redirecting");
                self.redirect()
            }
        }
    }

    /// Decides for a named requirement of the policy. Unknown requirements
    /// are denied.
    #[must_use]
    pub fn check(&self, requirement: &str) -> Decision {
        match self.policy.allowed(requirement) {
            Some(required) => self.authorize(Some(required)),
            None => {
                warn!("unknown page requirement: {requirement}");
                self.redirect()
            }
        }
    }

    /// Decides for an app path such as `/student/exams/3`.
    #[must_use]
    pub fn check_page(&self, path: &str) -> Decision {
        match page_requirement(path) {
            Some(requirement) => self.check(requirement),
            None => self.authorize(None),
        }
    }

    fn redirect(&self) -> Decision {
        Decision::Redirect(self.login_path.clone())
    }
}
