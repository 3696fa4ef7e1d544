use std::{fmt, str::FromStr};
use thiserror::Error;

/// Role of the current session as seen by the UI.
///
/// `Anonymous` is never read from a credential; it is what the session falls
/// back to when there is no usable credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Admin,
    Tutor,
    Student,
    Anonymous,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Tutor => "tutor",
            Self::Student => "student",
            Self::Anonymous => "anonymous",
        }
    }

    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        !matches!(self, Self::Anonymous)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a role claim. Only the three roles a credential can carry are
/// accepted, and the match is exact.
impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "tutor" => Ok(Self::Tutor),
            "student" => Ok(Self::Student),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_credential_roles() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("tutor".parse::<Role>(), Ok(Role::Tutor));
        assert_eq!("student".parse::<Role>(), Ok(Role::Student));
    }

    #[test]
    fn rejects_anonymous_and_case_variants() {
        assert!("anonymous".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
        assert!(" tutor".parse::<Role>().is_err());
        assert_eq!(
            "owner".parse::<Role>(),
            Err(UnknownRole("owner".to_string()))
        );
    }

    #[test]
    fn display_matches_wire_name() {
        for role in [Role::Admin, Role::Tutor, Role::Student, Role::Anonymous] {
            assert_eq!(role.to_string(), role.as_str());
        }
        assert!(!Role::Anonymous.is_authenticated());
        assert!(Role::Student.is_authenticated());
    }
}
