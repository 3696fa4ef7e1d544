//! Credential storage, claim decoding, session derivation and page gating.

pub mod claims;
pub mod guard;
pub mod reader;
pub mod role;
pub mod store;

pub use claims::{decode, try_decode, Claims, DecodeError};
pub use guard::{
    landing_page, page_requirement, registration_landing, Access, Decision, RouteGuard,
    RoutePolicy,
};
pub use reader::{ExpiryPolicy, Session, SessionReader};
pub use role::{Role, UnknownRole};
pub use store::{
    default_state_dir, origin_slug, CredentialStore, FileCredentialStore, MemoryCredentialStore,
    StoreError,
};
