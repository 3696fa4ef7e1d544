//! Best-effort decoding of the claims segment of a compact bearer token.
//!
//! Nothing here checks a signature. The result only decides what the UI shows;
//! the API re-validates the credential on every request.

use super::Role;
use base64ct::{Base64Unpadded, Encoding};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

const CLAIM_SUBJECT: &str = "sub";
const CLAIM_ROLE: &str = "role";
const CLAIM_EMAIL: &str = "email";
const CLAIM_EXPIRY: &str = "exp";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected 3 token segments, found {0}")]
    SegmentCount(usize),
    #[error("invalid base64 encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("claims are not a json object")]
    NotAnObject,
}

/// Decoded token claims.
///
/// The well-known claims are lifted into typed fields when they have the
/// expected JSON type. Everything else, including a well-known claim with an
/// unexpected type, stays in `extra` so [`Claims::to_json`] gives back the
/// original object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claims {
    pub sub: Option<String>,
    /// Raw role text; see [`Claims::role`] for the parsed value.
    pub role: Option<String>,
    pub email: Option<String>,
    /// Expiry in unix seconds.
    pub exp: Option<i64>,
    pub extra: Map<String, Value>,
}

impl Claims {
    #[must_use]
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        let sub = take_string(&mut object, CLAIM_SUBJECT);
        let role = take_string(&mut object, CLAIM_ROLE);
        let email = take_string(&mut object, CLAIM_EMAIL);
        let exp = match object.get(CLAIM_EXPIRY) {
            Some(value) => match value.as_i64() {
                Some(exp) => {
                    object.remove(CLAIM_EXPIRY);
                    Some(exp)
                }
                None => {
                    // kept opaque, so expiry is never enforced for this token
                    debug!("ignoring exp claim that is not an integer: {value}");
                    None
                }
            },
            None => None,
        };

        Self {
            sub,
            role,
            email,
            exp,
            extra: object,
        }
    }

    /// The role claim if it names one of the credential roles.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|role| role.parse().ok())
    }

    /// Whether the credential expired at or before `now` (unix seconds).
    /// Claims without `exp` never expire.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now)
    }

    /// Re-encodes the claims as the JSON object they were decoded from.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = self.extra.clone();
        if let Some(sub) = &self.sub {
            object.insert(CLAIM_SUBJECT.to_string(), Value::String(sub.clone()));
        }
        if let Some(role) = &self.role {
            object.insert(CLAIM_ROLE.to_string(), Value::String(role.clone()));
        }
        if let Some(email) = &self.email {
            object.insert(CLAIM_EMAIL.to_string(), Value::String(email.clone()));
        }
        if let Some(exp) = self.exp {
            object.insert(CLAIM_EXPIRY.to_string(), Value::from(exp));
        }
        Value::Object(object)
    }
}

impl Serialize for Claims {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Claims {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(deserializer).map(Self::from_object)
    }
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !object.get(key).is_some_and(Value::is_string) {
        return None;
    }
    match object.remove(key) {
        Some(Value::String(value)) => Some(value),
        _ => None,
    }
}

/// Decodes the claims of a `header.payload.signature` token.
///
/// Total from the caller's point of view: any malformed input yields `None`.
#[must_use]
pub fn decode(token: &str) -> Option<Claims> {
    try_decode(token).ok()
}

/// Same as [`decode`] but keeps the failure reason.
///
/// # Errors
///
/// Returns an error if the token does not have exactly three segments, the
/// payload is not base64 (standard or URL-safe, padded or not), or the payload
/// is not a UTF-8 JSON object.
pub fn try_decode(token: &str) -> Result<Claims, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }

    let payload = decode_segment(segments[1])?;
    match serde_json::from_slice::<Value>(&payload)? {
        Value::Object(object) => Ok(Claims::from_object(object)),
        _ => Err(DecodeError::NotAnObject),
    }
}

/// Normalizes the URL-safe alphabet to the standard one and drops padding
/// before decoding.
fn decode_segment(segment: &str) -> Result<Vec<u8>, DecodeError> {
    let normalized: String = segment
        .trim_end_matches('=')
        .chars()
        .map(|ch| match ch {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    Base64Unpadded::decode_vec(&normalized).map_err(|_| DecodeError::Base64)
}
