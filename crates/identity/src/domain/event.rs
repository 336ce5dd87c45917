//! Decoding of verified webhook bodies into typed identity events.
//!
//! Decoding runs in two steps: the envelope (`type` tag plus raw `data`)
//! first, then the tag-specific payload. Anything the sync cannot act on
//! safely is a typed [`EventParseError`] rather than a downstream panic;
//! event types we do not handle become [`IdentityEvent::Ignored`].

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::entity::user::UserRole;

pub const USER_CREATED: &str = "user.created";
pub const ROLE_UPDATED: &str = "role.updated";
pub const USER_DELETED: &str = "user.deleted";

#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("event body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("event carries no type tag")]
    MissingType,

    #[error("`{event}` payload is malformed: {reason}")]
    MalformedData { event: String, reason: String },

    #[error("`{0}` event carries no email address")]
    MissingEmail(String),
}

/// Profile data carried by `user.created` and `role.updated` events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectProfile {
    pub subject_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub avatar_url: Option<String>,
    /// Present only when the provider event carries a role.
    pub role: Option<UserRole>,
}

impl SubjectProfile {
    /// First and last name joined with a space, skipping absent parts.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    UserCreated(SubjectProfile),
    RoleUpdated(SubjectProfile),
    UserDeleted { subject_id: String },
    /// Delivered and verified, but not a type this service acts on.
    Ignored(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: Option<String>,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct RawProfile {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email_addresses: Vec<RawEmailAddress>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Deserialize)]
struct RawEmailAddress {
    email_address: String,
}

#[derive(Deserialize)]
struct RawDeletion {
    id: String,
}

/// Decodes a signature-verified body into an [`IdentityEvent`].
pub fn parse(body: &[u8]) -> Result<IdentityEvent, EventParseError> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    let event_type = envelope.event_type.ok_or(EventParseError::MissingType)?;

    match event_type.as_str() {
        USER_CREATED => Ok(IdentityEvent::UserCreated(parse_profile(&event_type, envelope.data)?)),
        ROLE_UPDATED => Ok(IdentityEvent::RoleUpdated(parse_profile(&event_type, envelope.data)?)),
        USER_DELETED => {
            let deletion: RawDeletion = serde_json::from_value(envelope.data).map_err(|err| {
                EventParseError::MalformedData { event: event_type.clone(), reason: err.to_string() }
            })?;
            Ok(IdentityEvent::UserDeleted { subject_id: deletion.id })
        },
        _ => Ok(IdentityEvent::Ignored(event_type)),
    }
}

fn parse_profile(event_type: &str, data: Value) -> Result<SubjectProfile, EventParseError> {
    let raw: RawProfile = serde_json::from_value(data).map_err(|err| EventParseError::MalformedData {
        event: event_type.to_string(),
        reason: err.to_string(),
    })?;

    // The provider sends the primary address first; an event without any
    // address cannot be keyed for the upsert.
    let email = raw
        .email_addresses
        .into_iter()
        .next()
        .ok_or_else(|| EventParseError::MissingEmail(event_type.to_string()))?
        .email_address;

    Ok(SubjectProfile {
        subject_id: raw.id,
        first_name: raw.first_name,
        last_name: raw.last_name,
        email,
        avatar_url: raw.image_url,
        role: raw.role.map(UserRole::from),
    })
}
