//! Value objects.
//!
//! Identifiers and validated inputs. Constructors validate, so holding a
//! value object means the value is well-formed.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ValueObjectError;

/// Cards a participant may play, in deck order.
pub const VOTING_CARDS: [&str; 14] = [
    "0", "1", "2", "3", "5", "8", "13", "21", "34", "55", "89", "144", "☕", "?",
];

const MAX_ID_LEN: usize = 64;
const MAX_DISPLAY_NAME_LEN: usize = 50;
const MAX_SESSION_NAME_LEN: usize = 100;
const MAX_TICKET_TITLE_LEN: usize = 200;

fn validate_id(kind: &'static str, value: &str) -> Result<(), ValueObjectError> {
    if value.is_empty() || value.chars().count() > MAX_ID_LEN {
        return Err(ValueObjectError::InvalidId {
            kind,
            value: value.to_string(),
        });
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValueObjectError::InvalidId {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap an identifier.
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validate_id($kind, &value)?;
                Ok(Self(value))
            }

            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Planning session (room) identifier.
    SessionId,
    "session"
);
string_id!(
    /// Participant identity.
    UserId,
    "user"
);
string_id!(
    /// Live transport connection identifier.
    ConnectionId,
    "connection"
);

/// Ticket identifier, assigned by storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(u64);

impl TicketId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A card from [`VOTING_CARDS`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoteValue(String);

impl VoteValue {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        if VOTING_CARDS.contains(&trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ValueObjectError::InvalidVote(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VoteValue {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VoteValue> for String {
    fn from(value: VoteValue) -> Self {
        value.0
    }
}

/// Participant display name: 1-50 letters, digits, spaces, hyphens or underscores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        let trimmed = value.trim();
        let valid_chars = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_');
        let len = trimmed.chars().count();
        if len == 0 || len > MAX_DISPLAY_NAME_LEN || !valid_chars {
            return Err(ValueObjectError::InvalidDisplayName(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DisplayName> for String {
    fn from(name: DisplayName) -> Self {
        name.0
    }
}

fn validate_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValueObjectError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > max {
        return Err(ValueObjectError::InvalidText { field, max });
    }
    Ok(trimmed.to_string())
}

/// Session name: 1-100 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionName(String);

impl SessionName {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_text("name", &value, MAX_SESSION_NAME_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionName> for String {
    fn from(name: SessionName) -> Self {
        name.0
    }
}

/// Ticket title: 1-200 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketTitle(String);

impl TicketTitle {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_text("title", &value, MAX_TICKET_TITLE_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TicketTitle {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TicketTitle> for String {
    fn from(title: TicketTitle) -> Self {
        title.0
    }
}

macro_rules! display_as_str {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(DisplayName, SessionName, TicketTitle);

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
