//! Identifier types for the wallet ledger.
//!
//! Both identifiers are caller-supplied strings. `UserId` must be non-empty;
//! `TransactionId` is an opaque idempotency token from which the two ledger
//! keys of a transfer are derived.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suffix appended to a token to key the counterparty leg of a transfer.
pub const PASSIVE_SUFFIX: &str = "-passive";

/// Implements the string plumbing shared by every identifier type.
macro_rules! string_id_type {
    ($name:ident) => {
        impl $name {
            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

/// A wallet owner identifier.
///
/// User IDs are supplied by the caller and never generated by the ledger.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Create a `UserId`, rejecting empty or blank input.
    ///
    /// # Errors
    ///
    /// Returns `IdError::EmptyUserId` if `value` is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(IdError::EmptyUserId);
        }
        Ok(Self(value))
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for UserId {
    type Error = IdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

string_id_type!(UserId);

/// A caller-supplied idempotency token.
///
/// One token keys up to two ledger rows: [`TransactionId::id`] for the
/// primary side and [`TransactionId::passive_id`] for the counterparty side
/// of a transfer. Each key is applied at most once.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wrap an existing token.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh random token (UUID v4, hyphenated).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Ledger key of the primary side.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Ledger key of the counterparty side of a transfer.
    #[must_use]
    pub fn passive_id(&self) -> String {
        format!("{}{PASSIVE_SUFFIX}", self.0)
    }
}

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl FromStr for TransactionId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

string_id_type!(TransactionId);

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The user identifier was empty.
    #[error("user id is required")]
    EmptyUserId,
}
