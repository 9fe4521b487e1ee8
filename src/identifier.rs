//! # Identifiers
//!
//! Validated wrappers for the identifiers exchanged with issuers and
//! verifiers. Values are constructed through smart constructors and are
//! opaque afterwards — a `DocType` in hand is known to be well-formed.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Unique identifier for a stored credential. Freshly generated (UUIDv4) at
/// record construction and immutable thereafter.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(into = "String", try_from = "String")]
pub struct CredentialId(String);

impl CredentialId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for CredentialId {
    type Err = Error;

    // Only used when decoding stored records; arbitrary strings are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map_err(|e| Error::decode("record", format!("credential id is not a UUID: {e}")))?;
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for CredentialId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CredentialId> for String {
    fn from(id: CredentialId) -> Self {
        id.0
    }
}

impl Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! non_empty_string {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
        #[serde(into = "String", try_from = "String")]
        pub struct $name(String);

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl $name {
            /// Validate and wrap the provided value.
            ///
            /// # Errors
            /// Returns an error when the value is empty or whitespace-only.
            pub fn new(value: impl Into<String>) -> Result<Self, Error> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(Error::decode($label, "value must not be empty"));
                }
                Ok(Self(value))
            }

            /// The wrapped value as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

non_empty_string!(
    /// ISO 18013-5 document type, e.g. `org.iso.18013.5.1.mDL`.
    DocType,
    "doctype"
);

non_empty_string!(
    /// SD-JWT verifiable credential type, e.g. `EU.PID`.
    Vct,
    "vct"
);

non_empty_string!(
    /// OAuth scope value advertised for a credential configuration.
    Scope,
    "scope"
);

/// BCP-47 language tag used to select display metadata.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(into = "String", try_from = "String")]
pub struct Locale(String);

impl Locale {
    /// Validate and wrap a BCP-47 language tag.
    ///
    /// Checks the tag shape: an alphabetic primary subtag of 2–8 characters,
    /// optionally followed by `-`-separated alphanumeric subtags of 1–8
    /// characters.
    ///
    /// # Errors
    /// Returns an error when the tag is malformed.
    pub fn new(value: impl Into<String>) -> Result<Self, Error> {
        let value = value.into();
        let mut subtags = value.split('-');

        let Some(primary) = subtags.next() else {
            return Err(Error::decode("locale", "empty language tag"));
        };
        if !(2..=8).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::decode("locale", format!("invalid primary subtag: {value}")));
        }
        for subtag in subtags {
            if subtag.is_empty()
                || subtag.len() > 8
                || !subtag.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(Error::decode("locale", format!("invalid subtag in: {value}")));
            }
        }

        Ok(Self(value))
    }

    /// The fallback locale used when no display entry matches.
    #[must_use]
    pub fn default_locale() -> Self {
        Self("en-US".to_string())
    }

    /// The wrapped tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Locale {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
