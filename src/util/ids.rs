//! Identifier newtypes shared across the crate.
//!
//! Event identities are UUID v4 values minted by the store. Everything that
//! comes from the chat platform (users, messages, threads, channels) is an
//! opaque string the core never interprets.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable identity of an event. Assigned once at creation, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Mint a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

macro_rules! opaque_ref {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a platform-supplied value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_ref!(
    /// Platform user identifier.
    UserId
);
opaque_ref!(
    /// Reference to the published presentation message of an event.
    MessageRef
);
opaque_ref!(
    /// Reference to the discussion thread attached to an event.
    ThreadRef
);
opaque_ref!(
    /// Key of a staged preview awaiting confirmation.
    PreviewId
);

impl PreviewId {
    /// Generate a unique preview key for an author.
    #[must_use]
    pub fn generate(author: &UserId) -> Self {
        Self(format!("{}_{}", Uuid::new_v4().simple(), author))
    }
}
