//! Newtype wrappers around opaque string identifiers.
//!
//! Room and user identifiers are assigned by external systems (the durable
//! store and the identity provider respectively), so they are carried as
//! opaque strings. Distinct types prevent accidentally passing a `UserId`
//! where a `RoomId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around an opaque `String`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from an externally assigned value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the identifier and return the inner string.
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a room.
    RoomId
);

define_id!(
    /// Unique identifier for a user, as issued by the identity provider.
    UserId
);

define_id!(
    /// Unique identifier for a remote peer connection.
    PeerId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let id = RoomId::new("room-42");
        assert_eq!(id.to_string(), "room-42");
        assert_eq!(id.as_str(), "room-42");
    }

    #[test]
    fn test_distinct_types_compare_by_value() {
        assert_eq!(UserId::from("alice"), UserId::new("alice"));
        assert_ne!(UserId::from("alice"), UserId::from("bob"));
    }

    #[test]
    fn test_serde_transparent() {
        let id = PeerId::new("peer-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"peer-1\"");
        let back: PeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
