//! Identity types for catalog entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a fresh opaque entity id (UUIDv4 rendered as a string).
pub fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}

/// Common behaviour for the strongly-typed entity ids.
///
/// Ids are opaque strings assigned by the core at creation time. Clients
/// never choose them, and they never change once assigned.
pub trait EntityIdType:
    Clone + fmt::Debug + fmt::Display + PartialEq + Eq + std::hash::Hash + Send + Sync + 'static
{
    /// Wrap an existing id string (e.g. one received from a caller).
    fn new(raw: impl Into<String>) -> Self;

    /// Generate a fresh id.
    fn generate() -> Self {
        Self::new(new_entity_id())
    }

    /// Borrow the raw id string.
    fn as_str(&self) -> &str;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl EntityIdType for $name {
            fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

define_entity_id!(
    /// Identity of an [`Artist`](crate::Artist).
    ArtistId
);
define_entity_id!(
    /// Identity of an [`Album`](crate::Album).
    AlbumId
);
define_entity_id!(
    /// Identity of a [`Listener`](crate::Listener).
    ListenerId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ArtistId::generate();
        let b = ArtistId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = AlbumId::new("abc-123");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"abc-123\"");
        let back: AlbumId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_display_matches_as_str() {
        let id = ListenerId::from("listener-1");
        assert_eq!(id.to_string(), id.as_str());
    }
}
