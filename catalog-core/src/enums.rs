//! Enum types for catalog entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity kind discriminator. Also names the backing collection and the
/// stats counter segment for that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Artist,
    Album,
    Listener,
}

impl EntityType {
    /// Every entity kind, in a stable order.
    pub const ALL: [EntityType; 3] = [EntityType::Artist, EntityType::Album, EntityType::Listener];

    /// Lower-case segment used in stats keys (`stats:<kind>:hits`).
    pub fn stats_segment(&self) -> &'static str {
        match self {
            EntityType::Artist => "artist",
            EntityType::Album => "album",
            EntityType::Listener => "listener",
        }
    }
}

/// Listener subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionTier {
    Free,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "FREE",
            SubscriptionTier::Premium => "PREMIUM",
        }
    }
}

fn normalize_token(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntityType::Artist => "Artist",
            EntityType::Album => "Album",
            EntityType::Listener => "Listener",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "artist" | "artists" => Ok(EntityType::Artist),
            "album" | "albums" => Ok(EntityType::Album),
            "listener" | "listeners" => Ok(EntityType::Listener),
            _ => Err(format!("Invalid EntityType: {}", s)),
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "free" => Ok(SubscriptionTier::Free),
            "premium" => Ok(SubscriptionTier::Premium),
            _ => Err(format!("Invalid SubscriptionTier: {}", s)),
        }
    }
}
