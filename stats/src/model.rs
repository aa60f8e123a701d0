//! Canonical entities produced by [`crate::normalize`].

use serde::{
    Serialize,
    Serializer,
};
use sha1::{
    Digest,
    Sha1,
};
use std::fmt;
use strum::Display;

/// Shown instead of the user id and account name of anonymous players.
pub const ANONYMOUS_PLACEHOLDER: &str = "anonymous";

/// Resource multiplier of a cluster, in tenths, or unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceMultiplier {
    Tenths(u8),
    Unlimited,
}

impl fmt::Display for ResourceMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceMultiplier::Tenths(tenths) => write!(f, "{}.{}", tenths / 10, tenths % 10),
            ResourceMultiplier::Unlimited => f.write_str("unlimited"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatDifficulty {
    Code(u8),
    Peaceful,
}

impl fmt::Display for CombatDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatDifficulty::Code(code) => write!(f, "{code}"),
            CombatDifficulty::Peaceful => f.write_str("peaceful"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, Display, PartialEq, Eq, Hash, Serialize)]
pub enum Platform {
    Steam,
    WeGame,
    #[strum(to_string = "XGP")]
    #[serde(rename = "XGP")]
    Xgp,
    #[default]
    Standalone,
}

impl Platform {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Platform::Steam,
            2 => Platform::WeGame,
            3 => Platform::Xgp,
            _ => Platform::Standalone,
        }
    }
}

/// Everything that distinguishes one game world from another.
///
/// A seed alone is not enough: the same seed is played with different star
/// counts, multipliers and difficulties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClusterKey {
    pub seed: u64,
    pub star_count: u32,
    #[serde(serialize_with = "display")]
    pub resource_multiplier: ResourceMultiplier,
    #[serde(serialize_with = "display")]
    pub combat_difficulty: CombatDifficulty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterRecord {
    #[serde(flatten)]
    pub key: ClusterKey,
    pub user_count: u64,
    /// Watts.
    pub total_power: u64,
    pub sails_launched: u64,
    pub dyson_spheres: u64,
}

/// Opaque digest of a player's raw user id, kept after redaction so
/// anonymous players can still be told apart.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerIdentity([u8; 20]);

impl PlayerIdentity {
    pub fn of(raw_user_id: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(raw_user_id.as_bytes());
        Self(hasher.finalize().into())
    }
}

impl fmt::Debug for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.0[..4].iter().fold(String::new(), |mut acc, b| {
            acc.push_str(&format!("{:02x}", b));
            acc
        });
        write!(f, "PlayerIdentity({short})")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRecord {
    #[serde(skip)]
    pub identity: PlayerIdentity,
    pub user_id: String,
    pub platform: Platform,
    pub account_name: String,
    /// Watts.
    pub power: u64,
    pub anonymous: bool,
}

/// A player together with the cluster it was reported in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRow {
    #[serde(flatten)]
    pub cluster: ClusterKey,
    #[serde(flatten)]
    pub player: PlayerRecord,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateTotals {
    pub total_players: u64,
    /// Watts.
    pub total_power: u64,
    pub total_sails: u64,
    pub total_dyson_spheres: u64,
}

fn display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
