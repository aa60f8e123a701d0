use serde::{
    Deserialize,
    Serialize,
};

/// One cluster as the directory reports it, before validation.
///
/// Every field is optional so that a malformed payload reaches
/// [`crate::normalize`] and fails there with a precise schema error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub star_count: Option<i64>,
    /// Tenths; `99` means unlimited.
    #[serde(default)]
    pub resource_multiplier: Option<i64>,
    /// Hundreds digit `0` means peaceful, otherwise the low two digits are the level.
    #[serde(default)]
    pub combat_difficulty: Option<i64>,
    #[serde(default)]
    pub sails_launched: Option<i64>,
    #[serde(default)]
    pub dyson_spheres: Option<i64>,
    #[serde(default)]
    pub players: Vec<RawPlayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPlayer {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub platform: Option<i64>,
    #[serde(default)]
    pub account_name: Option<String>,
    /// Watts.
    #[serde(default)]
    pub power: Option<i64>,
    #[serde(default)]
    pub anonymous: Option<bool>,
}
