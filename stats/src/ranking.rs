//! Accounts ranked by their combined power across high-power clusters.
//!
//! Only clusters whose total reaches a threshold take part. Within them, every
//! row of the same account adds to one standing, and every name the account
//! went by is kept.

use crate::{
    aggregate::ClusterSummary,
    error::{
        Error,
        Result,
    },
    model::{
        ClusterKey,
        Platform,
        PlayerIdentity,
        PlayerRow,
    },
    units::format_power,
};
use serde::Serialize;
use std::collections::{
    HashMap,
    HashSet,
};

/// 200 TW.
pub const DEFAULT_MIN_CLUSTER_POWER: u64 = 200_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountStanding {
    pub user_id: String,
    pub platform: Platform,
    /// Sorted, without repeats.
    pub account_names: Vec<String>,
    pub cluster_count: u64,
    /// Watts.
    pub power: u64,
}

/// Ranks the accounts playing clusters of at least `min_cluster_power`.
///
/// Highest power first; equal powers keep first-seen order. Anonymous players
/// have no account to rank and are left out.
pub fn rank_accounts(
    clusters: &[ClusterSummary],
    players: &[PlayerRow],
    min_cluster_power: u64,
) -> Result<Vec<AccountStanding>> {
    let qualifying: HashSet<ClusterKey> = clusters
        .iter()
        .filter(|cluster| cluster.total_power >= min_cluster_power)
        .map(|cluster| cluster.key)
        .collect();
    info!(
        clusters = qualifying.len(),
        threshold = %format_power(min_cluster_power),
        "Ranking accounts of high-power clusters"
    );

    let mut index: HashMap<(Platform, PlayerIdentity), usize> = HashMap::new();
    let mut standings: Vec<AccountStanding> = Vec::new();
    let mut anonymous = 0u64;

    for row in players.iter().filter(|row| qualifying.contains(&row.cluster)) {
        let player = &row.player;
        if player.anonymous {
            anonymous += 1;
            continue;
        }
        let at = *index.entry((player.platform, player.identity)).or_insert_with(|| {
            standings.push(AccountStanding {
                user_id: player.user_id.clone(),
                platform: player.platform,
                account_names: Vec::new(),
                cluster_count: 0,
                power: 0,
            });
            standings.len() - 1
        });

        let standing = &mut standings[at];
        standing.account_names.push(player.account_name.clone());
        standing.cluster_count += 1;
        standing.power = standing
            .power
            .checked_add(player.power)
            .ok_or_else(|| Error::schema("power", player.power))?;
    }

    for standing in &mut standings {
        standing.account_names.sort();
        standing.account_names.dedup();
    }
    standings.sort_by(|a, b| b.power.cmp(&a.power));

    debug!(accounts = standings.len(), anonymous, "Ranked accounts");
    Ok(standings)
}
