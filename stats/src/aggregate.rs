//! Single streaming pass over normalized records.
//!
//! Totals, per-cluster summaries, the leaderboard and the deduplicated player
//! list are all built while the fetch is drained; nothing is re-read.

use crate::{
    error::{
        Error,
        Result,
    },
    model::{
        AggregateTotals,
        ClusterKey,
        ClusterRecord,
        PlayerIdentity,
        PlayerRecord,
        PlayerRow,
    },
};
use serde::Serialize;
use std::collections::{
    HashMap,
    HashSet,
};

/// Deduplicated players of one cluster key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterSummary {
    #[serde(flatten)]
    pub key: ClusterKey,
    pub user_count: u64,
    /// Watts.
    pub total_power: u64,
}

/// Top-N players by power, highest first. Equal powers keep first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    capacity: usize,
    entries: Vec<PlayerRow>,
}

impl Leaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn offer(&mut self, row: &PlayerRow) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            match self.entries.last() {
                Some(min) if row.player.power > min.player.power => {
                    self.entries.pop();
                }
                _ => return,
            }
        }
        let at = self
            .entries
            .partition_point(|entry| entry.player.power >= row.player.power);
        self.entries.insert(at, row.clone());
    }

    pub fn entries(&self) -> &[PlayerRow] {
        &self.entries
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub totals: AggregateTotals,
    /// First-seen order.
    pub clusters: Vec<ClusterSummary>,
    pub leaderboard: Leaderboard,
    /// Every distinct `(cluster, player)`, first-seen order.
    #[serde(skip)]
    pub players: Vec<PlayerRow>,
    pub duplicates_dropped: u64,
}

pub struct Aggregator {
    totals: AggregateTotals,
    cluster_index: HashMap<ClusterKey, usize>,
    clusters: Vec<ClusterSummary>,
    seen: HashSet<(ClusterKey, PlayerIdentity)>,
    leaderboard: Leaderboard,
    players: Vec<PlayerRow>,
    duplicates_dropped: u64,
}

impl Aggregator {
    pub fn new(top_n: usize) -> Self {
        Self {
            totals: AggregateTotals::default(),
            cluster_index: HashMap::new(),
            clusters: Vec::new(),
            seen: HashSet::new(),
            leaderboard: Leaderboard::new(top_n),
            players: Vec::new(),
            duplicates_dropped: 0,
        }
    }

    /// Folds one normalized record into the running state.
    ///
    /// Players already seen under the same cluster key are dropped. A record whose
    /// players were all repeats contributes nothing, counters included.
    pub fn push(&mut self, cluster: ClusterRecord, players: Vec<PlayerRecord>) -> Result<()> {
        let key = cluster.key;
        let fresh: Vec<PlayerRecord> = players
            .into_iter()
            .filter(|player| {
                let new = self.seen.insert((key, player.identity));
                if !new {
                    self.duplicates_dropped += 1;
                    trace!(?key, identity = ?player.identity, "dropped duplicate player");
                }
                new
            })
            .collect();

        let had_players = cluster.user_count > 0;
        if had_players && fresh.is_empty() {
            return Ok(());
        }

        let index = *self.cluster_index.entry(key).or_insert_with(|| {
            self.clusters.push(ClusterSummary {
                key,
                user_count: 0,
                total_power: 0,
            });
            self.clusters.len() - 1
        });

        let totals = &mut self.totals;
        totals.total_sails = add("sails_launched", totals.total_sails, cluster.sails_launched)?;
        totals.total_dyson_spheres = add("dyson_spheres", totals.total_dyson_spheres, cluster.dyson_spheres)?;

        for player in fresh {
            let summary = &mut self.clusters[index];
            summary.user_count += 1;
            summary.total_power = add("total_power", summary.total_power, player.power)?;
            totals.total_players += 1;
            totals.total_power = add("total_power", totals.total_power, player.power)?;

            let row = PlayerRow { cluster: key, player };
            self.leaderboard.offer(&row);
            self.players.push(row);
        }
        Ok(())
    }

    pub fn finish(self) -> Aggregate {
        if self.duplicates_dropped > 0 {
            warn!(duplicates = self.duplicates_dropped, "Dropped repeated players");
        }
        Aggregate {
            totals: self.totals,
            clusters: self.clusters,
            leaderboard: self.leaderboard,
            players: self.players,
            duplicates_dropped: self.duplicates_dropped,
        }
    }
}

/// Drains `records` into an [`Aggregate`], stopping at the first error.
pub fn aggregate<I>(records: I, top_n: usize) -> Result<Aggregate>
where
    I: IntoIterator<Item = Result<(ClusterRecord, Vec<PlayerRecord>)>>,
{
    let mut aggregator = Aggregator::new(top_n);
    for record in records {
        let (cluster, players) = record?;
        aggregator.push(cluster, players)?;
    }
    Ok(aggregator.finish())
}

fn add(field: &'static str, sum: u64, value: u64) -> Result<u64> {
    sum.checked_add(value).ok_or_else(|| Error::schema(field, value))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        fetch::replay::test_support::record,
        normalize::normalize,
        raw::RawRecord,
    };
    use pretty_assertions::assert_eq;

    fn run(records: Vec<RawRecord>, top_n: usize) -> Aggregate {
        aggregate(records.into_iter().map(normalize), top_n).unwrap()
    }

    fn leaders(aggregate: &Aggregate) -> Vec<(u64, &str)> {
        aggregate
            .leaderboard
            .entries()
            .iter()
            .map(|row| (row.player.power, row.player.user_id.as_str()))
            .collect()
    }

    #[test]
    fn totals_are_sums_of_cluster_summaries() {
        let result = run(
            vec![
                record(1, &[("a", 100, false), ("b", 200, false)]),
                record(2, &[("c", 50, false)]),
                record(1, &[("d", 1, false)]),
            ],
            10,
        );
        assert_eq!(result.totals.total_players, 4);
        assert_eq!(result.totals.total_power, 351);
        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.clusters[0].user_count, 3);
        assert_eq!(result.clusters[0].total_power, 301);
        assert_eq!(
            result.clusters.iter().map(|c| c.total_power).sum::<u64>(),
            result.totals.total_power
        );
    }

    #[test]
    fn overlapping_pages_do_not_double_count() {
        let page_a = vec![record(1, &[("a", 100, false), ("b", 200, false)])];
        let page_b = vec![record(1, &[("b", 200, false)]), record(2, &[("c", 5, false)])];

        let once = run(page_a.iter().chain(&page_b[1..]).cloned().collect(), 10);
        let overlapped = run(page_a.iter().chain(&page_b).cloned().collect(), 10);

        assert_eq!(overlapped.totals, once.totals);
        assert_eq!(overlapped.clusters, once.clusters);
        assert_eq!(overlapped.players, once.players);
        assert_eq!(overlapped.duplicates_dropped, 1);
    }

    #[test]
    fn same_user_in_different_seeds_counts_twice() {
        let result = run(vec![record(1, &[("a", 1, false)]), record(2, &[("a", 1, false)])], 10);
        assert_eq!(result.totals.total_players, 2);
        assert_eq!(result.duplicates_dropped, 0);
    }

    #[test]
    fn same_user_on_one_seed_keeps_each_cluster() {
        let mut peaceful = record(1, &[("a", 50, false)]);
        peaceful.combat_difficulty = Some(0);
        let result = run(vec![record(1, &[("a", 100, false)]), peaceful.clone(), peaceful], 10);

        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.clusters[1].total_power, 50);
        assert_eq!(result.totals.total_players, 2);
        assert_eq!(result.totals.total_power, 150);
        assert_eq!(result.duplicates_dropped, 1);
    }

    #[test]
    fn anonymous_players_stay_distinct() {
        let result = run(vec![record(1, &[("a", 1, true), ("b", 2, true)])], 10);
        assert_eq!(result.totals.total_players, 2);
        assert!(result.players.iter().all(|row| row.player.user_id == "anonymous"));
    }

    #[test]
    fn leaderboard_is_bounded_and_descending() {
        let result = run(
            vec![record(
                1,
                &[("a", 5, false), ("b", 9, false), ("c", 1, false), ("d", 7, false), ("e", 8, false)],
            )],
            3,
        );
        assert_eq!(leaders(&result), vec![(9, "b"), (8, "e"), (7, "d")]);
    }

    #[test]
    fn leaderboard_ties_keep_first_seen_order() {
        let result = run(
            vec![record(1, &[("a", 5, false), ("b", 5, false), ("c", 6, false), ("d", 5, false)])],
            3,
        );
        assert_eq!(leaders(&result), vec![(6, "c"), (5, "a"), (5, "b")]);
    }

    #[test]
    fn counters_of_repeated_records_are_ignored() {
        let mut first = record(1, &[("a", 1, false)]);
        first.sails_launched = Some(10);
        let mut repeat = first.clone();
        repeat.dyson_spheres = Some(4);

        let result = run(vec![first, repeat], 10);
        assert_eq!(result.totals.total_sails, 10);
        assert_eq!(result.totals.total_dyson_spheres, 0);
    }

    #[test]
    fn stops_at_the_first_error() {
        let records = vec![
            normalize(record(1, &[("a", 1, false)])),
            Err(Error::fetch("connection reset")),
            normalize(record(2, &[("b", 1, false)])),
        ];
        assert_eq!(aggregate(records, 10).unwrap_err().kind(), "FetchError");
    }
}
