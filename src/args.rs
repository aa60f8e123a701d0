use clap::{
    Parser,
    Subcommand,
};
use milkyway_stats_config::{
    version,
    ConfigArgs,
};
use milkyway_stats_core::{
    parse_power,
    ClusterParams,
    ReportMode,
    SeedFilter,
};
use std::path::PathBuf;

/// Dyson Sphere Program Milky Way statistics reporter
#[derive(Parser, Debug, Clone)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Read pages from a JSON dump instead of querying the directory.
    #[arg(long, value_name = "FILE", global = true)]
    pub replay: Option<PathBuf>,

    /// Additionally export the run report as JSON.
    #[arg(long, value_name = "FILE", global = true)]
    pub json: Option<PathBuf>,

    /// Log debug output of all crates.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Global totals: players, power, sails and Dyson spheres.
    Statistics,
    /// Totals, every cluster and the leaderboard.
    FullData,
    /// Every player of every cluster.
    AllUsers,
    /// Players of a single seed.
    ClusterSearch(ClusterSearchArgs),
    /// Accounts ranked by their power across high-power clusters.
    AccountRanking(AccountRankingArgs),
}

impl Command {
    pub fn mode(&self) -> ReportMode {
        match self {
            Command::Statistics => ReportMode::Statistics,
            Command::FullData => ReportMode::FullData,
            Command::AllUsers => ReportMode::AllUsers,
            Command::ClusterSearch(_) => ReportMode::ClusterSearch,
            Command::AccountRanking(_) => ReportMode::AccountRanking,
        }
    }
}

/// Star count, multiplier and difficulty together let the directory filter
/// server-side; a bare seed scans everything and filters locally.
#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct ClusterSearchArgs {
    #[arg(long)]
    pub seed: u64,

    #[arg(long, requires_all = ["multiplier", "difficulty"])]
    pub stars: Option<u32>,

    /// Raw multiplier code: tenths, `99` for unlimited.
    #[arg(long, requires = "stars")]
    pub multiplier: Option<i64>,

    /// Raw difficulty code: below `100` is peaceful.
    #[arg(long, requires = "stars")]
    pub difficulty: Option<i64>,
}

impl ClusterSearchArgs {
    pub fn filter(&self) -> milkyway_stats_core::Result<SeedFilter> {
        let cluster = match (self.stars, self.multiplier, self.difficulty) {
            (Some(stars), Some(multiplier), Some(difficulty)) => {
                Some(ClusterParams::from_codes(stars, multiplier, difficulty)?)
            }
            _ => None,
        };
        Ok(SeedFilter {
            seed: self.seed,
            cluster,
        })
    }
}

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct AccountRankingArgs {
    /// Only clusters with at least this much power take part, e.g. `200 TW`.
    #[arg(long, value_name = "POWER", default_value = "200 TW")]
    pub min_power: String,
}

impl AccountRankingArgs {
    pub fn min_cluster_power(&self) -> milkyway_stats_core::Result<u64> {
        parse_power(&self.min_power)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use milkyway_stats_core::model::{
        CombatDifficulty,
        ResourceMultiplier,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn global_options_follow_the_subcommand() {
        let args = Args::try_parse_from([
            "milkyway-stats",
            "full-data",
            "--output-dir",
            "reports",
            "--leaderboard-size",
            "25",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.command, Command::FullData);
        assert_eq!(args.config.output_dir, Some(PathBuf::from("reports")));
        assert_eq!(args.config.leaderboard_size, Some(25));
        assert!(args.verbose);
    }

    #[test]
    fn cluster_search_with_parameters_filters_server_side() {
        let args = Args::try_parse_from([
            "milkyway-stats",
            "cluster-search",
            "--seed",
            "95889621",
            "--stars",
            "64",
            "--multiplier",
            "5",
            "--difficulty",
            "0",
        ])
        .unwrap();
        let Command::ClusterSearch(search) = &args.command else {
            panic!("expected cluster-search, got {:?}", args.command);
        };
        let filter = search.filter().unwrap();
        assert_eq!(filter.seed, 95889621);
        let params = filter.cluster.unwrap();
        assert_eq!(params.resource_multiplier, ResourceMultiplier::Tenths(5));
        assert_eq!(params.combat_difficulty, CombatDifficulty::Peaceful);
        assert_eq!(args.command.mode(), ReportMode::ClusterSearch);
    }

    #[test]
    fn account_ranking_threshold_is_a_power_string() {
        let args = Args::try_parse_from(["milkyway-stats", "account-ranking", "--min-power", "1.5 PW"]).unwrap();
        let Command::AccountRanking(ranking) = &args.command else {
            panic!("expected account-ranking, got {:?}", args.command);
        };
        assert_eq!(ranking.min_cluster_power().unwrap(), 1_500_000_000_000_000);
        assert_eq!(args.command.mode(), ReportMode::AccountRanking);

        let args = Args::try_parse_from(["milkyway-stats", "account-ranking"]).unwrap();
        let Command::AccountRanking(ranking) = &args.command else {
            panic!("expected account-ranking, got {:?}", args.command);
        };
        assert_eq!(ranking.min_cluster_power().unwrap(), 200_000_000_000_000);

        let bad = AccountRankingArgs {
            min_power: "lots".to_string(),
        };
        assert_eq!(bad.min_cluster_power().unwrap_err().kind(), "FormatError");
    }

    #[test]
    fn partial_cluster_parameters_are_rejected() {
        assert!(Args::try_parse_from(["milkyway-stats", "cluster-search", "--seed", "1", "--stars", "64"]).is_err());
        assert!(Args::try_parse_from(["milkyway-stats", "cluster-search"]).is_err());
    }
}
