use crate::{
    aggregate::{
        aggregate,
        Aggregate,
        ClusterSummary,
    },
    error::{
        Error,
        Result,
    },
    fetch::{
        Fetch,
        FetchOptions,
        PageSource,
        QuerySpec,
        SeedFilter,
    },
    model::{
        AggregateTotals,
        PlayerRow,
    },
    normalize::normalize,
    ranking::{
        rank_accounts,
        AccountStanding,
        DEFAULT_MIN_CLUSTER_POWER,
    },
    report::{
        commit,
        Artifact,
        ReportWriter,
        SUMMARY_FILE,
    },
};
use chrono::{
    DateTime,
    Utc,
};
use milkyway_stats_config::Config;
use serde::Serialize;
use std::path::{
    Path,
    PathBuf,
};
use strum::Display;

#[derive(Debug, Clone, Copy, Display, Serialize, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ReportMode {
    Statistics,
    FullData,
    AllUsers,
    ClusterSearch,
    AccountRanking,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub mode: ReportMode,
    /// Required by [`ReportMode::ClusterSearch`], ignored otherwise.
    pub seed_filter: Option<SeedFilter>,
    /// Cluster threshold of [`ReportMode::AccountRanking`] in watts,
    /// [`DEFAULT_MIN_CLUSTER_POWER`] when unset.
    pub min_cluster_power: Option<u64>,
    pub output_dir: PathBuf,
}

/// Outcome of one successful run, also the shape of the JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: ReportMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages_fetched: u32,
    pub artifacts: Vec<PathBuf>,
    pub totals: AggregateTotals,
    pub clusters: Vec<ClusterSummary>,
    pub leaderboard: Vec<PlayerRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<AccountStanding>,
    pub duplicates_dropped: u64,
}

impl RunReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// What one mode renders from the aggregate.
struct Rendering {
    artifacts: Vec<Artifact>,
    accounts: Vec<AccountStanding>,
}

impl From<Vec<Artifact>> for Rendering {
    fn from(artifacts: Vec<Artifact>) -> Self {
        Self {
            artifacts,
            accounts: Vec::new(),
        }
    }
}

/// Drives fetch, normalization, aggregation and writing for each report mode.
///
/// Every mode drains the fetch completely before the first artifact is
/// rendered, so a failed fetch never leaves files behind.
pub struct Orchestrator<S> {
    source: S,
    options: FetchOptions,
    writer: ReportWriter,
    leaderboard_size: usize,
}

impl<S: PageSource> Orchestrator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            options: FetchOptions::default(),
            writer: ReportWriter::default(),
            leaderboard_size: 10,
        }
    }

    /// Takes paging, header style and leaderboard size from `config`.
    pub fn from_config(source: S, config: &Config) -> Self {
        Self::new(source)
            .with_fetch_options(FetchOptions::from_config(config))
            .with_writer(ReportWriter::new(config.header_style))
            .with_leaderboard_size(config.leaderboard_size as usize)
    }

    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_writer(mut self, writer: ReportWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_leaderboard_size(mut self, leaderboard_size: usize) -> Self {
        self.leaderboard_size = leaderboard_size;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn run(&mut self, request: &ReportRequest) -> Result<RunReport> {
        let output_dir = request.output_dir.as_path();
        match request.mode {
            ReportMode::Statistics => self.download_statistics(output_dir),
            ReportMode::FullData => self.download_full_data(output_dir),
            ReportMode::AllUsers => self.download_all_users(output_dir),
            ReportMode::ClusterSearch => {
                let filter = request.seed_filter.ok_or_else(|| Error::Schema {
                    field: "seed_filter",
                    value: "<missing>".to_string(),
                })?;
                self.search_cluster(filter, output_dir)
            }
            ReportMode::AccountRanking => self.rank_accounts(
                request.min_cluster_power.unwrap_or(DEFAULT_MIN_CLUSTER_POWER),
                output_dir,
            ),
        }
    }

    pub fn download_statistics(&mut self, output_dir: &Path) -> Result<RunReport> {
        self.execute(ReportMode::Statistics, QuerySpec::FullScan, output_dir, |writer, aggregate| {
            Ok(vec![writer.write_statistics(&aggregate.totals)].into())
        })
    }

    pub fn download_full_data(&mut self, output_dir: &Path) -> Result<RunReport> {
        self.execute(ReportMode::FullData, QuerySpec::FullScan, output_dir, |writer, aggregate| {
            Ok(vec![
                writer.write_statistics(&aggregate.totals).with_file_name(SUMMARY_FILE),
                writer.write_full_dump(&aggregate.clusters),
                writer.write_leaderboard(&aggregate.leaderboard),
            ]
            .into())
        })
    }

    pub fn download_all_users(&mut self, output_dir: &Path) -> Result<RunReport> {
        self.execute(ReportMode::AllUsers, QuerySpec::FullScan, output_dir, |writer, aggregate| {
            Ok(vec![writer.write_user_dump(&aggregate.players)].into())
        })
    }

    pub fn search_cluster(&mut self, filter: SeedFilter, output_dir: &Path) -> Result<RunReport> {
        self.execute(
            ReportMode::ClusterSearch,
            QuerySpec::Seed(filter),
            output_dir,
            |writer, aggregate| Ok(vec![writer.write_cluster_search(&aggregate.players, filter.seed)].into()),
        )
    }

    /// Ranks the accounts of every cluster at or above `min_cluster_power` watts.
    pub fn rank_accounts(&mut self, min_cluster_power: u64, output_dir: &Path) -> Result<RunReport> {
        self.execute(
            ReportMode::AccountRanking,
            QuerySpec::FullScan,
            output_dir,
            |writer, aggregate| {
                let accounts = rank_accounts(&aggregate.clusters, &aggregate.players, min_cluster_power)?;
                Ok(Rendering {
                    artifacts: vec![writer.write_account_ranking(&accounts)],
                    accounts,
                })
            },
        )
    }

    fn execute(
        &mut self,
        mode: ReportMode,
        query: QuerySpec,
        output_dir: &Path,
        render: impl FnOnce(&ReportWriter, &Aggregate) -> Result<Rendering>,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        info!(%mode, ?query, "Starting report");

        let (aggregate, pages_fetched) = self.collect(query)?;
        let rendering = render(&self.writer, &aggregate)?;
        let artifacts = commit(output_dir, &rendering.artifacts)?;

        let report = RunReport {
            mode,
            seed: match query {
                QuerySpec::Seed(filter) => Some(filter.seed),
                QuerySpec::FullScan => None,
            },
            started_at,
            finished_at: Utc::now(),
            pages_fetched,
            artifacts,
            totals: aggregate.totals,
            clusters: aggregate.clusters,
            leaderboard: aggregate.leaderboard.entries().to_vec(),
            accounts: rendering.accounts,
            duplicates_dropped: aggregate.duplicates_dropped,
        };
        info!(
            %mode,
            players = report.totals.total_players,
            clusters = report.clusters.len(),
            elapsed_ms = report.elapsed().num_milliseconds(),
            "Report finished"
        );
        Ok(report)
    }

    /// Drains the source for `query` into an aggregate.
    ///
    /// Records whose cluster does not match the query are skipped even when
    /// the source already filtered.
    fn collect(&mut self, query: QuerySpec) -> Result<(Aggregate, u32)> {
        let mut fetch = Fetch::new(&mut self.source, query, self.options.clone());
        let records = fetch
            .by_ref()
            .map(|raw| raw.and_then(normalize))
            .filter(|record| match record {
                Ok((cluster, _)) => query.matches(&cluster.key),
                Err(_) => true,
            });
        let aggregate = aggregate(records, self.leaderboard_size)?;
        Ok((aggregate, fetch.pages_fetched()))
    }
}
