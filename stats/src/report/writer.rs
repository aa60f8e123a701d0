use crate::{
    aggregate::{
        ClusterSummary,
        Leaderboard,
    },
    error::{
        Error,
        Result,
    },
    model::{
        AggregateTotals,
        ClusterKey,
        PlayerRow,
    },
    ranking::AccountStanding,
    report::labels::{
        Field,
        ACCOUNT_COLUMNS,
        CLUSTER_COLUMNS,
        PLAYER_COLUMNS,
        STATISTICS_LINES,
    },
    units::format_power,
};
use milkyway_stats_config::HeaderStyle;
use std::{
    fmt::Write as _,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

pub const STATISTICS_FILE: &str = "statistics.txt";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const CLUSTERS_FILE: &str = "all.csv";
pub const LEADERBOARD_FILE: &str = "top_ten.csv";
pub const USERS_FILE: &str = "user_data.csv";
pub const ACCOUNTS_FILE: &str = "account_ranking.csv";

const NAME_SEPARATOR: &str = " / ";

const TEMP_SUFFIX: &str = ".partial";

/// A rendered file, not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub body: String,
}

impl Artifact {
    pub fn with_file_name(self, file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportWriter {
    header_style: HeaderStyle,
}

impl ReportWriter {
    pub fn new(header_style: HeaderStyle) -> Self {
        Self { header_style }
    }

    pub fn write_statistics(&self, totals: &AggregateTotals) -> Artifact {
        let values = [
            totals.total_players.to_string(),
            format_power(totals.total_power),
            totals.total_sails.to_string(),
            totals.total_dyson_spheres.to_string(),
        ];
        let body = STATISTICS_LINES
            .iter()
            .zip(values)
            .fold(String::new(), |mut body, (field, value)| {
                let _ = writeln!(body, "{}: {value}", field.localized());
                body
            });
        Artifact {
            file_name: STATISTICS_FILE.to_string(),
            body,
        }
    }

    /// One row per cluster key.
    pub fn write_full_dump(&self, clusters: &[ClusterSummary]) -> Artifact {
        let mut body = self.header(&CLUSTER_COLUMNS);
        for cluster in clusters {
            let mut row = key_cells(&cluster.key);
            row.push(cluster.user_count.to_string());
            row.push(format_power(cluster.total_power));
            push_row(&mut body, &row);
        }
        Artifact {
            file_name: CLUSTERS_FILE.to_string(),
            body,
        }
    }

    pub fn write_leaderboard(&self, leaderboard: &Leaderboard) -> Artifact {
        self.player_table(LEADERBOARD_FILE.to_string(), leaderboard.entries().iter())
    }

    pub fn write_user_dump(&self, players: &[PlayerRow]) -> Artifact {
        self.player_table(USERS_FILE.to_string(), players.iter())
    }

    /// Rows of `players` reported under `seed`, in their given order.
    pub fn write_cluster_search(&self, players: &[PlayerRow], seed: u64) -> Artifact {
        self.player_table(
            cluster_search_file(seed),
            players.iter().filter(|row| row.cluster.seed == seed),
        )
    }

    /// One row per account, ranked from 1.
    pub fn write_account_ranking(&self, accounts: &[AccountStanding]) -> Artifact {
        let mut body = self.header(&ACCOUNT_COLUMNS);
        for (rank, account) in accounts.iter().enumerate() {
            push_row(
                &mut body,
                &[
                    (rank + 1).to_string(),
                    account.user_id.clone(),
                    account.platform.to_string(),
                    account.account_names.join(NAME_SEPARATOR),
                    account.cluster_count.to_string(),
                    format_power(account.power),
                ],
            );
        }
        Artifact {
            file_name: ACCOUNTS_FILE.to_string(),
            body,
        }
    }

    fn player_table<'a>(&self, file_name: String, rows: impl Iterator<Item = &'a PlayerRow>) -> Artifact {
        let mut body = self.header(&PLAYER_COLUMNS);
        for PlayerRow { cluster, player } in rows {
            let mut row = key_cells(cluster);
            row.extend([
                player.user_id.clone(),
                player.platform.to_string(),
                player.account_name.clone(),
                format_power(player.power),
                player.anonymous.to_string(),
            ]);
            push_row(&mut body, &row);
        }
        Artifact { file_name, body }
    }

    fn header(&self, columns: &[Field]) -> String {
        let labels: Vec<String> = columns.iter().map(|field| field.label(self.header_style)).collect();
        let mut body = String::new();
        push_row(&mut body, &labels);
        body
    }
}

pub fn cluster_search_file(seed: u64) -> String {
    format!("cluster_players_{seed}.csv")
}

fn key_cells(key: &ClusterKey) -> Vec<String> {
    vec![
        key.seed.to_string(),
        key.star_count.to_string(),
        key.resource_multiplier.to_string(),
        key.combat_difficulty.to_string(),
    ]
}

fn push_row(body: &mut String, cells: &[String]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            body.push(',');
        }
        body.push_str(&csv_field(cell));
    }
    body.push('\n');
}

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Puts every artifact into `output_dir`, or none of them.
///
/// Bodies go to temporary siblings first, which are then renamed into place.
/// On failure the temporaries and the artifacts already renamed are removed.
pub fn commit(output_dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|source| Error::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let targets: Vec<(PathBuf, PathBuf)> = artifacts
        .iter()
        .map(|artifact| {
            let target = output_dir.join(&artifact.file_name);
            let temp = output_dir.join(format!("{}{TEMP_SUFFIX}", artifact.file_name));
            (temp, target)
        })
        .collect();

    let mut written = Vec::new();
    let mut renamed = Vec::new();
    let outcome = (|| -> Result<()> {
        for ((temp, _), artifact) in targets.iter().zip(artifacts) {
            written.push(temp.clone());
            fs::write(temp, &artifact.body).map_err(|source| Error::Write {
                path: temp.clone(),
                source,
            })?;
        }
        for (temp, target) in &targets {
            fs::rename(temp, target).map_err(|source| Error::Write {
                path: target.clone(),
                source,
            })?;
            renamed.push(target.clone());
        }
        Ok(())
    })();

    if let Err(err) = outcome {
        for path in written.iter().chain(&renamed) {
            let _ = fs::remove_file(path);
        }
        error!(%err, "Rolled back partially written report");
        return Err(err);
    }

    for target in &renamed {
        info!(path = %target.display(), "Wrote artifact");
    }
    Ok(renamed)
}
