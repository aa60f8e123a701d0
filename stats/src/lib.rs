//! # Milky Way Statistics
//!
//! Aggregates the per-cluster, per-player records of the Dyson Sphere Program
//! "Milky Way" directory into flat report artifacts.
//!
//! ## Pipeline
//!
//! - **`fetch`**: lazy paginated retrieval from a [`fetch::PageSource`]
//! - **`normalize`**: validation and redaction into the canonical [`model`]
//! - **`aggregate`**: totals, per-cluster summaries and the leaderboard in one pass
//! - **`ranking`**: accounts ranked across high-power clusters
//! - **`report`**: CSV and text artifacts, committed all-or-nothing
//! - **`pipeline`**: one [`Orchestrator`] operation per report mode
//!
//! Power values are watts throughout; [`units::format_power`] renders them
//! as `"19.7 PW"` style strings.
//!
//! ## Usage
//!
//! ```no_run
//! use milkyway_stats_core::{fetch::ReplaySource, Orchestrator};
//!
//! let source = ReplaySource::from_path("pages.json".as_ref())?;
//! let report = Orchestrator::new(source).download_statistics("output".as_ref())?;
//! println!("{}", report.totals.total_players);
//! # Ok::<(), milkyway_stats_core::Error>(())
//! ```

#[macro_use]
extern crate tracing;

pub mod aggregate;
pub mod error;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod ranking;
pub mod raw;
pub mod report;
pub mod units;

pub use aggregate::{
    aggregate,
    Aggregate,
    ClusterSummary,
    Leaderboard,
};
pub use error::{
    Error,
    Result,
};
pub use fetch::{
    fetch_all,
    ClusterParams,
    PageSource,
    QuerySpec,
    SeedFilter,
};
pub use normalize::normalize;
pub use pipeline::{
    Orchestrator,
    ReportMode,
    ReportRequest,
    RunReport,
};
pub use ranking::{
    rank_accounts,
    AccountStanding,
    DEFAULT_MIN_CLUSTER_POWER,
};
pub use units::{
    format_power,
    parse_power,
};
