use crate::args::{
    Args,
    Command,
};
use color_eyre::Result;
use eyre::{
    Context as _,
    Report,
};
use milkyway_stats_config::Config;
use milkyway_stats_core::{
    fetch::{
        HttpPageSource,
        ReplaySource,
    },
    report::console,
    Error,
    Orchestrator,
    PageSource,
    ReportRequest,
    RunReport,
};

pub struct App {
    args: Args,
    config: Config,
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let config = Config::new(args.config.clone()).wrap_err("Failed to load configuration")?;
        debug!(
            config_dir = %config.config_dir().display(),
            data_dir = %config.data_dir().display(),
            ?config,
            "Loaded configuration"
        );
        Ok(Self { args, config })
    }

    pub fn request(&self) -> Result<ReportRequest> {
        let seed_filter = match &self.args.command {
            Command::ClusterSearch(search) => Some(search.filter().map_err(with_kind)?),
            _ => None,
        };
        let min_cluster_power = match &self.args.command {
            Command::AccountRanking(ranking) => Some(ranking.min_cluster_power().map_err(with_kind)?),
            _ => None,
        };
        Ok(ReportRequest {
            mode: self.args.command.mode(),
            seed_filter,
            min_cluster_power,
            output_dir: self.config.output_dir.clone(),
        })
    }

    pub fn run(self) -> Result<()> {
        let request = self.request()?;
        let report = match &self.args.replay {
            Some(path) => {
                info!(path = %path.display(), "Replaying recorded pages");
                self.execute(ReplaySource::from_path(path).map_err(with_kind)?, &request)?
            }
            None => {
                info!(server = %self.config.server_address, "Querying the directory");
                self.execute(HttpPageSource::new(&self.config).map_err(with_kind)?, &request)?
            }
        };

        println!("{}", console::render(&report));

        if let Some(json) = &self.args.json {
            let content = serde_json::to_string_pretty(&report)?;
            std::fs::write(json, content).wrap_err_with(|| format!("Failed to export {}", json.display()))?;
            info!(path = %json.display(), "Exported run report");
        }
        Ok(())
    }

    fn execute<S: PageSource>(&self, source: S, request: &ReportRequest) -> Result<RunReport> {
        Orchestrator::from_config(source, &self.config)
            .run(request)
            .map_err(with_kind)
    }
}

/// Leads the report with the error kind so scripts can match on it.
fn with_kind(err: Error) -> Report {
    let kind = err.kind();
    Report::new(err).wrap_err(kind)
}
