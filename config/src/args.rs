use crate::HeaderStyle;
use std::path::PathBuf;

/// Options that override the layered configuration for a single run.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Directory the report artifacts are written to.
    #[clap(long, short = 'o', value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Base URL of the Milky Way directory service.
    #[clap(long, value_name = "URL", global = true)]
    pub server: Option<String>,

    /// Platform code sent with every request (1 = Steam, 2 = WeGame, 3 = XGP, 0 = Standalone).
    #[clap(long, value_name = "CODE", global = true)]
    pub platform: Option<u8>,

    /// Session user id. A random Steam-style id is used when neither this nor the config sets one.
    #[clap(long, value_name = "ID", global = true)]
    pub user_id: Option<u64>,

    /// Stop after this many pages.
    #[clap(long, value_name = "N", global = true)]
    pub max_pages: Option<u32>,

    /// Pause between two page requests, e.g. `500ms` or `2s`.
    #[clap(long, value_name = "DURATION", global = true)]
    pub page_delay: Option<String>,

    /// Number of rows kept in the leaderboard.
    #[clap(long, value_name = "N", global = true)]
    pub leaderboard_size: Option<u32>,

    /// CSV header labels: `canonical` field keys or `localized` source labels.
    #[clap(long, value_name = "STYLE", global = true)]
    pub header_style: Option<HeaderStyle>,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for ConfigArgs {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(output_dir) = &self.output_dir {
                cache.insert("output_dir".to_string(), output_dir.display().to_string().into());
            }
            if let Some(server) = &self.server {
                cache.insert("server_address".to_string(), server.clone().into());
            }
            if let Some(platform) = self.platform {
                cache.insert("platform".to_string(), (platform as u64).into());
            }
            if let Some(user_id) = self.user_id {
                cache.insert("user_id".to_string(), user_id.into());
            }
            if let Some(max_pages) = self.max_pages {
                cache.insert("max_pages".to_string(), (max_pages as u64).into());
            }
            if let Some(page_delay) = &self.page_delay {
                cache.insert("page_delay".to_string(), page_delay.clone().into());
            }
            if let Some(leaderboard_size) = self.leaderboard_size {
                cache.insert("leaderboard_size".to_string(), (leaderboard_size as u64).into());
            }
            if let Some(header_style) = self.header_style {
                cache.insert("header_style".to_string(), header_style.to_string().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let config_dir_path = crate::get_config_dir().display().to_string();
    let data_dir_path = crate::get_data_dir().display().to_string();

    format!(
        "{}

Config directory: {config_dir_path}
Data directory: {data_dir_path}",
        clap::crate_version!()
    )
}
