#[macro_use]
extern crate tracing;

mod app_config;
mod args;

use app_config::AppConfig;
pub use app_config::{
    get_config_dir,
    get_data_dir,
};
pub use args::{
    version,
    ConfigArgs,
};
use eyre::{
    Context as _,
    Result,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};
use strum::{
    Display,
    EnumIter,
    EnumString,
};
use url::Url;

/// Which labels head the CSV artifacts.
#[derive(Debug, Default, Clone, Copy, Display, EnumIter, EnumString, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HeaderStyle {
    /// `seed,star_count,...`
    #[default]
    Canonical,
    /// The directory's own locale (`种子,星数,...`).
    Localized,
}

/// Endpoint paths relative to [`Config::server_address`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    pub statistics: String,
    pub all_users: String,
    pub cluster_users: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    app_config: AppConfig,
    pub server_address: Url,
    pub endpoints: Endpoints,
    #[serde(default = "default_platform")]
    pub platform: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    pub output_dir: PathBuf,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
    #[serde(deserialize_with = "de_duration", serialize_with = "ser_duration")]
    pub page_delay: Duration,
    #[serde(deserialize_with = "de_duration", serialize_with = "ser_duration")]
    pub request_timeout: Duration,
    pub leaderboard_size: u32,
    #[serde(default)]
    pub header_style: HeaderStyle,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

fn default_platform() -> u8 {
    1
}

fn de_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

fn ser_duration<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

impl Config {
    /// Layers the embedded defaults, `config.yaml` from the config directory,
    /// `MILKYWAY_STATS_*` environment variables and finally `args`.
    pub fn new(args: ConfigArgs) -> Result<Self, config::ConfigError> {
        Self::from_sources(&get_config_dir(), &get_data_dir(), args)
    }

    pub fn from_sources(config_dir: &Path, data_dir: &Path, args: ConfigArgs) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.display().to_string())?
            .set_default("config_dir", config_dir.display().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        let config_files = [("config.yaml", config::FileFormat::Yaml)];

        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
        }

        builder = builder
            .add_source(
                config::Environment::with_prefix(app_config::PROJECT_NAME.as_str())
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .add_source(args);

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        if cfg.page_size == 0 {
            return Err(config::ConfigError::Message("page_size must be at least 1".to_string()));
        }
        if cfg.user_id.is_none() {
            let user_id = generate_random_steam_user_id();
            debug!(user_id, "No session user id configured, generated one");
            cfg.user_id = Some(user_id);
        }

        Ok(cfg)
    }

    pub fn data_dir(&self) -> &Path {
        &self.app_config.data_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.app_config.config_dir
    }

    /// The session user id, generated at load time when none was configured.
    pub fn session_user_id(&self) -> u64 {
        self.user_id.unwrap_or_else(generate_random_steam_user_id)
    }

    /// Resolves `endpoint` against the server address and appends the session parameters.
    pub fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .server_address
            .join(endpoint)
            .wrap_err_with(|| format!("Invalid endpoint {endpoint:?} for {}", self.server_address))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("user_id", &self.session_user_id().to_string());
            query.append_pair("platform", &self.platform.to_string());
        }
        Ok(url)
    }
}

/// A Steam id in the individual-account universe with a random account number.
pub fn generate_random_steam_user_id() -> u64 {
    let account: u64 = rand::random::<u32>() as u64 & 0x7fff_ffff;
    1 | (1 << 32) | (1 << 52) | (1 << 56) | (account << 1)
}
