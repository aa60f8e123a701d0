use color_eyre::Result;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

const CRATES: [&str; 3] = ["milkyway_stats", "milkyway_stats_core", "milkyway_stats_config"];

/// Installs the error report hooks and a stderr subscriber.
///
/// `RUST_LOG` wins over `verbose` when set.
pub fn init_logging(verbose: bool) -> Result<()> {
    color_eyre::install()?;

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<String> = CRATES.iter().map(|krate| format!("{krate}={level}")).collect();
        EnvFilter::new(directives.join(","))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(())
}
