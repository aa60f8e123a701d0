use clap::Parser;
use color_eyre::Result;
use milkyway_stats::{
    init_logging,
    App,
    Args,
};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;
    App::new(args)?.run()
}
