/// Terrastl - terrain height-field to STL
///
/// Generates a height-field, exports it as binary or ASCII STL and saves it.
/// Run with `--help` for the option list.
use std::env;
use std::io;

use terrastl_cli::{inspect, parse_args, report, run, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut stdout = io::stdout();

    match parse_args(env::args().skip(1))? {
        Command::Help => report::print_usage(&mut stdout)?,
        Command::Inspect(path) => {
            let inspection = inspect(&path)?;
            report::print_inspection(&mut stdout, &inspection)?;
        }
        Command::Export(args) => {
            let mut config = args.into_config()?;
            if let Some(seed) = config.resolve_seed() {
                info!(seed, "no seed given for random terrain");
            }
            let outcome = run(&config)?;
            report::print_outcome(&mut stdout, &outcome)?;
        }
    }

    Ok(())
}
