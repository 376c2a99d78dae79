use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;
use moving_stats::{Config, DEFAULT_MAX_COLUMNS};

/// Moving average and standard deviation of one column of a whitespace-delimited table.
///
/// Writes `<step> <mean> <stddev>` for every full window of WINDOW consecutive
/// data lines. A first line whose step or value column is not numeric is
/// treated as a header and skipped. Diagnostics go to stderr; set RUST_LOG to
/// change their verbosity.
#[derive(Debug, Parser)]
#[command(name = "moving-stats", version)]
struct Cli {
    /// Input table, one record per line, columns separated by spaces or tabs
    input: PathBuf,

    /// Output file, replaced if it exists
    output: PathBuf,

    /// Number of consecutive values per window
    window: NonZeroUsize,

    /// 1-based column holding the step
    step_column: NonZeroUsize,

    /// 1-based column holding the value to average
    value_column: NonZeroUsize,

    /// Lines with more columns than this are skipped
    #[arg(long, default_value_t = DEFAULT_MAX_COLUMNS)]
    max_columns: NonZeroUsize,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config::new(
            cli.input,
            cli.output,
            cli.window,
            cli.step_column,
            cli.value_column,
        )
        .with_max_columns(cli.max_columns)
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from(Cli::parse());
    match moving_stats::run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
