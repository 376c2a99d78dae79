#![doc = include_str!("../README.md")]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]

pub(crate) type Kbn<T> = compensated_summation::KahanBabuskaNeumaier<T>;

mod config;
pub use config::{Config, DEFAULT_MAX_COLUMNS};

mod error;
pub use error::{Error, Rejection};

mod window;
pub use window::Window;

mod moving_statistics;
pub use moving_statistics::{MovingStatistics, Observation, Record};

mod parser;
pub use parser::{LineOutcome, LineParser, parse_number, tokenize};

mod pipeline;
pub use pipeline::{Pipeline, Summary, run};
