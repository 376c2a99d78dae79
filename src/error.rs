use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

/// Fatal errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input file could not be opened.
    #[error("cannot open input file {path:?}: {source}")]
    Open {
        /// Path given for the input.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// The output file could not be created.
    #[error("cannot create output file {path:?}: {source}")]
    Create {
        /// Path given for the output.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// The window buffer could not be allocated.
    #[error("cannot allocate a window of {period} values: {source}")]
    Allocation {
        /// Requested window size.
        period: usize,
        /// Allocator failure.
        source: TryReserveError,
    },

    /// The input holds no non-blank line.
    #[error("empty input file")]
    EmptyInput,

    /// The input holds a header line and nothing usable after it.
    #[error("no data lines found after header")]
    NoDataAfterHeader,

    /// A configured column does not exist in the first data line.
    #[error(
        "column indices exceed available columns (step column {step_column}, value column {value_column}, {detected} detected)"
    )]
    ColumnRange {
        /// 1-based step column as configured.
        step_column: usize,
        /// 1-based value column as configured.
        value_column: usize,
        /// Columns found on the first data line.
        detected: usize,
    },

    /// Reading the input failed mid-run.
    #[error("failed to read input: {0}")]
    Read(#[source] io::Error),

    /// Writing the output failed mid-run.
    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
}

/// Reasons a single line is skipped without failing the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    /// Fewer tokens than the column count established by the first data line.
    #[error("expected at least {expected} columns, found {found}")]
    TooFewColumns {
        /// Established column count.
        expected: usize,
        /// Tokens on this line.
        found: usize,
    },

    /// More tokens than the configured column limit.
    #[error("more than {limit} columns")]
    TooManyColumns {
        /// Configured column limit.
        limit: usize,
    },

    /// A target column does not hold a finite number.
    #[error("column {column} is not numeric: {token:?}")]
    NotNumeric {
        /// 1-based column index.
        column: usize,
        /// Offending token.
        token: String,
    },

    /// The step column is numeric but does not fit a 64-bit integer.
    #[error("step {token:?} does not fit a 64-bit integer")]
    StepOutOfRange {
        /// Offending token.
        token: String,
    },
}
