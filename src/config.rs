use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Widest line accepted before it is rejected as malformed.
pub const DEFAULT_MAX_COLUMNS: NonZeroUsize = match NonZeroUsize::new(4096) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Settings for one run.
///
/// Column indices are stored 0-based; [`Config::new`] takes them 1-based as
/// they appear on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whitespace-delimited input table.
    pub input: PathBuf,
    /// Destination for the output records.
    pub output: PathBuf,
    /// Number of values per window.
    pub period: NonZeroUsize,
    /// 0-based step column.
    pub step_column: usize,
    /// 0-based value column.
    pub value_column: usize,
    /// Lines with more tokens than this are skipped.
    pub max_columns: NonZeroUsize,
}

impl Config {
    /// Creates a configuration from 1-based column indices.
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        period: NonZeroUsize,
        step_column: NonZeroUsize,
        value_column: NonZeroUsize,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            period,
            step_column: step_column.get() - 1,
            value_column: value_column.get() - 1,
            max_columns: DEFAULT_MAX_COLUMNS,
        }
    }

    /// Overrides the column limit.
    pub fn with_max_columns(mut self, max_columns: NonZeroUsize) -> Self {
        self.max_columns = max_columns;
        self
    }
}
