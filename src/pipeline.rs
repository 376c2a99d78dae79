use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};

use log::{debug, info, warn};

use crate::{Config, Error, LineOutcome, LineParser, MovingStatistics};

/// Counters for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Lines read, including header, blank and skipped lines.
    pub lines: usize,
    /// Lines without any token.
    pub blank: usize,
    /// Whether the first line was discarded as a header.
    pub header: bool,
    /// Observations fed to the window.
    pub observations: usize,
    /// Malformed lines skipped.
    pub skipped: usize,
    /// Records written.
    pub records: usize,
}

/// Streams lines from a reader through the parser and the moving statistics,
/// writing one record per full window.
#[derive(Debug, Clone)]
pub struct Pipeline {
    parser: LineParser,
    stats: MovingStatistics<f64>,
}

impl Pipeline {
    /// Builds the parser and allocates the window for `config`.
    ///
    /// # Errors
    ///
    /// * [`Error::Allocation`] - The window could not be allocated
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            parser: LineParser::new(config.step_column, config.value_column, config.max_columns),
            stats: MovingStatistics::try_new(config.period)?,
        })
    }

    /// Processes every line of `reader`, writing records to `writer`.
    ///
    /// Lines are decoded lossily, so invalid UTF-8 only affects the tokens it
    /// appears in.
    ///
    /// # Errors
    ///
    /// * [`Error::ColumnRange`] - A configured column is missing from the first data line
    /// * [`Error::EmptyInput`] - The input holds no non-blank line
    /// * [`Error::NoDataAfterHeader`] - Nothing usable follows the header
    /// * [`Error::Read`] / [`Error::Write`] - I/O failure
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut reader: R,
        mut writer: W,
    ) -> Result<Summary, Error> {
        let mut summary = Summary::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).map_err(Error::Read)? == 0 {
                break;
            }
            summary.lines += 1;

            let raw = String::from_utf8_lossy(&buf);
            let line = raw.trim_end_matches(['\n', '\r']);
            match self.parser.parse(line)? {
                LineOutcome::Observation(observation) => {
                    summary.observations += 1;
                    if let Some(record) = self.stats.ingest(observation) {
                        writeln!(writer, "{record}").map_err(Error::Write)?;
                        summary.records += 1;
                    }
                }
                LineOutcome::Header => {
                    summary.header = true;
                    info!("line {}: detected a header line, skipping it", summary.lines);
                }
                LineOutcome::Blank => summary.blank += 1,
                LineOutcome::Skipped(rejection) => {
                    summary.skipped += 1;
                    warn!(
                        "line {}: skipping malformed line ({rejection}): {line}",
                        summary.lines
                    );
                }
            }
        }

        if self.parser.columns().is_none() {
            return Err(if self.parser.header_seen() {
                Error::NoDataAfterHeader
            } else {
                Error::EmptyInput
            });
        }

        writer.flush().map_err(Error::Write)?;
        Ok(summary)
    }
}

/// Runs the whole job described by `config`.
///
/// The input is opened before the output is created, so an unreadable input
/// never truncates an existing output file. If the run fails after the output
/// was created, the output file is removed: a failed run leaves no output
/// behind, a successful one leaves a complete file.
///
/// # Errors
///
/// * [`Error::Open`] / [`Error::Create`] - A path could not be opened
/// * Any error from [`Pipeline::new`] or [`Pipeline::run`]
pub fn run(config: &Config) -> Result<Summary, Error> {
    debug!("{config:?}");
    let input = File::open(&config.input).map_err(|source| Error::Open {
        path: config.input.clone(),
        source,
    })?;
    let output = File::create(&config.output).map_err(|source| Error::Create {
        path: config.output.clone(),
        source,
    })?;

    let result = Pipeline::new(config)
        .and_then(|mut pipeline| pipeline.run(BufReader::new(input), BufWriter::new(output)));

    match result {
        Ok(summary) => {
            info!(
                "{} lines read, {} skipped, {} records written to {}",
                summary.lines,
                summary.skipped,
                summary.records,
                config.output.display()
            );
            Ok(summary)
        }
        Err(err) => {
            if let Err(cleanup) = fs::remove_file(&config.output) {
                warn!("could not remove {}: {cleanup}", config.output.display());
            }
            Err(err)
        }
    }
}
