use std::num::NonZeroUsize;

use crate::{Error, Observation, Rejection};

/// What a single input line turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// A validated data row.
    Observation(Observation),
    /// The first line, discarded because a target column is not numeric.
    Header,
    /// A line with no tokens, before the first data line.
    Blank,
    /// A malformed data line, skipped.
    Skipped(Rejection),
}

/// Splits a line into its space/tab separated columns.
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split([' ', '\t']).filter(|token| !token.is_empty())
}

/// Parses a whole token as a finite floating-point number.
///
/// Trailing whitespace is ignored; any other residue, an empty token, or a
/// non-finite result such as `inf` or `nan` makes the token non-numeric.
pub fn parse_number(token: &str) -> Option<f64> {
    token
        .trim_end()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Stateful line parser for one input stream.
///
/// Checks the first non-blank line for a header, then fixes the column count
/// from the first data line and holds every later line to it.
#[derive(Debug, Clone)]
pub struct LineParser {
    step_column: usize,
    value_column: usize,
    max_columns: usize,
    /// Column count of the first data line.
    columns: Option<usize>,
    header_checked: bool,
    header_seen: bool,
}

impl LineParser {
    /// Creates a parser for 0-based step and value columns.
    pub fn new(step_column: usize, value_column: usize, max_columns: NonZeroUsize) -> Self {
        Self {
            step_column,
            value_column,
            max_columns: max_columns.get(),
            columns: None,
            header_checked: false,
            header_seen: false,
        }
    }

    /// Column count established by the first data line, if one has been seen.
    pub fn columns(&self) -> Option<usize> {
        self.columns
    }

    /// Returns `true` if a header line was discarded.
    pub fn header_seen(&self) -> bool {
        self.header_seen
    }

    /// Classifies one line, without its line terminator.
    ///
    /// # Errors
    ///
    /// * [`Error::ColumnRange`] - The first data line has too few columns for the configured indices
    pub fn parse(&mut self, line: &str) -> Result<LineOutcome, Error> {
        let tokens: Vec<&str> = tokenize(line)
            .take(self.max_columns.saturating_add(1))
            .collect();
        if tokens.is_empty() {
            return Ok(match self.columns {
                Some(expected) => {
                    LineOutcome::Skipped(Rejection::TooFewColumns { expected, found: 0 })
                }
                None => LineOutcome::Blank,
            });
        }
        let first_line = !self.header_checked;
        self.header_checked = true;

        if tokens.len() > self.max_columns {
            return Ok(LineOutcome::Skipped(Rejection::TooManyColumns {
                limit: self.max_columns,
            }));
        }

        if first_line && self.is_header_row(&tokens) {
            self.header_seen = true;
            return Ok(LineOutcome::Header);
        }

        match self.columns {
            Some(expected) if tokens.len() < expected => {
                return Ok(LineOutcome::Skipped(Rejection::TooFewColumns {
                    expected,
                    found: tokens.len(),
                }));
            }
            Some(_) => {}
            None => {
                let detected = tokens.len();
                if self.step_column >= detected || self.value_column >= detected {
                    return Err(Error::ColumnRange {
                        step_column: self.step_column + 1,
                        value_column: self.value_column + 1,
                        detected,
                    });
                }
                self.columns = Some(detected);
            }
        }

        Ok(match self.observation(&tokens) {
            Ok(observation) => LineOutcome::Observation(observation),
            Err(rejection) => LineOutcome::Skipped(rejection),
        })
    }

    // Only present columns count: a line too short for a target column is a
    // data line, and the column range check decides its fate.
    fn is_header_row(&self, tokens: &[&str]) -> bool {
        [self.step_column, self.value_column]
            .iter()
            .filter_map(|&column| tokens.get(column))
            .any(|token| parse_number(token).is_none())
    }

    fn observation(&self, tokens: &[&str]) -> Result<Observation, Rejection> {
        let column = |index: usize| {
            let token = tokens[index];
            parse_number(token)
                .map(|number| (number, token))
                .ok_or_else(|| Rejection::NotNumeric {
                    column: index + 1,
                    token: token.to_owned(),
                })
        };
        let (step, step_token) = column(self.step_column)?;
        let (value, _) = column(self.value_column)?;

        let step = step.trunc();
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        if step < i64::MIN as f64 || step >= i64::MAX as f64 {
            return Err(Rejection::StepOutOfRange {
                token: step_token.to_owned(),
            });
        }

        Ok(Observation {
            step: step as i64,
            value,
        })
    }
}
