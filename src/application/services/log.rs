//! Run log service
//!
//! Reads run logs through the filesystem boundary and turns their records
//! into rounds with parsed expression trees.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{LogParser, ParsedLog, Round};
use crate::infrastructure::traits::FileSystem;

/// Service for reading kernel-search run logs.
pub struct LogService {
    fs: Arc<dyn FileSystem>,
    parser: LogParser,
}

impl LogService {
    /// Create a new log service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            parser: LogParser::new(),
        }
    }

    /// Read and parse a log file.
    ///
    /// Only I/O failures are errors; malformed content ends up in the
    /// returned diagnostics.
    #[instrument(level = "debug", skip(self))]
    pub fn read(&self, log: &Path) -> ApplicationResult<ParsedLog> {
        let content = self
            .fs
            .read_to_string(log)
            .with_path_context("read log", log)?;
        Ok(self.parse_text(&content))
    }

    pub fn parse_text(&self, text: &str) -> ParsedLog {
        self.parser.parse(text)
    }

    /// Fail with the first diagnostic, if any. Used when local failures must
    /// not be skipped.
    pub fn ensure_clean(&self, parsed: &ParsedLog) -> ApplicationResult<()> {
        match parsed.diagnostics.first() {
            Some(d) => {
                debug!("first diagnostic at line {}", d.line);
                Err(d.error.clone().into())
            }
            None => Ok(()),
        }
    }

    /// All rounds of a parsed log, steps sorted by index.
    pub fn rounds(&self, parsed: &ParsedLog) -> Vec<Round> {
        parsed.rounds.iter().map(Round::from).collect()
    }

    /// A single round by its 1-based number.
    pub fn round(&self, parsed: &ParsedLog, number: usize) -> ApplicationResult<Round> {
        debug!("round: number={}", number);
        number
            .checked_sub(1)
            .and_then(|i| parsed.rounds.get(i))
            .map(Round::from)
            .ok_or(ApplicationError::RoundNotFound {
                number,
                available: parsed.rounds.len(),
            })
    }
}
