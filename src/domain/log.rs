//! Run log reader: groups log lines into rounds and steps.
//!
//! Recognized lines (after trimming, blank lines skipped):
//!
//! ```text
//! Init: <expr>
//! Step <n> | accept|reject | log_alpha=<float>
//! Sever path: <path>
//! Before: <expr>
//! After : <expr>
//! ```
//!
//! Everything else is ignored.

use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::domain::entities::{RoundRecord, StepRecord, StepStatus};
use crate::domain::error::DomainError;

const INIT_PREFIX: &str = "Init: ";
const SEVER_PREFIX: &str = "Sever path: ";
const BEFORE_PREFIX: &str = "Before: ";
const AFTER_PREFIX: &str = "After : ";

/// A recovered failure tied to its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    pub error: DomainError,
}

/// Result of reading one log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLog {
    pub rounds: Vec<RoundRecord>,
    pub diagnostics: Vec<Diagnostic>,
    /// Non-blank lines matching no recognized shape
    pub ignored_lines: usize,
}

impl ParsedLog {
    pub fn step_count(&self) -> usize {
        self.rounds.iter().map(|r| r.steps.len()).sum()
    }
}

/// Line-oriented state machine over a run log.
pub struct LogParser {
    step_regex: Regex,
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Which detail field of the current step a line sets.
#[derive(Debug, Clone, Copy)]
enum Detail {
    SeverPath,
    Before,
    After,
}

impl Detail {
    fn label(&self) -> &'static str {
        match self {
            Detail::SeverPath => "Sever path",
            Detail::Before => "Before",
            Detail::After => "After",
        }
    }
}

impl LogParser {
    pub fn new() -> Self {
        Self {
            step_regex: Regex::new(
                r"^Step\s+([0-9]+)\s+\|\s+(accept|reject)\s+\|\s+log_alpha=([-+\w.]+)",
            )
            .expect("step header regex is valid"),
        }
    }

    /// Read a whole log in one forward pass. Never fails.
    #[instrument(level = "debug", skip_all, fields(bytes = text.len()))]
    pub fn parse(&self, text: &str) -> ParsedLog {
        let mut parsed = ParsedLog::default();
        let mut current: Option<RoundRecord> = None;
        // the current step is always the last one of `current`
        let mut has_step = false;

        for (line_no, raw) in text.lines().enumerate() {
            let line_no = line_no + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(expr) = line.strip_prefix(INIT_PREFIX) {
                if let Some(done) = current.take() {
                    parsed.rounds.push(done);
                }
                current = Some(RoundRecord::new(expr));
                has_step = false;
                continue;
            }

            if let Some(header) = self.parse_step_header(line) {
                let result = header.and_then(|step| match current.as_mut() {
                    Some(round) => {
                        round.steps.push(step);
                        Ok(())
                    }
                    None => Err(DomainError::StepOutsideRound),
                });
                match result {
                    Ok(()) => has_step = true,
                    Err(error) => {
                        // a dropped header must not receive the next detail lines
                        has_step = false;
                        Self::report(&mut parsed, line_no, error);
                    }
                }
                continue;
            }

            let Some((detail, value)) = Self::split_detail(line) else {
                parsed.ignored_lines += 1;
                continue;
            };
            let step = current
                .as_mut()
                .filter(|_| has_step)
                .and_then(|round| round.steps.last_mut());
            match step {
                Some(step) => {
                    let value = Some(value.trim().to_string());
                    match detail {
                        Detail::SeverPath => step.sever_path = value,
                        Detail::Before => step.before = value,
                        Detail::After => step.after = value,
                    }
                }
                None => Self::report(
                    &mut parsed,
                    line_no,
                    DomainError::DetailOutsideStep {
                        field: detail.label(),
                    },
                ),
            }
        }

        if let Some(done) = current.take() {
            parsed.rounds.push(done);
        }

        debug!(
            "parsed {} rounds, {} steps, {} diagnostics, {} ignored lines",
            parsed.rounds.len(),
            parsed.step_count(),
            parsed.diagnostics.len(),
            parsed.ignored_lines
        );
        parsed
    }

    /// `None` if the line is not a step header at all; `Some(Err)` if it is
    /// one but carries corrupt values.
    fn parse_step_header(&self, line: &str) -> Option<Result<StepRecord, DomainError>> {
        let caps = self.step_regex.captures(line)?;
        Some(Self::step_from_captures(&caps[1], &caps[2], &caps[3]))
    }

    fn step_from_captures(
        index: &str,
        status: &str,
        log_alpha: &str,
    ) -> Result<StepRecord, DomainError> {
        let index: u64 = index.parse().map_err(|_| DomainError::InvalidMetric {
            field: "index",
            value: index.to_string(),
        })?;
        let status: StepStatus = status.parse()?;
        let log_alpha = log_alpha
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| DomainError::InvalidMetric {
                field: "log_alpha",
                value: log_alpha.to_string(),
            })?;
        Ok(StepRecord::new(index, status, log_alpha))
    }

    fn split_detail(line: &str) -> Option<(Detail, &str)> {
        [
            (SEVER_PREFIX, Detail::SeverPath),
            (BEFORE_PREFIX, Detail::Before),
            (AFTER_PREFIX, Detail::After),
        ]
        .into_iter()
        .find_map(|(prefix, detail)| line.strip_prefix(prefix).map(|rest| (detail, rest)))
    }

    fn report(parsed: &mut ParsedLog, line: usize, error: DomainError) {
        warn!("line {}: {}", line, error);
        parsed.diagnostics.push(Diagnostic { line, error });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_single_step_round() {
        let log = "Init: RBF1\nStep 0 | accept | log_alpha=-0.512\nSever path: L\nBefore: RBF1\nAfter : PER1\n";
        let parsed = LogParser::new().parse(log);

        assert_eq!(parsed.rounds.len(), 1);
        let round = &parsed.rounds[0];
        assert_eq!(round.initial_kernel, "RBF1");
        assert_eq!(round.steps.len(), 1);
        let step = &round.steps[0];
        assert_eq!(step.index, 0);
        assert_eq!(step.status, StepStatus::Accept);
        assert_eq!(step.log_alpha, -0.512);
        assert_eq!(step.sever_path.as_deref(), Some("L"));
        assert_eq!(step.before.as_deref(), Some("RBF1"));
        assert_eq!(step.after.as_deref(), Some("PER1"));
        assert!(parsed.diagnostics.is_empty());
    }

    #[rstest]
    #[case("Step 1 | accept | log_alpha=1.2.3", "log_alpha")]
    #[case("Step 1 | reject | log_alpha=abc", "log_alpha")]
    #[case("Step 1 | reject | log_alpha=inf", "log_alpha")]
    #[case("Step 99999999999999999999999 | accept | log_alpha=0.1", "index")]
    fn test_corrupt_header_is_local(#[case] header: &str, #[case] field: &str) {
        let log = format!(
            "Init: A\nStep 0 | accept | log_alpha=0.5\n{}\nBefore: X\nStep 2 | reject | log_alpha=-1\n",
            header
        );
        let parsed = LogParser::new().parse(&log);

        let steps: Vec<u64> = parsed.rounds[0].steps.iter().map(|s| s.index).collect();
        assert_eq!(steps, vec![0, 2]);
        // detail after the dropped header does not leak into step 0
        assert_eq!(parsed.rounds[0].steps[0].before, None);
        assert_eq!(parsed.diagnostics.len(), 2);
        assert!(matches!(
            &parsed.diagnostics[0].error,
            DomainError::InvalidMetric { field: f, .. } if *f == field
        ));
        assert_eq!(parsed.diagnostics[0].line, 3);
    }

    #[test]
    fn test_exponent_notation() {
        let parsed = LogParser::new().parse("Init: A\nStep 0 | accept | log_alpha=-1.5e-3\n");
        assert_eq!(parsed.rounds[0].steps[0].log_alpha, -0.0015);
    }

    #[test]
    fn test_step_before_init_is_reported() {
        let parsed = LogParser::new().parse("Step 0 | accept | log_alpha=0.1\nBefore: A\n");
        assert!(parsed.rounds.is_empty());
        assert_eq!(
            parsed.diagnostics.iter().map(|d| &d.error).collect::<Vec<_>>(),
            vec![
                &DomainError::StepOutsideRound,
                &DomainError::DetailOutsideStep { field: "Before" }
            ]
        );
    }

    #[rstest]
    #[case("Step \u{0663} | accept | log_alpha=0.1")]
    #[case("Step \u{FF11}\u{FF12} | reject | log_alpha=-1")]
    #[case("Step 1\u{0662} | accept | log_alpha=0.1")]
    fn test_non_ascii_step_index_is_not_a_header(#[case] header: &str) {
        let parsed = LogParser::new().parse(&format!("Init: A\n{}\n", header));

        assert!(parsed.rounds[0].steps.is_empty());
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.ignored_lines, 1);
    }

    #[test]
    fn test_unrecognized_lines_are_counted() {
        let parsed = LogParser::new().parse("hello\n\n  \nInit: A\nStep x | accept\nAfter: B\n");
        assert_eq!(parsed.rounds.len(), 1);
        assert_eq!(parsed.ignored_lines, 3);
    }
}
