//! Domain entities: rounds and steps of a kernel search run

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::error::DomainError;
use crate::domain::expression::ExpressionNode;
use crate::domain::path::Path;

/// Decision taken on a proposed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Accept,
    Reject,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Accept => "accept",
            StepStatus::Reject => "reject",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(StepStatus::Accept),
            "reject" => Ok(StepStatus::Reject),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// A step as it appears in the log: header values plus raw detail text.
///
/// Detail fields stay `None` when the log never supplied them.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub index: u64,
    pub status: StepStatus,
    pub log_alpha: f64,
    pub sever_path: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl StepRecord {
    pub fn new(index: u64, status: StepStatus, log_alpha: f64) -> Self {
        Self {
            index,
            status,
            log_alpha,
            sever_path: None,
            before: None,
            after: None,
        }
    }
}

/// A round as it appears in the log, steps in log order.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRecord {
    pub initial_kernel: String,
    pub steps: Vec<StepRecord>,
}

impl RoundRecord {
    pub fn new(initial_kernel: impl Into<String>) -> Self {
        Self {
            initial_kernel: initial_kernel.into(),
            steps: Vec::new(),
        }
    }
}

/// One proposal with both snapshots parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub index: u64,
    pub status: StepStatus,
    pub log_alpha: f64,
    /// Where the mutation happened; `None` means nothing to highlight.
    pub sever_path: Option<Path>,
    pub before: ExpressionNode,
    pub after: ExpressionNode,
}

impl Step {
    /// Parse the snapshots of a record. Missing text parses like empty text.
    pub fn from_record(record: &StepRecord) -> Self {
        let parse = |text: &Option<String>| ExpressionNode::parse(text.as_deref().unwrap_or(""));
        Self {
            index: record.index,
            status: record.status,
            log_alpha: record.log_alpha,
            sever_path: record.sever_path.as_deref().map(Path::parse),
            before: parse(&record.before),
            after: parse(&record.after),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == StepStatus::Accept
    }

    /// The kernel in effect once this step is decided.
    pub fn resulting_kernel(&self) -> &ExpressionNode {
        if self.is_accepted() {
            &self.after
        } else {
            &self.before
        }
    }
}

/// One restart of the search with its steps sorted by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub initial_kernel: ExpressionNode,
    pub steps: Vec<Step>,
}

impl Round {
    pub fn scores(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.log_alpha).collect()
    }

    pub fn accepted_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_accepted()).count()
    }
}

impl From<&RoundRecord> for Round {
    fn from(record: &RoundRecord) -> Self {
        let mut steps: Vec<Step> = record.steps.iter().map(Step::from_record).collect();
        // stable: equal indices keep log order
        steps.sort_by_key(|s| s.index);
        Self {
            initial_kernel: ExpressionNode::parse(&record.initial_kernel),
            steps,
        }
    }
}
