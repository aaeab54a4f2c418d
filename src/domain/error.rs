//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Local failures found while reading a run log.
///
/// None of these abort a parse: the offending line is dropped and the error
/// is kept as a diagnostic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid {field} in step header: {value:?}")]
    InvalidMetric { field: &'static str, value: String },

    #[error("unknown step status: {0:?}")]
    UnknownStatus(String),

    #[error("step header before any Init line")]
    StepOutsideRound,

    #[error("{field} line without a preceding step header")]
    DetailOutsideStep { field: &'static str },
}
