//! Domain layer: expression trees, node paths, run log records, render requests
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod expression;
pub mod log;
pub mod path;
pub mod render;

pub use entities::*;
pub use error::DomainError;
pub use expression::{ExpressionNode, EMPTY_TOKEN, EXHAUSTED};
pub use log::{Diagnostic, LogParser, ParsedLog};
pub use path::{Direction, Path};
