//! Reconstruct kernel-search runs from flat text logs.
//!
//! A run log is grouped into rounds and steps ([`domain::LogParser`]), kernel
//! expressions become binary trees ([`domain::ExpressionNode`]) addressed by
//! `L`/`R` paths ([`domain::Path`]), and the run timeline
//! ([`application::services::TimelineService`]) sequences the render requests
//! a drawing collaborator receives.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
