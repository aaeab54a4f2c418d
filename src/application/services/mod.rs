//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, RenderCollaborator)
//! but are themselves concrete structs, not traits.

mod log;
mod timeline;

pub use log::LogService;
pub use timeline::{RoundSummary, TimelineService};
