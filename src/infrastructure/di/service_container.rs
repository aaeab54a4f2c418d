//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{LogService, TimelineService};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem, RenderCollaborator};

/// Container holding settings and I/O boundaries shared by all services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs }
    }

    pub fn log_service(&self) -> LogService {
        LogService::new(Arc::clone(&self.fs))
    }

    /// Timeline driving the given render collaborator.
    pub fn timeline_service(&self, renderer: Arc<dyn RenderCollaborator>) -> TimelineService {
        TimelineService::new(renderer, Arc::clone(&self.settings))
    }
}
