//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io;
use std::path::Path;

use crate::domain::render::{
    AnimationRequest, ChainRequest, FrameRequest, KernelGraphRequest, MutationRequest,
};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Drawing and compositing collaborator driven by the run timeline.
///
/// Implementations must tolerate concurrent calls from different rounds.
/// Calls for one round always arrive from one thread, in timeline order.
pub trait RenderCollaborator: Send + Sync {
    /// Draw a single kernel tree, optionally highlighting one node.
    fn kernel_graph(&self, request: &KernelGraphRequest<'_>) -> io::Result<()>;

    /// Draw a before/after pair, linking the correlated node if any.
    fn kernel_mutation(&self, request: &MutationRequest<'_>) -> io::Result<()>;

    /// Draw the chain of kernels in effect.
    fn kernel_chain(&self, request: &ChainRequest<'_>) -> io::Result<()>;

    /// Compose one animation frame from a mutation image and a score plot.
    fn score_frame(&self, request: &FrameRequest<'_>) -> io::Result<()>;

    /// Assemble frames into an animation.
    fn animation(&self, request: &AnimationRequest) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
