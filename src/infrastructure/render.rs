//! Plan recorder: a render collaborator that draws nothing and records
//! every request it receives, with artifact names resolved against the
//! output directory.

use std::fmt;
use std::io;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Mutex;

use itertools::Itertools;
use serde::Serialize;
use tracing::trace;

use crate::domain::render::{
    AnimationRequest, ChainRequest, FrameRequest, Highlight, KernelGraphRequest,
    MutationRequest, ScoreRange,
};
use crate::domain::Path;
use crate::infrastructure::traits::RenderCollaborator;

/// Sever-path node as found in both snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedNodes {
    pub path: Path,
    pub before: String,
    pub after: String,
}

/// One recorded request, trees flattened to their pretty form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum RenderCall {
    KernelGraph {
        round: usize,
        target: PathBuf,
        title: String,
        kernel: String,
        highlight: Option<Highlight>,
        score: Option<f64>,
    },
    Mutation {
        round: usize,
        target: PathBuf,
        title: String,
        before: String,
        after: String,
        sever_path: Option<Path>,
        correlation: Option<CorrelatedNodes>,
        score: f64,
    },
    Chain {
        round: usize,
        target: PathBuf,
        title: String,
        kernels: Vec<String>,
        scores: Vec<Option<f64>>,
    },
    Frame {
        round: usize,
        target: PathBuf,
        mutation: PathBuf,
        plot_title: String,
        scores: Vec<f64>,
        total_steps: usize,
        y_limits: ScoreRange,
    },
    Animation {
        round: usize,
        target: PathBuf,
        frames: Vec<PathBuf>,
        frame_duration_ms: u64,
    },
}

impl RenderCall {
    pub fn round(&self) -> usize {
        match self {
            RenderCall::KernelGraph { round, .. }
            | RenderCall::Mutation { round, .. }
            | RenderCall::Chain { round, .. }
            | RenderCall::Frame { round, .. }
            | RenderCall::Animation { round, .. } => *round,
        }
    }

    pub fn target(&self) -> &FsPath {
        match self {
            RenderCall::KernelGraph { target, .. }
            | RenderCall::Mutation { target, .. }
            | RenderCall::Chain { target, .. }
            | RenderCall::Frame { target, .. }
            | RenderCall::Animation { target, .. } => target,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RenderCall::KernelGraph { .. } => "graph",
            RenderCall::Mutation { .. } => "mutation",
            RenderCall::Chain { .. } => "chain",
            RenderCall::Frame { .. } => "frame",
            RenderCall::Animation { .. } => "animation",
        }
    }
}

fn fmt_score(score: Option<f64>) -> String {
    score.map_or_else(|| "-".to_string(), |s| format!("{:.3}", s))
}

impl fmt::Display for RenderCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<9} {}", self.kind(), self.target().display())?;
        match self {
            RenderCall::KernelGraph {
                kernel,
                highlight,
                score,
                ..
            } => {
                write!(f, " score={} {}", fmt_score(*score), kernel)?;
                if let Some(h) = highlight {
                    write!(f, " @{} ({:?})", h.path, h.role)?;
                }
                Ok(())
            }
            RenderCall::Mutation {
                before,
                after,
                sever_path,
                correlation,
                score,
                ..
            } => {
                write!(f, " score={:.3} {} -> {}", score, before, after)?;
                match (sever_path, correlation) {
                    (Some(_), Some(c)) => write!(f, " @{}: {} -> {}", c.path, c.before, c.after),
                    (Some(p), None) => write!(f, " @{}: unresolved", p),
                    (None, _) => Ok(()),
                }
            }
            RenderCall::Chain { kernels, scores, .. } => write!(
                f,
                " {}",
                kernels
                    .iter()
                    .zip(scores)
                    .map(|(k, s)| format!("{} [{}]", k, fmt_score(*s)))
                    .join(" => ")
            ),
            RenderCall::Frame {
                scores, y_limits, ..
            } => write!(
                f,
                " {} scores, y=[{:.3}, {:.3}]",
                scores.len(),
                y_limits.min,
                y_limits.max
            ),
            RenderCall::Animation {
                frames,
                frame_duration_ms,
                ..
            } => write!(f, " {} frames @ {}ms", frames.len(), frame_duration_ms),
        }
    }
}

/// Records requests instead of drawing them.
#[derive(Debug)]
pub struct PlanRecorder {
    output_dir: PathBuf,
    calls: Mutex<Vec<RenderCall>>,
}

impl PlanRecorder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn target(&self, artifact: &str) -> PathBuf {
        self.output_dir.join(artifact)
    }

    fn record(&self, call: RenderCall) -> io::Result<()> {
        trace!("record: {}", call);
        self.calls
            .lock()
            .map_err(|_| io::Error::other("plan recorder lock poisoned"))?
            .push(call);
        Ok(())
    }

    /// Recorded calls grouped by round; order within a round is preserved.
    pub fn calls(&self) -> Vec<RenderCall> {
        let mut calls = self
            .calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone());
        calls.sort_by_key(RenderCall::round);
        calls
    }
}

impl RenderCollaborator for PlanRecorder {
    fn kernel_graph(&self, request: &KernelGraphRequest<'_>) -> io::Result<()> {
        self.record(RenderCall::KernelGraph {
            round: request.round,
            target: self.target(&request.artifact),
            title: request.title.clone(),
            kernel: request.kernel.pretty(),
            highlight: request.highlight.clone(),
            score: request.score,
        })
    }

    fn kernel_mutation(&self, request: &MutationRequest<'_>) -> io::Result<()> {
        self.record(RenderCall::Mutation {
            round: request.round,
            target: self.target(&request.artifact),
            title: request.title.clone(),
            before: request.before.pretty(),
            after: request.after.pretty(),
            sever_path: request.sever_path.cloned(),
            correlation: request.correlation.as_ref().map(|c| CorrelatedNodes {
                path: c.path.clone(),
                before: c.before.pretty(),
                after: c.after.pretty(),
            }),
            score: request.score,
        })
    }

    fn kernel_chain(&self, request: &ChainRequest<'_>) -> io::Result<()> {
        self.record(RenderCall::Chain {
            round: request.round,
            target: self.target(&request.artifact),
            title: request.title.clone(),
            kernels: request.entries.iter().map(|e| e.kernel.pretty()).collect(),
            scores: request.entries.iter().map(|e| e.score).collect(),
        })
    }

    fn score_frame(&self, request: &FrameRequest<'_>) -> io::Result<()> {
        self.record(RenderCall::Frame {
            round: request.round,
            target: self.target(&request.artifact),
            mutation: self.target(&request.mutation_artifact),
            plot_title: request.plot_title.to_string(),
            scores: request.scores.to_vec(),
            total_steps: request.total_steps,
            y_limits: request.y_limits,
        })
    }

    fn animation(&self, request: &AnimationRequest) -> io::Result<()> {
        self.record(RenderCall::Animation {
            round: request.round,
            target: self.target(&request.artifact),
            frames: request.frames.iter().map(|f| self.target(f)).collect(),
            frame_duration_ms: request.frame_duration_ms,
        })
    }
}
