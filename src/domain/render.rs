//! Render requests: what a drawing collaborator is asked to produce.
//!
//! Requests borrow the trees of the round being processed. Artifact names
//! are bare stems (`round_01_step_003_accept_before`); where and in which
//! format they are written is up to the collaborator.

use serde::Serialize;

use crate::domain::entities::StepStatus;
use crate::domain::expression::ExpressionNode;
use crate::domain::path::Path;

/// Maximum number of kernels in a round's chain, initial kernel included.
pub const CHAIN_LENGTH: usize = 5;

/// Fraction of the score span added on each side of the y-axis.
pub const SCORE_PADDING: f64 = 0.1;

/// Title of every cumulative score plot.
pub const SCORE_PLOT_TITLE: &str = "Score by step";

/// How a highlighted node should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightRole {
    /// Node about to be replaced (before snapshot)
    Pending,
    /// Node after the mutation (after snapshot)
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub path: Path,
    pub role: HighlightRole,
}

/// Padded y-axis limits shared by all score plots of a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self {
            min: -1.0,
            max: 1.0,
        }
    }
}

impl ScoreRange {
    /// Span of `scores` widened by [`SCORE_PADDING`] per side, or by 1.0 when
    /// all scores are equal. `None` for no scores.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        let (lo, hi) = scores.iter().fold(None, |acc: Option<(f64, f64)>, &s| match acc {
            None => Some((s, s)),
            Some((lo, hi)) => Some((lo.min(s), hi.max(s))),
        })?;
        let pad = if hi > lo { (hi - lo) * SCORE_PADDING } else { 1.0 };
        Some(Self {
            min: lo - pad,
            max: hi + pad,
        })
    }

    pub fn contains(&self, score: f64) -> bool {
        self.min <= score && score <= self.max
    }
}

/// Artifact stem shared by the three snapshots of one step.
pub fn step_prefix(round: usize, index: u64, status: StepStatus) -> String {
    format!("round_{:02}_step_{:03}_{}", round, index, status)
}

pub fn init_artifact(round: usize) -> String {
    format!("round_{:02}_init", round)
}

pub fn chain_artifact(round: usize) -> String {
    format!("round_{:02}_chain_{}", round, CHAIN_LENGTH)
}

pub fn animation_artifact(round: usize) -> String {
    format!("round_{:02}_mutation", round)
}

/// Draw one kernel tree.
#[derive(Debug, Clone, Serialize)]
pub struct KernelGraphRequest<'a> {
    pub round: usize,
    pub artifact: String,
    pub title: String,
    pub kernel: &'a ExpressionNode,
    pub highlight: Option<Highlight>,
    pub score: Option<f64>,
}

/// The sever-path node located independently in both snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct Correlation<'a> {
    pub path: &'a Path,
    pub before: &'a ExpressionNode,
    pub after: &'a ExpressionNode,
}

/// Draw a before/after pair with the mutated node linked across them.
#[derive(Debug, Clone, Serialize)]
pub struct MutationRequest<'a> {
    pub round: usize,
    pub artifact: String,
    pub title: String,
    pub before: &'a ExpressionNode,
    pub after: &'a ExpressionNode,
    pub sever_path: Option<&'a Path>,
    /// `None` when the sever path does not resolve on either side
    pub correlation: Option<Correlation<'a>>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChainEntry<'a> {
    pub kernel: &'a ExpressionNode,
    pub score: Option<f64>,
}

/// Draw the chain of kernels in effect, left to right.
#[derive(Debug, Clone, Serialize)]
pub struct ChainRequest<'a> {
    pub round: usize,
    pub artifact: String,
    pub title: String,
    pub entries: Vec<ChainEntry<'a>>,
}

/// Stack a mutation image above a score plot of every score so far.
#[derive(Debug, Clone, Serialize)]
pub struct FrameRequest<'a> {
    pub round: usize,
    pub artifact: String,
    pub mutation_artifact: String,
    pub plot_title: &'static str,
    pub scores: &'a [f64],
    pub total_steps: usize,
    pub y_limits: ScoreRange,
}

/// Assemble frames, in order, into one looping animation.
#[derive(Debug, Clone, Serialize)]
pub struct AnimationRequest {
    pub round: usize,
    pub artifact: String,
    pub frames: Vec<String>,
    pub frame_duration_ms: u64,
}
