//! Run timeline service
//!
//! Turns parsed rounds into an ordered sequence of render requests. Per round:
//!
//! 1. the initial kernel
//! 2. for each step, by index: before snapshot, after snapshot, mutation,
//!    score frame
//! 3. the chain, if it holds at least two kernels
//! 4. the animation, if at least one frame was produced
//!
//! Nothing is drawn here; every request goes to a [`RenderCollaborator`].

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::render::{
    animation_artifact, chain_artifact, init_artifact, step_prefix, AnimationRequest,
    ChainEntry, ChainRequest, Correlation, FrameRequest, Highlight, HighlightRole,
    KernelGraphRequest, MutationRequest, ScoreRange, CHAIN_LENGTH, SCORE_PLOT_TITLE,
};
use crate::domain::{Round, RoundRecord, Step};
use crate::infrastructure::traits::RenderCollaborator;

/// What was requested for one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    /// 1-based round number
    pub number: usize,
    pub initial_kernel: String,
    pub steps: usize,
    pub accepted: usize,
    pub chain_len: usize,
    pub frames: usize,
    pub score_range: Option<ScoreRange>,
}

impl RoundSummary {
    /// Summary of a round without issuing any request.
    pub fn of(number: usize, round: &Round) -> Self {
        let steps = round.steps.len();
        Self {
            number,
            initial_kernel: round.initial_kernel.pretty(),
            steps,
            accepted: round.accepted_count(),
            chain_len: (steps + 1).min(CHAIN_LENGTH),
            frames: steps,
            score_range: ScoreRange::from_scores(&round.scores()),
        }
    }
}

/// Service sequencing render requests over the rounds of a run.
pub struct TimelineService {
    renderer: Arc<dyn RenderCollaborator>,
    settings: Arc<Settings>,
}

impl TimelineService {
    pub fn new(renderer: Arc<dyn RenderCollaborator>, settings: Arc<Settings>) -> Self {
        Self { renderer, settings }
    }

    /// Process all rounds, numbered from 1 in log order.
    ///
    /// Rounds share no state; with `parallel_rounds` set they are processed
    /// concurrently and the collaborator sees their requests interleaved.
    #[instrument(level = "debug", skip_all, fields(rounds = records.len()))]
    pub fn run(&self, records: &[RoundRecord]) -> ApplicationResult<Vec<RoundSummary>> {
        let summaries = if self.settings.parallel_rounds {
            records
                .par_iter()
                .enumerate()
                .map(|(i, record)| self.run_round(i + 1, &Round::from(record)))
                .collect::<ApplicationResult<Vec<_>>>()?
        } else {
            records
                .iter()
                .enumerate()
                .map(|(i, record)| self.run_round(i + 1, &Round::from(record)))
                .collect::<ApplicationResult<Vec<_>>>()?
        };
        info!("requested renders for {} rounds", summaries.len());
        Ok(summaries)
    }

    /// Issue every request for one round.
    #[instrument(level = "debug", skip(self, round), fields(steps = round.steps.len()))]
    pub fn run_round(&self, number: usize, round: &Round) -> ApplicationResult<RoundSummary> {
        let y_limits = ScoreRange::from_scores(&round.scores()).unwrap_or_default();

        let init = KernelGraphRequest {
            round: number,
            artifact: init_artifact(number),
            title: format!("Round {} init", number),
            kernel: &round.initial_kernel,
            highlight: None,
            score: None,
        };
        self.renderer
            .kernel_graph(&init)
            .with_artifact_context("render kernel", &init.artifact)?;

        let mut chain = vec![ChainEntry {
            kernel: &round.initial_kernel,
            score: None,
        }];
        let mut scores: Vec<f64> = Vec::with_capacity(round.steps.len());
        let mut frames: Vec<String> = Vec::with_capacity(round.steps.len());

        for step in &round.steps {
            scores.push(step.log_alpha);
            let frame = self.run_step(number, step, &scores, round.steps.len(), y_limits)?;
            frames.push(frame);

            if chain.len() < CHAIN_LENGTH {
                chain.push(ChainEntry {
                    kernel: step.resulting_kernel(),
                    score: Some(step.log_alpha),
                });
            }
        }

        let chain_len = chain.len();
        if chain_len >= 2 {
            let request = ChainRequest {
                round: number,
                artifact: chain_artifact(number),
                title: format!("Round {} chain (first {} steps)", number, chain_len),
                entries: chain,
            };
            self.renderer
                .kernel_chain(&request)
                .with_artifact_context("render chain", &request.artifact)?;
        }

        let frame_count = frames.len();
        if !frames.is_empty() {
            let request = AnimationRequest {
                round: number,
                artifact: animation_artifact(number),
                frames,
                frame_duration_ms: self.settings.frame_duration_ms,
            };
            self.renderer
                .animation(&request)
                .with_artifact_context("assemble animation", &request.artifact)?;
        }

        debug!(
            "round {}: {} steps, chain of {}, {} frames",
            number,
            round.steps.len(),
            chain_len,
            frame_count
        );
        Ok(RoundSummary {
            chain_len,
            frames: frame_count,
            ..RoundSummary::of(number, round)
        })
    }

    /// Snapshots, mutation and score frame of one step. Returns the frame artifact.
    fn run_step(
        &self,
        number: usize,
        step: &Step,
        scores: &[f64],
        total_steps: usize,
        y_limits: ScoreRange,
    ) -> ApplicationResult<String> {
        let prefix = step_prefix(number, step.index, step.status);
        let highlight = |role: HighlightRole| {
            step.sever_path
                .clone()
                .map(|path| Highlight { path, role })
        };

        for (kernel, role, side) in [
            (&step.before, HighlightRole::Pending, "before"),
            (&step.after, HighlightRole::Accepted, "after"),
        ] {
            let request = KernelGraphRequest {
                round: number,
                artifact: format!("{}_{}", prefix, side),
                title: format!("Round {} step {:03} {}", number, step.index, side),
                kernel,
                highlight: highlight(role),
                score: Some(step.log_alpha),
            };
            self.renderer
                .kernel_graph(&request)
                .with_artifact_context("render kernel", &request.artifact)?;
        }

        let mutation = MutationRequest {
            round: number,
            artifact: format!("{}_mutation", prefix),
            title: format!("Round {} step {:03} mutation", number, step.index),
            before: &step.before,
            after: &step.after,
            sever_path: step.sever_path.as_ref(),
            correlation: correlate(step),
            score: step.log_alpha,
        };
        self.renderer
            .kernel_mutation(&mutation)
            .with_artifact_context("render mutation", &mutation.artifact)?;

        let frame = FrameRequest {
            round: number,
            artifact: format!("{}_frame", prefix),
            mutation_artifact: mutation.artifact.clone(),
            plot_title: SCORE_PLOT_TITLE,
            scores,
            total_steps,
            y_limits,
        };
        self.renderer
            .score_frame(&frame)
            .with_artifact_context("compose frame", &frame.artifact)?;

        Ok(frame.artifact)
    }
}

/// Locate the sever-path node in both snapshots; `None` unless both resolve.
fn correlate(step: &Step) -> Option<Correlation<'_>> {
    let path = step.sever_path.as_ref()?;
    Some(Correlation {
        path,
        before: step.before.resolve(path)?,
        after: step.after.resolve(path)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExpressionNode, Path, StepStatus};

    fn step(sever: Option<&str>, before: &str, after: &str) -> Step {
        Step {
            index: 0,
            status: StepStatus::Accept,
            log_alpha: 0.0,
            sever_path: sever.map(Path::parse),
            before: ExpressionNode::parse(before),
            after: ExpressionNode::parse(after),
        }
    }

    #[test]
    fn test_correlate_both_sides() {
        let s = step(Some("L"), "(A + B)", "(C * D)");
        let c = correlate(&s).unwrap();
        assert_eq!(c.before.name(), Some("A"));
        assert_eq!(c.after.name(), Some("C"));
    }

    #[test]
    fn test_correlate_leaf_side_fails() {
        assert!(correlate(&step(Some("L"), "RBF1", "(C * D)")).is_none());
        assert!(correlate(&step(Some("L"), "(A + B)", "PER1")).is_none());
    }

    #[test]
    fn test_correlate_without_sever_path() {
        assert!(correlate(&step(None, "(A + B)", "(C * D)")).is_none());
    }

    #[test]
    fn test_correlate_root() {
        let s = step(Some("root"), "A", "B");
        let c = correlate(&s).unwrap();
        assert_eq!(c.before.name(), Some("A"));
        assert_eq!(c.after.name(), Some("B"));
    }
}
