//! Command dispatch: one handler per subcommand

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{LogService, RoundSummary};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, PlanFormat, Settings};
use crate::domain::{ExpressionNode, ParsedLog, Path as NodePath, Round};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::render::{PlanRecorder, RenderCall};
use crate::infrastructure::{InfraError, InfraResult};
use crate::tree_traits::{TreeNodeConvert, MAX_DISPLAY_DEPTH};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Rounds { log }) => rounds(log, cli.strict),
        Some(Commands::Show { log, round }) => show(log, *round, cli.strict),
        Some(Commands::Plan {
            log,
            format,
            output,
            output_dir,
        }) => plan(
            log,
            *format,
            output.as_deref(),
            output_dir.as_deref(),
            cli.strict,
        ),
        Some(Commands::Parse { expr, path }) => parse(expr, path.as_deref()),
        Some(Commands::Config { command }) => config(command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
    }
}

/// Directory of the log, used for the local config layer.
fn log_dir(log: &Path) -> PathBuf {
    match log.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn container_for(log: &Path) -> CliResult<ServiceContainer> {
    let settings = Settings::load(Some(&log_dir(log)))?;
    Ok(ServiceContainer::new(settings))
}

/// Warn about every diagnostic, or fail on the first one in strict mode.
fn report_diagnostics(service: &LogService, parsed: &ParsedLog, strict: bool) -> CliResult<()> {
    if strict {
        service.ensure_clean(parsed)?;
    }
    for d in &parsed.diagnostics {
        output::warning(&format!("line {}: {}", d.line, d.error));
    }
    if parsed.ignored_lines > 0 {
        debug!("{} unrecognized lines ignored", parsed.ignored_lines);
    }
    Ok(())
}

#[instrument]
fn rounds(log: &Path, strict: bool) -> CliResult<()> {
    let container = container_for(log)?;
    let service = container.log_service();
    let parsed = service.read(log)?;
    report_diagnostics(&service, &parsed, strict)?;

    output::header(&format!(
        "{}: {} rounds, {} steps",
        log.display(),
        parsed.rounds.len(),
        parsed.step_count()
    ));
    for (i, round) in service.rounds(&parsed).iter().enumerate() {
        let summary = RoundSummary::of(i + 1, round);
        let range = summary
            .score_range
            .map(|r| format!("[{:.3}, {:.3}]", r.min, r.max))
            .unwrap_or_else(|| "-".to_string());
        output::info(&format!(
            "Round {:02}  steps={:<4} accepted={:<4} chain={} scores={}  init: {}",
            summary.number,
            summary.steps,
            summary.accepted,
            summary.chain_len,
            range,
            summary.initial_kernel
        ));
    }
    Ok(())
}

#[instrument]
fn show(log: &Path, round: Option<usize>, strict: bool) -> CliResult<()> {
    let container = container_for(log)?;
    let service = container.log_service();
    let parsed = service.read(log)?;
    report_diagnostics(&service, &parsed, strict)?;

    let selected: Vec<(usize, Round)> = match round {
        Some(number) => vec![(number, service.round(&parsed, number)?)],
        None => service
            .rounds(&parsed)
            .into_iter()
            .enumerate()
            .map(|(i, r)| (i + 1, r))
            .collect(),
    };

    for (number, round) in &selected {
        output::header(&format!("Round {} init", number));
        output::info(&round.initial_kernel.to_tree_string());

        for step in &round.steps {
            let sever = step
                .sever_path
                .as_ref()
                .map(NodePath::to_text)
                .unwrap_or_else(|| "-".to_string());
            let label = format!("Step {:03} {}", step.index, step.status);
            let msg = format!("log_alpha={:.3} sever={}", step.log_alpha, sever);
            if step.is_accepted() {
                output::accepted(&label, &msg);
            } else {
                output::rejected(&label, &msg);
            }

            let highlight = step.sever_path.as_ref();
            output::detail(&"before:");
            output::info(&step.before.to_tree_highlighted(highlight));
            output::detail(&"after:");
            output::info(&step.after.to_tree_highlighted(highlight));

            if let Some(path) = highlight {
                match (step.before.resolve(path), step.after.resolve(path)) {
                    (Some(b), Some(a)) => output::detail(&format!("mutation @{}: {} -> {}", path, b, a)),
                    _ => output::detail(&format!("mutation @{}: unresolved", path)),
                }
            }
        }
    }
    Ok(())
}

#[instrument]
fn plan(
    log: &Path,
    format: Option<PlanFormat>,
    output_file: Option<&Path>,
    output_dir: Option<&Path>,
    strict: bool,
) -> CliResult<()> {
    if let Some(path) = output_file.filter(|p| p.is_dir()) {
        return Err(CliError::InvalidArgs(format!(
            "--output is a directory: {}",
            path.display()
        )));
    }

    let container = container_for(log)?;
    let service = container.log_service();
    let parsed = service.read(log)?;
    report_diagnostics(&service, &parsed, strict)?;

    let output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| container.settings.output_dir.clone());
    let recorder = Arc::new(PlanRecorder::new(output_dir));
    container
        .timeline_service(recorder.clone())
        .run(&parsed.rounds)?;
    let calls = recorder.calls();

    let rendered = render_plan(&calls, format.unwrap_or(container.settings.format))?;

    match output_file {
        Some(path) => {
            container
                .fs
                .ensure_parent(path)
                .and_then(|_| container.fs.write(path, &rendered))
                .map_err(|e| InfraError::io(format!("write plan {}", path.display()), e))?;
            output::success(&format!("{} render calls written to {}", calls.len(), path.display()));
        }
        None => output::info(&rendered),
    }
    Ok(())
}

fn render_plan(calls: &[RenderCall], format: PlanFormat) -> InfraResult<String> {
    match format {
        PlanFormat::Json => serde_json::to_string_pretty(calls).map_err(|e| InfraError::Serialize {
            message: e.to_string(),
        }),
        PlanFormat::Text => Ok(plan_text(calls)),
    }
}

fn plan_text(calls: &[RenderCall]) -> String {
    let mut text = String::new();
    for (round, group) in &calls.iter().chunk_by(|c| c.round()) {
        text.push_str(&format!("# round {}\n", round));
        for call in group {
            text.push_str(&format!("{}\n", call));
        }
    }
    text
}

#[instrument]
fn parse(expr: &str, path: Option<&str>) -> CliResult<()> {
    let node = ExpressionNode::parse(expr);
    let path = path.map(NodePath::parse);

    output::header(&node.pretty());
    output::info(&node.to_tree_highlighted(path.as_ref()));
    if node.depth() <= MAX_DISPLAY_DEPTH {
        for (p, n) in node.iter_with_paths() {
            let label = n
                .name()
                .map(str::to_string)
                .or_else(|| n.operator().map(String::from))
                .unwrap_or_default();
            output::detail(&format!("{:<8} {}", p.to_text(), label));
        }
    } else {
        output::detail(&format!(
            "{} nodes over {} levels: path listing skipped",
            node.node_count(),
            node.depth()
        ));
    }

    if let Some(path) = path {
        match node.resolve(&path) {
            Some(found) => output::success(&format!("{} -> {}", path, found)),
            None => output::warning(&format!("{}: no match", path)),
        }
    }
    if node.has_placeholder() {
        output::warning(&"expression contains placeholder leaves");
    }
    Ok(())
}

fn config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show { dir } => {
            let settings = Settings::load(dir.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path { dir } => {
            match global_config_path() {
                Some(p) => output::info(&format!("global: {}", p.display())),
                None => output::info(&"global: (no config directory)"),
            }
            let dir = dir.clone().unwrap_or_else(|| PathBuf::from("."));
            output::info(&format!("local:  {}", local_config_path(&dir).display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_text_groups_by_round() {
        let calls = vec![
            RenderCall::Animation {
                round: 1,
                target: PathBuf::from("out/round_01_mutation"),
                frames: vec![],
                frame_duration_ms: 900,
            },
            RenderCall::Animation {
                round: 2,
                target: PathBuf::from("out/round_02_mutation"),
                frames: vec![],
                frame_duration_ms: 900,
            },
        ];
        let text = plan_text(&calls);
        assert!(text.starts_with("# round 1\nanimation"));
        assert!(text.contains("# round 2\n"));
    }

    #[test]
    fn test_render_plan_json_is_tagged_by_call() {
        let calls = vec![RenderCall::Animation {
            round: 1,
            target: PathBuf::from("out/round_01_mutation"),
            frames: vec![PathBuf::from("out/round_01_step_000_accept_frame")],
            frame_duration_ms: 900,
        }];
        let json = render_plan(&calls, PlanFormat::Json).unwrap();
        assert!(json.contains("\"call\": \"animation\""));
        assert!(json.contains("\"frame_duration_ms\": 900"));
    }

    #[test]
    fn test_log_dir_of_bare_file_is_cwd() {
        assert_eq!(log_dir(Path::new("run.log")), PathBuf::from("."));
        assert_eq!(log_dir(Path::new("logs/run.log")), PathBuf::from("logs"));
    }
}
