//! End-to-end tests through the ServiceContainer: log file in, render plan out

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use kerneltrace::config::Settings;
use kerneltrace::infrastructure::di::ServiceContainer;
use kerneltrace::infrastructure::render::PlanRecorder;
use kerneltrace::infrastructure::traits::{FileSystem, RealFileSystem};

const RUN_LOG: &str = include_str!("resources/log_run.txt");

#[test]
fn given_run_log_when_planning_then_writes_json_plan_to_nested_path() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("run.log");
    fs::write(&log, RUN_LOG).unwrap();
    let container = ServiceContainer::with_deps(Settings::default(), Arc::new(RealFileSystem));
    let recorder = Arc::new(PlanRecorder::new(temp.path().join("viz")));

    // Act
    let parsed = container.log_service().read(&log).unwrap();
    let summaries = container
        .timeline_service(recorder.clone())
        .run(&parsed.rounds)
        .unwrap();
    let plan = serde_json::to_string_pretty(&recorder.calls()).unwrap();
    let target = temp.path().join("plans/nested/run.json");
    container.fs.ensure_parent(&target).unwrap();
    container.fs.write(&target, &plan).unwrap();

    // Assert
    assert_eq!(summaries.len(), 3);
    let written: serde_json::Value =
        serde_json::from_str(&container.fs.read_to_string(&target).unwrap()).unwrap();
    let calls = written.as_array().unwrap();
    assert_eq!(calls.len(), 35);
    assert_eq!(calls[0]["call"], "kernel_graph");
    assert_eq!(calls[0]["title"], "Round 1 init");
    assert_eq!(calls[0]["kernel"], "(RBF1 + PER2)");
    assert_eq!(calls[3]["call"], "mutation");
    assert_eq!(calls[3]["sever_path"], "L");
    assert_eq!(calls[3]["correlation"]["before"], "RBF1");
}

#[test]
fn given_highlighted_step_when_planning_then_json_carries_highlight_role() {
    // Arrange
    let container = ServiceContainer::new(Settings::default());
    let recorder = Arc::new(PlanRecorder::new("out"));
    let parsed = container.log_service().parse_text(RUN_LOG);

    // Act
    container
        .timeline_service(recorder.clone())
        .run(&parsed.rounds)
        .unwrap();
    let plan = serde_json::to_value(recorder.calls()).unwrap();

    // Assert
    assert_eq!(plan[1]["title"], "Round 1 step 000 before");
    assert_eq!(plan[1]["highlight"]["path"], "L");
    assert_eq!(plan[2]["title"], "Round 1 step 000 after");
    assert!(plan[2]["highlight"]["role"].is_string());
    assert_ne!(plan[1]["highlight"]["role"], plan[2]["highlight"]["role"]);
}
