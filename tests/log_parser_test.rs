//! Tests for LogParser: grouping run log lines into rounds and steps

use rstest::rstest;

use kerneltrace::domain::{
    DomainError, ExpressionNode, LogParser, Path, Round, StepStatus,
};

const RUN_LOG: &str = include_str!("resources/log_run.txt");

#[test]
fn given_single_round_log_when_parsing_then_builds_round_with_step() {
    // Arrange
    let text = "Init: (A + B)\n\
                Step 0 | accept | log_alpha=-0.5\n\
                Sever path: L\n\
                Before: ([[A]] + B)\n\
                After : ([[C]] + B)\n";

    // Act
    let parsed = LogParser::new().parse(text);

    // Assert
    assert_eq!(parsed.rounds.len(), 1);
    let round = &parsed.rounds[0];
    assert_eq!(round.initial_kernel, "(A + B)");
    assert_eq!(round.steps.len(), 1);

    let step = &round.steps[0];
    assert_eq!(step.index, 0);
    assert_eq!(step.status, StepStatus::Accept);
    assert_eq!(step.log_alpha, -0.5);
    assert_eq!(step.sever_path.as_deref(), Some("L"));
    assert_eq!(step.before.as_deref(), Some("([[A]] + B)"));
    assert_eq!(step.after.as_deref(), Some("([[C]] + B)"));
    assert!(parsed.diagnostics.is_empty());
}

#[test]
fn given_log_without_init_when_parsing_then_yields_no_rounds() {
    let parsed = LogParser::new().parse("starting search\nno rounds today\n");

    assert!(parsed.rounds.is_empty());
    assert_eq!(parsed.ignored_lines, 2);
}

#[test]
fn given_empty_text_when_parsing_then_yields_nothing() {
    let parsed = LogParser::new().parse("");

    assert!(parsed.rounds.is_empty());
    assert!(parsed.diagnostics.is_empty());
    assert_eq!(parsed.ignored_lines, 0);
}

#[test]
fn given_run_log_when_parsing_then_round_count_matches_init_lines() {
    // Arrange
    let init_lines = RUN_LOG
        .lines()
        .filter(|l| l.trim_start().starts_with("Init: "))
        .count();

    // Act
    let parsed = LogParser::new().parse(RUN_LOG);

    // Assert
    assert_eq!(parsed.rounds.len(), init_lines);
    assert_eq!(parsed.rounds.len(), 3);
    assert_eq!(
        parsed.rounds.iter().map(|r| r.steps.len()).collect::<Vec<_>>(),
        vec![6, 1, 0]
    );
    assert_eq!(parsed.step_count(), 7);
}

#[test]
fn given_run_log_when_parsing_then_reports_corrupt_lines_with_line_numbers() {
    // Act
    let parsed = LogParser::new().parse(RUN_LOG);

    // Assert
    assert_eq!(parsed.diagnostics.len(), 2);
    assert_eq!(parsed.diagnostics[0].line, 40);
    assert!(matches!(
        parsed.diagnostics[0].error,
        DomainError::InvalidMetric {
            field: "log_alpha",
            ..
        }
    ));
    assert_eq!(parsed.diagnostics[1].line, 41);
    assert!(matches!(
        parsed.diagnostics[1].error,
        DomainError::DetailOutsideStep { field: "Before" }
    ));
    // banner, seed line and elapsed time
    assert_eq!(parsed.ignored_lines, 3);
}

#[test]
fn given_out_of_order_steps_when_building_round_then_steps_are_sorted_by_index() {
    // Arrange
    let parsed = LogParser::new().parse(RUN_LOG);

    // Act
    let round = Round::from(&parsed.rounds[0]);

    // Assert
    let indices: Vec<u64> = round.steps.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    assert!(round.steps.windows(2).all(|w| w[0].index <= w[1].index));
    assert_eq!(round.accepted_count(), 5);
}

#[test]
fn given_step_records_when_building_round_then_snapshots_are_parsed_trees() {
    // Arrange
    let parsed = LogParser::new().parse(RUN_LOG);

    // Act
    let round = Round::from(&parsed.rounds[0]);

    // Assert
    assert_eq!(round.initial_kernel, ExpressionNode::parse("(RBF1 + PER2)"));
    let step = &round.steps[0];
    assert_eq!(step.sever_path, Some(Path::parse("L")));
    assert_eq!(step.before.pretty(), "(RBF1 + PER2)");
    assert_eq!(step.after.pretty(), "(LIN1 + PER2)");
    assert_eq!(round.steps[1].sever_path, Some(Path::root()));
}

#[rstest]
#[case("-1.5e-1", -0.15)]
#[case("+2", 2.0)]
#[case("0.125", 0.125)]
fn given_log_alpha_notation_when_parsing_then_reads_value(
    #[case] raw: &str,
    #[case] expected: f64,
) {
    let text = format!("Init: A\nStep 3 | reject | log_alpha={}\n", raw);

    let parsed = LogParser::new().parse(&text);

    let step = &parsed.rounds[0].steps[0];
    assert_eq!(step.status, StepStatus::Reject);
    assert!((step.log_alpha - expected).abs() < 1e-12);
}

#[rstest]
#[case("nan")]
#[case("inf")]
#[case("1.2.3")]
fn given_corrupt_log_alpha_when_parsing_then_drops_step_and_its_details(#[case] raw: &str) {
    // Arrange
    let text = format!(
        "Init: A\nStep 0 | accept | log_alpha={}\nSever path: L\nBefore: A\nAfter : B\n",
        raw
    );

    // Act
    let parsed = LogParser::new().parse(&text);

    // Assert
    assert!(parsed.rounds[0].steps.is_empty());
    // header plus three orphaned detail lines
    assert_eq!(parsed.diagnostics.len(), 4);
}

#[test]
fn given_step_before_any_init_when_parsing_then_reports_step_outside_round() {
    let parsed = LogParser::new().parse("Step 0 | accept | log_alpha=0.1\nInit: A\n");

    assert_eq!(parsed.rounds.len(), 1);
    assert!(parsed.rounds[0].steps.is_empty());
    assert_eq!(parsed.diagnostics[0].error, DomainError::StepOutsideRound);
    assert_eq!(parsed.diagnostics[0].line, 1);
}

#[test]
fn given_step_without_details_when_building_round_then_uses_placeholders() {
    // Arrange
    let parsed = LogParser::new().parse("Init: A\nStep 0 | accept | log_alpha=0\n");

    // Act
    let round = Round::from(&parsed.rounds[0]);

    // Assert
    let step = &round.steps[0];
    assert_eq!(step.sever_path, None);
    assert!(step.before.has_placeholder());
    assert!(step.after.has_placeholder());
}
