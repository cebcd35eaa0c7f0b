use super::*;
use sf_core::Direction;

#[test]
fn test_column_widths_fit_longest_cell() {
    let rows = vec![
        vec!["20180101000000_CreateContentTables".to_string(), "applied".to_string()],
        vec!["x".to_string(), "pending".to_string()],
    ];
    assert_eq!(calculate_column_widths(&["ID", "STATE"], &rows), vec![34, 7]);
}

#[test]
fn test_column_widths_count_characters() {
    let rows = vec![vec!["✓".to_string()]];
    assert_eq!(calculate_column_widths(&["A"], &rows), vec![1]);
}

#[test]
fn test_report_line_for_forced_revert() {
    let report = UnitReport {
        id: "20230905140307_GrantUpdateOnPermalinks".to_string(),
        direction: Direction::Down,
        statements: 0,
        skipped: vec![],
        execution_ms: 0,
        forced: true,
    };
    assert_eq!(
        report_line(&report),
        "  ✓ 20230905140307_GrantUpdateOnPermalinks (history entry removed, no SQL run)"
    );
}

#[test]
fn test_report_line_lists_skipped_operations() {
    let report = UnitReport {
        id: "20230905140307_GrantUpdateOnPermalinks".to_string(),
        direction: Direction::Up,
        statements: 0,
        skipped: vec!["duckdb has no roles, skipped grant".to_string()],
        execution_ms: 3,
        forced: false,
    };
    let line = report_line(&report);
    assert!(line.starts_with("  ✓ 20230905140307_GrantUpdateOnPermalinks (0 statements, 3ms)"));
    assert!(line.ends_with("skipped: duckdb has no roles, skipped grant"));
}

#[test]
fn test_database_errors_exit_with_code_four() {
    let err = runner_error(LedgerError::Db(sf_db::DbError::ExecutionError(
        "boom".to_string(),
    )));
    assert!(matches!(err.downcast_ref::<ExitCode>(), Some(ExitCode(4))));

    let err = runner_error(LedgerError::TargetNotApplied {
        id: "20180101000000_CreateContentTables".to_string(),
    });
    assert!(err.downcast_ref::<ExitCode>().is_none());
    assert!(err.to_string().contains("[L003]"));
}
