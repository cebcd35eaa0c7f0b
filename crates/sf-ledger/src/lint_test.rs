use super::*;
use sf_core::operation::{AddColumn, CreateIndex};
use sf_core::{ColumnDef, Dialect, MigrationId};

fn unit(id: &str, up: Vec<Operation>, down: Vec<Operation>, note: Option<&str>) -> Migration {
    Migration::new(
        MigrationId::parse(id).unwrap(),
        up,
        down,
        note.map(str::to_string),
    )
    .unwrap()
}

fn sql(s: &str) -> Operation {
    Operation::Sql(s.to_string())
}

#[test]
fn test_clean_ledger_has_no_findings() {
    let ledger = Ledger::from_migrations(vec![unit(
        "20200101000000_CreateReleases",
        vec![sql("CREATE TABLE Releases (Id INTEGER)")],
        vec![sql("DROP TABLE Releases")],
        None,
    )])
    .unwrap();
    assert!(lint(&ledger, Dialect::DuckDb).is_empty());
}

#[test]
fn test_reversibility_and_transaction_warnings() {
    let ledger = Ledger::from_migrations(vec![
        unit(
            "20230905140307_GrantUpdateOnPermalinks",
            vec![sql("SELECT 1")],
            vec![],
            Some("grants are forward-only"),
        ),
        unit(
            "20231001000000_MergeDuplicateSlugs",
            vec![sql("SELECT 1")],
            vec![sql("SELECT 2")],
            Some("merged rows are not split again"),
        )
        .non_transactional(),
    ])
    .unwrap();

    let findings = lint(&ledger, Dialect::DuckDb);
    let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "irreversible: grants are forward-only",
            "partially reversible: merged rows are not split again",
            "runs outside a transaction; a failure needs manual cleanup",
        ]
    );
    assert!(!has_errors(&findings));
}

#[test]
fn test_not_null_column_without_default_is_an_error() {
    let ledger = Ledger::from_migrations(vec![unit(
        "20200201000000_AddTimeIdentifierToRelease",
        vec![Operation::AddColumn(AddColumn {
            table: "Releases".to_string(),
            column: ColumnDef::new("TimePeriodCoverage", "INTEGER").not_null(),
        })],
        vec![sql("ALTER TABLE Releases DROP COLUMN TimePeriodCoverage")],
        None,
    )])
    .unwrap();

    let findings = lint(&ledger, Dialect::DuckDb);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Error);
    assert!(findings[0]
        .message
        .contains("add_column Releases.TimePeriodCoverage is NOT NULL without a default"));
    assert!(has_errors(&findings));
}

#[test]
fn test_unparseable_sql_and_unsupported_operations() {
    let filtered = Operation::CreateIndex(CreateIndex {
        name: "IX_Files_Type".to_string(),
        table: "Files".to_string(),
        columns: vec!["Type".to_string()],
        unique: false,
        filter: Some("\"Type\" = 'Data'".to_string()),
    });
    let ledger = Ledger::from_migrations(vec![unit(
        "20200301000000_IndexFiles",
        vec![filtered, sql("CREATE TABEL Broken")],
        vec![sql("DROP INDEX IX_Files_Type")],
        None,
    )])
    .unwrap();

    let duckdb = lint(&ledger, Dialect::DuckDb);
    assert!(duckdb.iter().any(|f| {
        f.severity == Severity::Warning && f.message.contains("does not parse as duckdb")
    }));
    assert!(duckdb
        .iter()
        .any(|f| f.severity == Severity::Error && f.message.contains("up cannot be rendered")));

    // Postgres supports filtered indexes
    let postgres = lint(&ledger, Dialect::Postgres);
    assert!(!has_errors(&postgres));
}

#[test]
fn test_collisions_are_warnings() {
    let ledger = Ledger::from_migrations(vec![
        unit(
            "20200101000000_AddReleaseFileTypeToReleaseFileReference",
            vec![sql("SELECT 1")],
            vec![sql("SELECT 1")],
            None,
        ),
        unit(
            "20200301000000_AddReleaseFileTypeToReleaseFileReference",
            vec![sql("SELECT 1")],
            vec![sql("SELECT 1")],
            None,
        ),
    ])
    .unwrap();

    let findings = lint(&ledger, Dialect::DuckDb);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].id, None);
    assert!(findings[0]
        .message
        .starts_with("name 'AddReleaseFileTypeToReleaseFileReference' is shared by"));
}
