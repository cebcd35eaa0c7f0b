use super::*;

fn parse_ops(yaml: &str) -> Vec<Operation> {
    serde_yaml::from_str(yaml).unwrap()
}

#[test]
fn test_parse_add_column_with_default() {
    let ops = parse_ops(
        r#"
- add_column:
    table: Releases
    column:
      name: TimePeriodCoverage
      type: INTEGER
      nullable: false
      default: 0
"#,
    );
    assert_eq!(ops.len(), 1);
    match &ops[0] {
        Operation::AddColumn(op) => {
            assert_eq!(op.table, "Releases");
            assert_eq!(op.column.name, "TimePeriodCoverage");
            assert_eq!(op.column.data_type, "INTEGER");
            assert!(!op.column.nullable);
            assert_eq!(op.column.default, Some(Value::Int(0)));
            assert!(op.column.has_default());
        }
        other => panic!("expected AddColumn, got {:?}", other),
    }
}

#[test]
fn test_column_defaults_to_nullable() {
    let col: ColumnDef = serde_yaml::from_str("name: Slug\ntype: VARCHAR").unwrap();
    assert!(col.nullable);
    assert!(!col.has_default());
}

#[test]
fn test_parse_create_table_with_foreign_key() {
    let ops = parse_ops(
        r#"
- create_table:
    table: ReleaseVersions
    columns:
      - { name: Id, type: UUID, nullable: false }
      - { name: ReleaseId, type: UUID, nullable: false }
      - { name: Created, type: TIMESTAMP, nullable: false, default_sql: "now()" }
    primary_key: [Id]
    foreign_keys:
      - columns: [ReleaseId]
        references_table: Releases
        references_columns: [Id]
        on_delete: restrict
"#,
    );
    let Operation::CreateTable(op) = &ops[0] else {
        panic!("expected CreateTable");
    };
    assert_eq!(op.columns.len(), 3);
    assert_eq!(op.columns[2].default_sql.as_deref(), Some("now()"));
    assert_eq!(op.primary_key, vec!["Id"]);
    assert_eq!(op.foreign_keys[0].on_delete, ReferentialAction::Restrict);
}

#[test]
fn test_parse_row_operations() {
    let ops = parse_ops(
        r#"
- insert_rows:
    table: Releases
    columns: [Id, Slug, Published, Year, Score]
    rows:
      - ["b7a9", "2019-20", null, 2019, 1.5]
- update_rows:
    table: Releases
    set: { TimePeriodCoverage: 1 }
    filter: { Slug: "2019-20" }
- delete_rows:
    table: Releases
    filter: { Id: "b7a9" }
"#,
    );
    let Operation::InsertRows(insert) = &ops[0] else {
        panic!("expected InsertRows");
    };
    assert_eq!(
        insert.rows[0],
        vec![
            Value::Text("b7a9".into()),
            Value::Text("2019-20".into()),
            Value::Null,
            Value::Int(2019),
            Value::Float(1.5),
        ]
    );
    assert!(ops[1].is_data());
    let Operation::DeleteRows(delete) = &ops[2] else {
        panic!("expected DeleteRows");
    };
    assert_eq!(delete.filter.get("Id"), Some(&Value::Text("b7a9".into())));
}

#[test]
fn test_parse_alter_column_default_changes() {
    let ops = parse_ops(
        r#"
- alter_column:
    table: Releases
    column: Slug
    nullable: false
    default: { set: "" }
- alter_column:
    table: Releases
    column: Year
    data_type: BIGINT
    default: drop
"#,
    );
    let Operation::AlterColumn(first) = &ops[0] else {
        panic!("expected AlterColumn");
    };
    assert_eq!(first.nullable, Some(false));
    assert_eq!(
        first.default,
        Some(DefaultChange::Set(Value::Text(String::new())))
    );
    let Operation::AlterColumn(second) = &ops[1] else {
        panic!("expected AlterColumn");
    };
    assert_eq!(second.data_type.as_deref(), Some("BIGINT"));
    assert_eq!(second.default, Some(DefaultChange::Drop));
}

#[test]
fn test_parse_sql_and_permissions() {
    let ops = parse_ops(
        r#"
- sql: |
    UPDATE Releases SET Slug = lower(Slug);
- sql_file: backfill.sql
- grant:
    privileges: [select, update]
    table: Permalinks
    role: publisher
"#,
    );
    assert_eq!(ops[0].kind(), "sql");
    assert_eq!(ops[1], Operation::SqlFile("backfill.sql".to_string()));
    assert!(ops[2].is_permission());
    assert_eq!(ops[2].table(), Some("Permalinks"));
    assert_eq!(
        ops[2].to_string(),
        "grant SELECT, UPDATE on Permalinks to publisher"
    );
}

#[test]
fn test_unknown_operation_rejected() {
    let result: Result<Vec<Operation>, _> = serde_yaml::from_str("- truncate_table: { table: X }");
    assert!(result.is_err());
}

#[test]
fn test_unknown_field_in_operation_rejected() {
    let result: Result<Vec<Operation>, _> =
        serde_yaml::from_str("- drop_table: { table: X, cascade: true }");
    assert!(result.is_err());
}

#[test]
fn test_display_is_human_readable() {
    let op = Operation::AddColumn(AddColumn {
        table: "Releases".into(),
        column: ColumnDef::new("TimePeriodCoverage", "INTEGER")
            .not_null()
            .with_default(0_i64),
    });
    assert_eq!(op.to_string(), "add_column Releases.TimePeriodCoverage");
    assert_eq!(
        Operation::DropTable(TableRef {
            table: "Footnotes".into()
        })
        .to_string(),
        "drop_table Footnotes"
    );
}

#[test]
fn test_values_cover_defaults_rows_and_filters() {
    let ops = parse_ops(
        r#"
- update_rows:
    table: Releases
    set: { Published: true }
    filter: { Slug: null }
- alter_column: { table: Releases, column: Year, default: { set: .nan } }
- drop_table: { table: Permalinks }
"#,
    );
    let update = ops[0].values();
    assert_eq!(update, vec![&Value::Bool(true), &Value::Null]);
    assert!(update[1].is_null());
    assert!(update.iter().all(|v| v.is_finite()));

    let alter = ops[1].values();
    assert_eq!(alter.len(), 1);
    assert!(!alter[0].is_finite());

    assert!(ops[2].values().is_empty());
}
