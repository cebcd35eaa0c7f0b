use super::*;

fn column(name: &str, data_type: &str, nullable: bool) -> ColumnSnapshot {
    ColumnSnapshot {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable,
        default: None,
    }
}

fn releases() -> SchemaSnapshot {
    let mut snapshot = SchemaSnapshot::default();
    snapshot.tables.insert(
        "main.Releases".to_string(),
        TableSnapshot {
            columns: vec![
                column("Id", "VARCHAR", false),
                column("Slug", "VARCHAR", true),
            ],
            indexes: BTreeMap::from([(
                "IX_Releases_Slug".to_string(),
                IndexSnapshot {
                    unique: true,
                    sql: None,
                },
            )]),
            constraints: vec![ConstraintSnapshot {
                kind: "PRIMARY KEY".to_string(),
                columns: vec!["Id".to_string()],
                text: "PRIMARY KEY(Id)".to_string(),
            }],
            row_count: 2,
            data_checksum: "abc".to_string(),
        },
    );
    snapshot
}

#[test]
fn test_identical_snapshots_have_no_diff() {
    assert!(releases().diff(&releases(), DiffMode::Full).is_empty());
}

#[test]
fn test_added_column_reported() {
    let expected = releases();
    let mut actual = releases();
    actual
        .tables
        .get_mut("main.Releases")
        .unwrap()
        .columns
        .push(column("TimePeriodCoverage", "INTEGER", false));

    let diff = expected.diff(&actual, DiffMode::Full);
    assert_eq!(
        diff,
        vec!["column main.Releases.TimePeriodCoverage is unexpected".to_string()]
    );
}

#[test]
fn test_changed_column_reported() {
    let expected = releases();
    let mut actual = releases();
    actual.tables.get_mut("main.Releases").unwrap().columns[1].nullable = false;

    let diff = expected.diff(&actual, DiffMode::SchemaOnly);
    assert_eq!(diff.len(), 1);
    assert!(diff[0].contains("expected VARCHAR, found VARCHAR NOT NULL"));
}

#[test]
fn test_column_order_reported() {
    let expected = releases();
    let mut actual = releases();
    actual
        .tables
        .get_mut("main.Releases")
        .unwrap()
        .columns
        .reverse();

    let diff = expected.diff(&actual, DiffMode::SchemaOnly);
    assert_eq!(diff.len(), 1);
    assert!(diff[0].contains("column order differs"));
}

#[test]
fn test_data_differences_respect_mode() {
    let expected = releases();
    let mut actual = releases();
    actual.tables.get_mut("main.Releases").unwrap().data_checksum = "def".to_string();

    assert_eq!(
        expected.diff(&actual, DiffMode::Full),
        vec!["table main.Releases: row data differs".to_string()]
    );
    assert!(expected.diff(&actual, DiffMode::SchemaOnly).is_empty());

    actual.tables.get_mut("main.Releases").unwrap().row_count = 1;
    assert_eq!(
        expected.diff(&actual, DiffMode::Full),
        vec!["table main.Releases: expected 2 rows, found 1".to_string()]
    );
}

#[test]
fn test_missing_and_unexpected_tables() {
    let expected = releases();
    let mut actual = SchemaSnapshot::default();
    actual.tables.insert(
        "main.Permalinks".to_string(),
        expected.tables["main.Releases"].clone(),
    );

    let diff = expected.diff(&actual, DiffMode::Full);
    assert_eq!(
        diff,
        vec![
            "table main.Releases is missing".to_string(),
            "table main.Permalinks is unexpected".to_string(),
        ]
    );
}

#[test]
fn test_index_differences() {
    let expected = releases();
    let mut actual = releases();
    let table = actual.tables.get_mut("main.Releases").unwrap();
    table.indexes.clear();
    table.indexes.insert(
        "IX_Other".to_string(),
        IndexSnapshot {
            unique: false,
            sql: None,
        },
    );

    let diff = expected.diff(&actual, DiffMode::SchemaOnly);
    assert_eq!(
        diff,
        vec![
            "index IX_Releases_Slug on main.Releases is missing".to_string(),
            "index IX_Other on main.Releases is unexpected".to_string(),
        ]
    );
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("schema_snapshot.json");
    releases().save(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.ends_with('\n'));
    assert_eq!(SchemaSnapshot::load(&path).unwrap(), releases());
}

#[test]
fn test_dropped_primary_key_reported() {
    let expected = releases();
    let mut actual = releases();
    actual
        .tables
        .get_mut("main.Releases")
        .unwrap()
        .constraints
        .clear();

    let diff = expected.diff(&actual, DiffMode::SchemaOnly);
    assert_eq!(
        diff,
        vec!["constraint PRIMARY KEY(Id) on main.Releases is missing".to_string()]
    );
}

#[test]
fn test_snapshot_without_constraints_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema_snapshot.json");
    std::fs::write(
        &path,
        r#"{"tables":{"main.Releases":{"columns":[],"row_count":0,"data_checksum":"x"}}}"#,
    )
    .unwrap();
    let loaded = SchemaSnapshot::load(&path).unwrap();
    assert!(loaded.tables["main.Releases"].constraints.is_empty());
}
