use super::*;

fn stmts(sql: &[&str]) -> Vec<String> {
    sql.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
}

#[tokio::test]
async fn test_query_count() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE nums AS SELECT * FROM range(10) t(n)")
        .await
        .unwrap();

    let count = db.query_count("SELECT * FROM nums").await.unwrap();
    assert_eq!(count, 10);
}

#[tokio::test]
async fn test_execute_batch() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE t1 (id INT); CREATE TABLE t2 (id INT); INSERT INTO t1 VALUES (1);",
    )
    .await
    .unwrap();

    assert!(db.relation_exists("t1").await.unwrap());
    assert!(db.relation_exists("t2").await.unwrap());
    assert!(!db.relation_exists("nonexistent").await.unwrap());
}

#[tokio::test]
async fn test_create_schema_if_not_exists() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.create_schema_if_not_exists("sf_meta").await.unwrap();
    db.execute("CREATE TABLE sf_meta.t (id INT)").await.unwrap();
    assert!(db.relation_exists("sf_meta.t").await.unwrap());

    // IF NOT EXISTS
    db.create_schema_if_not_exists("sf_meta").await.unwrap();
}

#[tokio::test]
async fn test_transaction_commits_all_statements() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_in_transaction(&stmts(&[
        "CREATE TABLE Releases (Id INTEGER, Slug VARCHAR)",
        "INSERT INTO Releases VALUES (1, 'a'), (2, 'b')",
    ]))
    .await
    .unwrap();

    assert_eq!(db.query_count("SELECT * FROM Releases").await.unwrap(), 2);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_failure() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE Releases (Id INTEGER)").await.unwrap();

    let err = db
        .execute_in_transaction(&stmts(&[
            "ALTER TABLE Releases ADD COLUMN TimePeriodCoverage INTEGER",
            "INSERT INTO Releases VALUES (1, 1)",
            "INSERT INTO NoSuchTable VALUES (1)",
        ]))
        .await
        .unwrap_err();

    assert_eq!(err.failed_statement(), Some(3));
    let columns = db
        .query_rows(
            "SELECT column_name FROM information_schema.columns WHERE table_name = 'Releases'",
        )
        .await
        .unwrap();
    assert_eq!(columns, vec![vec![Some("Id".to_string())]]);
    assert_eq!(db.query_count("SELECT * FROM Releases").await.unwrap(), 0);

    // The connection is usable again after the rollback
    db.execute("INSERT INTO Releases VALUES (7)").await.unwrap();
}

#[tokio::test]
async fn test_execute_each_keeps_earlier_statements() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db
        .execute_each(&stmts(&[
            "CREATE TABLE Scratch (Id INTEGER)",
            "INSERT INTO Missing VALUES (1)",
        ]))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::StatementFailed { index: 2, total: 2, .. }));
    assert!(db.relation_exists("Scratch").await.unwrap());
}

#[tokio::test]
async fn test_query_rows_reads_types_as_text() {
    let db = DuckDbBackend::in_memory().unwrap();
    let rows = db
        .query_rows("SELECT 1 AS i, 'x' AS s, NULL AS n, TRUE AS b, 2.5::DOUBLE AS d")
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![vec![
            Some("1".to_string()),
            Some("x".to_string()),
            None,
            Some("true".to_string()),
            Some("2.5".to_string()),
        ]]
    );
}

#[tokio::test]
async fn test_capture_snapshot() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE SCHEMA sf_meta;
         CREATE TABLE sf_meta.schema_migrations (id VARCHAR);
         CREATE TABLE Releases (Id INTEGER NOT NULL, Slug VARCHAR DEFAULT 'x');
         CREATE UNIQUE INDEX IX_Releases_Slug ON Releases (Slug);
         INSERT INTO Releases VALUES (2, 'b'), (1, 'a');",
    )
    .await
    .unwrap();

    let snapshot = db.capture_snapshot(&["sf_meta"]).await.unwrap();
    let keys: Vec<&str> = snapshot.tables.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["main.Releases"]);

    let releases = &snapshot.tables["main.Releases"];
    assert_eq!(releases.columns.len(), 2);
    assert_eq!(releases.columns[0].name, "Id");
    assert!(!releases.columns[0].nullable);
    assert!(releases.columns[1].nullable);
    assert!(releases.columns[1].default.is_some());
    assert!(releases.indexes["IX_Releases_Slug"].unique);
    assert_eq!(releases.row_count, 2);
}

#[tokio::test]
async fn test_snapshot_captures_table_constraints() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE Releases (Id INTEGER NOT NULL, Slug VARCHAR, PRIMARY KEY (Id));
         CREATE TABLE Permalinks (
             ReleaseId INTEGER NOT NULL REFERENCES Releases (Id),
             Url VARCHAR UNIQUE
         );",
    )
    .await
    .unwrap();

    let snapshot = db.capture_snapshot(&[]).await.unwrap();
    let releases = &snapshot.tables["main.Releases"];
    let primary: Vec<_> = releases
        .constraints
        .iter()
        .filter(|c| c.kind == "PRIMARY KEY")
        .collect();
    assert_eq!(primary.len(), 1);
    assert_eq!(primary[0].columns, vec!["Id".to_string()]);
    // NOT NULL stays on the column
    assert!(releases.constraints.iter().all(|c| c.kind != "NOT NULL"));

    let permalinks = &snapshot.tables["main.Permalinks"];
    let kinds: Vec<&str> = permalinks.constraints.iter().map(|c| c.kind.as_str()).collect();
    assert!(kinds.contains(&"FOREIGN KEY"), "{:?}", kinds);
    assert!(kinds.contains(&"UNIQUE"), "{:?}", kinds);

    // Same table without its key is a different snapshot
    let bare = DuckDbBackend::in_memory().unwrap();
    bare.execute_batch("CREATE TABLE Releases (Id INTEGER NOT NULL, Slug VARCHAR);")
        .await
        .unwrap();
    let bare_snapshot = bare.capture_snapshot(&[]).await.unwrap();
    assert_eq!(bare_snapshot.tables["main.Releases"].columns, releases.columns);
    assert_ne!(bare_snapshot.tables["main.Releases"], *releases);
}

#[tokio::test]
async fn test_snapshot_data_checksum_ignores_row_order() {
    let a = DuckDbBackend::in_memory().unwrap();
    let b = DuckDbBackend::in_memory().unwrap();
    a.execute_batch("CREATE TABLE t (id INT, v VARCHAR); INSERT INTO t VALUES (1, 'a'), (2, NULL);")
        .await
        .unwrap();
    b.execute_batch("CREATE TABLE t (id INT, v VARCHAR); INSERT INTO t VALUES (2, NULL), (1, 'a');")
        .await
        .unwrap();

    let snap_a = a.capture_snapshot(&[]).await.unwrap();
    let snap_b = b.capture_snapshot(&[]).await.unwrap();
    assert_eq!(snap_a, snap_b);

    b.execute("UPDATE t SET v = 'z' WHERE id = 1").await.unwrap();
    let changed = b.capture_snapshot(&[]).await.unwrap();
    assert_ne!(
        snap_a.tables["main.t"].data_checksum,
        changed.tables["main.t"].data_checksum
    );
}

#[tokio::test]
async fn test_file_backed_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("target").join("dev.duckdb");
    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        db.execute("CREATE TABLE kept (id INT)").await.unwrap();
    }
    let db = DuckDbBackend::new(path.to_str().unwrap()).unwrap();
    assert!(db.relation_exists("kept").await.unwrap());
}
