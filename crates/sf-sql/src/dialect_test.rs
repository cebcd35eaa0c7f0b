use super::*;

#[test]
fn test_duckdb_parse() {
    let dialect = DuckDbDialect::new();
    let stmts = dialect
        .parse("UPDATE Releases SET Slug = lower(Slug); DELETE FROM Footnotes")
        .unwrap();
    assert_eq!(stmts.len(), 2);
}

#[test]
fn test_postgres_parse_grant() {
    let dialect = PostgresDialect::new();
    let stmts = dialect
        .parse("GRANT SELECT, UPDATE ON Permalinks TO publisher")
        .unwrap();
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_quote_ident() {
    let dialect = DuckDbDialect::new();
    assert_eq!(dialect.quote_ident("Releases"), "\"Releases\"");
    assert_eq!(dialect.quote_ident("odd\"name"), "\"odd\"\"name\"");
}

#[test]
fn test_capabilities() {
    let duckdb = DuckDbDialect::new();
    assert!(!duckdb.supports_add_column_constraints());
    assert!(!duckdb.supports_alter_foreign_keys());
    assert!(!duckdb.supports_grants());

    let postgres = PostgresDialect::new();
    assert!(postgres.supports_add_column_constraints());
    assert!(postgres.supports_filtered_indexes());
    assert!(postgres.supports_grants());
}

#[test]
fn test_dialect_for_config() {
    assert_eq!(dialect_for(sf_core::Dialect::DuckDb).name(), "duckdb");
    assert_eq!(dialect_for(sf_core::Dialect::Postgres).name(), "postgres");
}

#[test]
fn test_parse_location_extraction() {
    assert_eq!(
        parse_location_from_error("Expected: an expression, found: FROM at Line: 2, Column: 1"),
        (2, 1)
    );
    assert_eq!(parse_location_from_error("no location here"), (0, 0));
}
