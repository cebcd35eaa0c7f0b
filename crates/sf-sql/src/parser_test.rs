use super::*;

#[test]
fn test_parse_multiple_statements() {
    let parser = SqlParser::duckdb();
    let stmts = parser
        .parse("UPDATE Releases SET Slug = 'a'; UPDATE Releases SET Slug = 'b';")
        .unwrap();
    assert_eq!(stmts.len(), 2);
}

#[test]
fn test_parse_empty() {
    let parser = SqlParser::duckdb();
    assert!(matches!(parser.parse("   \n"), Err(SqlError::EmptySql)));
}

#[test]
fn test_parse_error() {
    let parser = SqlParser::duckdb();
    let result = parser.parse("UPDATE SET WHERE");
    assert!(matches!(result, Err(SqlError::ParseError { .. })));
}

#[test]
fn test_from_dialect_name() {
    let parser = SqlParser::from_dialect_name("duckdb").unwrap();
    assert_eq!(parser.dialect_name(), "duckdb");

    let parser = SqlParser::from_dialect_name("PostgreSQL").unwrap();
    assert_eq!(parser.dialect_name(), "postgres");

    let result = SqlParser::from_dialect_name("tsql");
    assert!(matches!(result, Err(SqlError::UnknownDialect(_))));
}

#[test]
fn test_for_dialect() {
    assert_eq!(
        SqlParser::for_dialect(sf_core::Dialect::Postgres).dialect_name(),
        "postgres"
    );
}
