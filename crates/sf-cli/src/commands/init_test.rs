use super::*;
use sf_core::{Config, Ledger};

#[test]
fn test_scaffold_is_a_loadable_project() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("content_db");
    scaffold(&project, "content_db", "target/dev.duckdb").unwrap();

    let config = Config::load_from_dir(&project).unwrap();
    assert_eq!(config.name, "content_db");
    assert_eq!(config.database.path, "target/dev.duckdb");
    assert!(config.validate_checksums);

    let ledger = Ledger::load(&config.migrations_path_absolute(&project)).unwrap();
    assert!(ledger.is_empty());
    assert!(project.join(".gitignore").is_file());
}

#[test]
fn test_scaffold_escapes_quotes() {
    let dir = tempfile::tempdir().unwrap();
    scaffold(dir.path(), "say \"hi\"", ":memory:").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "say \"hi\"");
}

#[tokio::test]
async fn test_rejects_path_like_names() {
    for name in ["../escape", "a/b", ".hidden", "-flag"] {
        let args = InitArgs {
            name: name.to_string(),
            database_path: ":memory:".to_string(),
        };
        let err = execute(&args).await.unwrap_err();
        assert!(err.to_string().contains("Invalid project name"), "{}", name);
    }
}
