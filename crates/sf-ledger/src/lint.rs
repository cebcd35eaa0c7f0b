//! Static checks over the ledger.

use serde::Serialize;
use sf_core::{CollisionKind, Direction, Ledger, Migration, Operation, Reversibility};
use sf_sql::{SqlError, SqlParser, SqlRenderer};

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One lint finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    /// Unit the finding is about; `None` for ledger-wide findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message: String,
}

impl Finding {
    fn warning(migration: Option<&Migration>, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            id: migration.map(|m| m.id.to_string()),
            message,
        }
    }

    fn error(migration: &Migration, message: String) -> Self {
        Self {
            severity: Severity::Error,
            id: Some(migration.id.to_string()),
            message,
        }
    }
}

/// Lint every unit of the ledger for `dialect`.
pub fn lint(ledger: &Ledger, dialect: sf_core::Dialect) -> Vec<Finding> {
    let parser = SqlParser::for_dialect(dialect);
    let renderer = SqlRenderer::for_dialect(dialect);
    let mut findings = Vec::new();

    for migration in ledger.iter() {
        match migration.reversibility() {
            Reversibility::Reversible => {}
            Reversibility::Irreversible(reason) => findings.push(Finding::warning(
                Some(migration),
                format!("irreversible: {}", reason),
            )),
            Reversibility::Partial(reason) => findings.push(Finding::warning(
                Some(migration),
                format!("partially reversible: {}", reason),
            )),
        }

        if !migration.transactional {
            findings.push(Finding::warning(
                Some(migration),
                "runs outside a transaction; a failure needs manual cleanup".to_string(),
            ));
        }

        for direction in [Direction::Up, Direction::Down] {
            lint_operations(migration, direction, &parser, &mut findings);
            if let Err(e) = renderer.render_migration(migration, direction) {
                let severity = match e {
                    SqlError::Unsupported { .. } | SqlError::InvalidOperation { .. } => {
                        Severity::Error
                    }
                    _ => Severity::Warning,
                };
                findings.push(Finding {
                    severity,
                    id: Some(migration.id.to_string()),
                    message: format!("{} cannot be rendered: {}", direction, e),
                });
            }
        }
    }

    for collision in ledger.collisions() {
        let ids: Vec<&str> = collision.ids.iter().map(|id| id.as_str()).collect();
        let what = match collision.kind {
            CollisionKind::Name => "name",
            CollisionKind::Timestamp => "timestamp",
        };
        findings.push(Finding::warning(
            None,
            format!(
                "{} '{}' is shared by {}",
                what,
                collision.key,
                ids.join(", ")
            ),
        ));
    }

    findings
}

fn lint_operations(
    migration: &Migration,
    direction: Direction,
    parser: &SqlParser,
    findings: &mut Vec<Finding>,
) {
    for op in migration.operations(direction) {
        match op {
            Operation::AddColumn(add) if !add.column.nullable && !add.column.has_default() => {
                findings.push(Finding::error(
                    migration,
                    format!(
                        "{}: {} is NOT NULL without a default and fails on a non-empty table",
                        direction, op
                    ),
                ));
            }
            Operation::Sql(sql) => {
                if let Err(e) = parser.parse(sql) {
                    findings.push(Finding::warning(
                        Some(migration),
                        format!(
                            "{}: SQL does not parse as {}: {}",
                            direction,
                            parser.dialect_name(),
                            e
                        ),
                    ));
                }
            }
            _ => {}
        }
    }
}

/// Returns true if any finding is an error
pub fn has_errors(findings: &[Finding]) -> bool {
    findings.iter().any(|f| f.severity == Severity::Error)
}

#[cfg(test)]
#[path = "lint_test.rs"]
mod tests;
