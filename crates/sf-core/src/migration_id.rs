//! Strongly-typed migration identifier.
//!
//! Identifiers look like `20240117094512_AddTimeIdentifierToRelease`: a
//! 14-digit UTC timestamp, an underscore, then the migration name. Lexical
//! order of the full identifier is the order of the ledger.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Length of the `YYYYMMDDHHMMSS` prefix.
pub const TIMESTAMP_LEN: usize = 14;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Validated, sortable migration identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MigrationId(String);

impl MigrationId {
    /// Parse and validate an identifier.
    pub fn parse(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        let invalid = |reason: &str| CoreError::InvalidMigrationId {
            id: id.clone(),
            reason: reason.to_string(),
        };

        if id.len() <= TIMESTAMP_LEN + 1 || !id.is_char_boundary(TIMESTAMP_LEN) {
            return Err(invalid("expected '<YYYYMMDDHHMMSS>_<Name>'"));
        }
        let (timestamp, rest) = id.split_at(TIMESTAMP_LEN);
        if !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("timestamp prefix must be 14 digits"));
        }
        if NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).is_err() {
            return Err(invalid("timestamp prefix is not a valid date and time"));
        }
        let Some(name) = rest.strip_prefix('_') else {
            return Err(invalid("timestamp must be followed by '_'"));
        };
        validate_name(name).map_err(|reason| invalid(&reason))?;

        Ok(Self(id))
    }

    /// Build an identifier from a timestamp and a migration name.
    pub fn from_parts(at: DateTime<Utc>, name: &str) -> CoreResult<Self> {
        Self::parse(format!("{}_{}", at.format(TIMESTAMP_FORMAT), name))
    }

    /// The `YYYYMMDDHHMMSS` prefix.
    pub fn timestamp(&self) -> &str {
        &self.0[..TIMESTAMP_LEN]
    }

    /// The migration name after the timestamp.
    pub fn name(&self) -> &str {
        &self.0[TIMESTAMP_LEN + 1..]
    }

    /// Return the underlying id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Check that a migration name is non-empty and uses only `[A-Za-z0-9_]`.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(format!("name contains invalid character '{}'", bad));
    }
    Ok(())
}

impl<'de> Deserialize<'de> for MigrationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MigrationId::parse(s).map_err(serde::de::Error::custom)
    }
}

impl FromStr for MigrationId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MigrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for MigrationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "migration_id_test.rs"]
mod tests;
