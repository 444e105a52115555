//! Migration Definitions - Core types shared across the engine
//!
//! Defines the catalog entry ([`Migration`]), the persisted record of an
//! applied step ([`AppliedMigration`]), status rows, targets and run reports.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::checksum::checksum;

/// A single versioned schema change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Position in the total order; positive and unique within a catalog
    pub version: i64,
    /// Human-readable summary, copied into the version store on apply
    pub description: String,
    /// Statements that move the schema forward
    pub up_sql: String,
    /// Statements that undo `up_sql`; `None` means the step cannot be rolled back
    pub down_sql: Option<String>,
}

impl Migration {
    /// Create a reversible migration
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up_sql: impl Into<String>,
        down_sql: impl Into<String>,
    ) -> Self {
        let down_sql = down_sql.into();
        Self {
            version,
            description: description.into(),
            up_sql: up_sql.into(),
            down_sql: if down_sql.trim().is_empty() {
                None
            } else {
                Some(down_sql)
            },
        }
    }

    /// Create a migration with no reverse script
    pub fn irreversible(
        version: i64,
        description: impl Into<String>,
        up_sql: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up_sql: up_sql.into(),
            down_sql: None,
        }
    }

    pub fn is_reversible(&self) -> bool {
        self.down_sql.is_some()
    }

    /// Fingerprint of the forward script as recorded in the version store
    pub fn checksum(&self) -> String {
        checksum(&self.up_sql)
    }
}

/// One row of the `schema_versions` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    /// Description as it read when the migration was applied
    pub description: String,
    /// `None` when the stored timestamp could not be parsed
    pub applied_at: Option<DateTime<Utc>>,
    pub checksum: String,
}

/// Status of one catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// Version a `migrate_to` call should end at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Highest version in the catalog (0 for an empty catalog)
    Latest,
    /// An exact version; 0 means "nothing applied"
    Version(i64),
}

impl From<i64> for Target {
    /// `-1` is the command-line sentinel for "latest"
    fn from(version: i64) -> Self {
        if version == -1 {
            Target::Latest
        } else {
            Target::Version(version)
        }
    }
}

/// Result of a `migrate_to` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version before the call
    pub from: i64,
    /// Version after the call
    pub to: i64,
    /// Versions applied, in the order they ran
    pub applied: Vec<i64>,
    /// Versions rolled back, in the order they ran
    pub rolled_back: Vec<i64>,
    /// Total execution time in milliseconds
    pub elapsed_ms: u128,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.rolled_back.is_empty()
    }
}

/// Parse the text form of `applied_at`.
///
/// SQLite stores `CURRENT_TIMESTAMP` as `YYYY-MM-DD HH:MM:SS` in UTC; PostgreSQL
/// renders `timestamptz` with fractional seconds and an offset such as `+00`.
pub(crate) fn parse_applied_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
