//! Error types for the migration engine
//!
//! Every failure in the apply/rollback path surfaces as a [`MigrationError`]
//! carrying the version it concerns and, where there is one, the underlying
//! database error as its source.

use std::fmt;

use thiserror::Error;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Which way a migration step was moving when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Applying the forward script
    Up,
    /// Applying the reverse script
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "apply"),
            Direction::Down => write!(f, "rollback"),
        }
    }
}

/// Error types for migration operations
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The database could not be opened or reached
    #[error("Failed to connect to database: {0}")]
    Connection(#[source] sqlx::Error),

    /// Dialect name not in the supported set
    #[error("Unsupported database type: {0} (expected sqlite or postgres)")]
    UnsupportedDialect(String),

    /// The compiled-in or supplied catalog breaks an ordering rule
    #[error("Invalid migration catalog: {0}")]
    InvalidCatalog(String),

    /// Requested target is neither 0 nor a catalog version
    #[error("Unknown target version {target} (latest is {latest})")]
    UnknownTarget { target: i64, latest: i64 },

    /// Reading or writing the schema_versions table failed
    #[error("Version store error while trying to {action}: {source}")]
    VersionStore {
        action: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A forward or reverse script failed; that step's transaction was rolled back
    #[error("Failed to {direction} migration {version}: {source}")]
    StepFailed {
        version: i64,
        direction: Direction,
        #[source]
        source: sqlx::Error,
    },

    /// Opening or committing a step transaction failed
    #[error("Transaction error during {direction} of migration {version}: {source}")]
    Transaction {
        version: i64,
        direction: Direction,
        #[source]
        source: sqlx::Error,
    },

    /// Backward path reached a migration without a reverse script
    #[error("Migration {version} has no rollback SQL defined")]
    NoRollback { version: i64 },

    /// Stored checksum differs from the catalog's forward script
    #[error("Migration {version} checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        version: i64,
        expected: String,
        actual: String,
    },

    /// An applied version is missing from the running catalog
    #[error("Applied migration {version} not found in current migration catalog")]
    NotInCatalog { version: i64 },

    /// Reset refused because some applied migrations cannot be rolled back
    #[error("Cannot reset: applied migrations {versions:?} have no rollback SQL")]
    IrreversibleReset { versions: Vec<i64> },
}

impl MigrationError {
    /// Version the error is about, when it concerns a single migration
    pub fn version(&self) -> Option<i64> {
        match self {
            MigrationError::StepFailed { version, .. }
            | MigrationError::Transaction { version, .. }
            | MigrationError::NoRollback { version }
            | MigrationError::ChecksumMismatch { version, .. }
            | MigrationError::NotInCatalog { version } => Some(*version),
            _ => None,
        }
    }

    pub(crate) fn store(action: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| MigrationError::VersionStore { action, source }
    }
}
