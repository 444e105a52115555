//! Migration Catalog - the ordered, dialect-resolved list of migrations
//!
//! The built-in catalog is compiled in from `sql/<dialect>/*.sql`. Versions and
//! descriptions are shared by every dialect; only the SQL text differs.

use std::collections::HashSet;

use crate::definitions::Migration;
use crate::dialect::Dialect;
use crate::error::{MigrationError, MigrationResult};

macro_rules! script {
    ($dialect:literal, $name:literal) => {
        include_str!(concat!("../sql/", $dialect, "/", $name, ".sql"))
    };
}

/// (version, description) for every built-in migration
const DEFINITIONS: [(i64, &str); 4] = [
    (1, "Create initial tables for users and print requests"),
    (2, "Add role column to users table"),
    (3, "Create materials and printers tables"),
    (4, "Change spool_id column from TEXT to INTEGER"),
];

/// (up, down) per entry of [`DEFINITIONS`]
const SQLITE_SCRIPTS: [(&str, &str); 4] = [
    (
        script!("sqlite", "0001_create_initial_tables.up"),
        script!("sqlite", "0001_create_initial_tables.down"),
    ),
    (
        script!("sqlite", "0002_add_user_role.up"),
        script!("sqlite", "0002_add_user_role.down"),
    ),
    (
        script!("sqlite", "0003_create_materials_and_printers.up"),
        script!("sqlite", "0003_create_materials_and_printers.down"),
    ),
    (
        script!("sqlite", "0004_spool_id_to_integer.up"),
        script!("sqlite", "0004_spool_id_to_integer.down"),
    ),
];

const POSTGRES_SCRIPTS: [(&str, &str); 4] = [
    (
        script!("postgres", "0001_create_initial_tables.up"),
        script!("postgres", "0001_create_initial_tables.down"),
    ),
    (
        script!("postgres", "0002_add_user_role.up"),
        script!("postgres", "0002_add_user_role.down"),
    ),
    (
        script!("postgres", "0003_create_materials_and_printers.up"),
        script!("postgres", "0003_create_materials_and_printers.down"),
    ),
    (
        script!("postgres", "0004_spool_id_to_integer.up"),
        script!("postgres", "0004_spool_id_to_integer.down"),
    ),
];

/// Immutable, version-sorted list of migrations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    migrations: Vec<Migration>,
}

impl Catalog {
    /// Build a catalog from arbitrary migrations.
    ///
    /// Entries are sorted by version. Fails if a version is not positive or
    /// appears twice, or if a description or forward script is empty.
    pub fn new(mut migrations: Vec<Migration>) -> MigrationResult<Self> {
        let mut seen = HashSet::new();
        for migration in &migrations {
            if migration.version <= 0 {
                return Err(MigrationError::InvalidCatalog(format!(
                    "migration version must be positive, found {}",
                    migration.version
                )));
            }
            if !seen.insert(migration.version) {
                return Err(MigrationError::InvalidCatalog(format!(
                    "duplicate migration version {}",
                    migration.version
                )));
            }
            if migration.description.trim().is_empty() {
                return Err(MigrationError::InvalidCatalog(format!(
                    "migration {} has an empty description",
                    migration.version
                )));
            }
            if migration.up_sql.trim().is_empty() {
                return Err(MigrationError::InvalidCatalog(format!(
                    "migration {} has no forward SQL",
                    migration.version
                )));
            }
        }

        migrations.sort_by_key(|m| m.version);
        Ok(Self { migrations })
    }

    /// The built-in catalog with SQL for `dialect`
    pub fn for_dialect(dialect: Dialect) -> MigrationResult<Self> {
        let scripts = match dialect {
            Dialect::Sqlite => &SQLITE_SCRIPTS,
            Dialect::Postgres => &POSTGRES_SCRIPTS,
        };

        let migrations = DEFINITIONS
            .iter()
            .zip(scripts.iter())
            .map(|(&(version, description), &(up, down))| {
                Migration::new(version, description, up, down)
            })
            .collect();

        Self::new(migrations)
    }

    /// All migrations, ascending by version
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Iterate in ascending version order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Migration> {
        self.migrations.iter()
    }

    /// Number of migrations
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// True when the catalog has no migrations
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Look up a migration by version
    pub fn get(&self, version: i64) -> Option<&Migration> {
        self.migrations
            .binary_search_by_key(&version, |m| m.version)
            .ok()
            .map(|idx| &self.migrations[idx])
    }

    /// Highest version, or 0 when empty
    pub fn latest_version(&self) -> i64 {
        self.migrations.last().map_or(0, |m| m.version)
    }

    /// Entries with `from < version <= to`, ascending
    pub(crate) fn range(&self, from: i64, to: i64) -> impl DoubleEndedIterator<Item = &Migration> {
        self.migrations
            .iter()
            .filter(move |m| m.version > from && m.version <= to)
    }
}
