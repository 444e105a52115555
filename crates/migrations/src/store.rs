//! Version Store - durable bookkeeping of applied migrations
//!
//! One row per applied version in `schema_versions`. Rows are inserted when a
//! forward step commits and deleted when its rollback commits; they are never
//! updated in place.

use sqlx::{AnyConnection, AnyPool, Row};

use crate::definitions::{parse_applied_at, AppliedMigration, Migration};
use crate::dialect::Dialect;
use crate::error::{MigrationError, MigrationResult};

/// Default name of the version-tracking table
pub const VERSION_TABLE: &str = "schema_versions";

/// Accessor for the version-tracking table
#[derive(Debug, Clone)]
pub struct VersionStore {
    dialect: Dialect,
    table: String,
}

impl VersionStore {
    /// Accessor for the default `schema_versions` table
    pub fn new(dialect: Dialect) -> Self {
        Self::with_table(dialect, VERSION_TABLE)
    }

    /// Accessor for a custom table name
    pub fn with_table(dialect: Dialect, table: impl Into<String>) -> Self {
        Self {
            dialect,
            table: table.into(),
        }
    }

    /// Name of the tracking table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the table if missing. Runs outside any migration transaction.
    pub async fn ensure_table_exists(&self, pool: &AnyPool) -> MigrationResult<()> {
        sqlx::query(&self.create_table_sql())
            .execute(pool)
            .await
            .map_err(MigrationError::store("create the version table"))?;
        Ok(())
    }

    /// Highest applied version, 0 when nothing is applied
    pub async fn current_version(&self, pool: &AnyPool) -> MigrationResult<i64> {
        let sql = format!(
            "SELECT CAST(COALESCE(MAX(version), 0) AS BIGINT) FROM {}",
            self.table
        );
        let row = sqlx::query(&sql)
            .fetch_one(pool)
            .await
            .map_err(MigrationError::store("read the current version"))?;

        row.try_get::<i64, _>(0)
            .map_err(MigrationError::store("decode the current version"))
    }

    /// All applied versions, ascending
    pub async fn applied_versions(&self, pool: &AnyPool) -> MigrationResult<Vec<i64>> {
        let sql = format!(
            "SELECT CAST(version AS BIGINT) AS version FROM {} ORDER BY version",
            self.table
        );
        let rows = sqlx::query(&sql)
            .fetch_all(pool)
            .await
            .map_err(MigrationError::store("query applied migrations"))?;

        rows.iter()
            .map(|row| row.try_get::<i64, _>("version"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(MigrationError::store("decode an applied version"))
    }

    /// Full records of all applied migrations, ascending by version
    pub async fn applied_migrations(&self, pool: &AnyPool) -> MigrationResult<Vec<AppliedMigration>> {
        let sql = format!(
            "SELECT CAST(version AS BIGINT) AS version, description, \
             COALESCE(CAST(applied_at AS TEXT), '') AS applied_at, \
             COALESCE(checksum, '') AS checksum \
             FROM {} ORDER BY version",
            self.table
        );
        let rows = sqlx::query(&sql)
            .fetch_all(pool)
            .await
            .map_err(MigrationError::store("query applied migrations"))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let version: i64 = row
                .try_get("version")
                .map_err(MigrationError::store("decode an applied version"))?;
            let description: String = row
                .try_get("description")
                .map_err(MigrationError::store("decode a migration description"))?;
            // Nullable columns are coalesced to '' in the query
            let applied_at: String = row
                .try_get("applied_at")
                .map_err(MigrationError::store("decode applied_at"))?;
            let checksum: String = row
                .try_get("checksum")
                .map_err(MigrationError::store("decode a checksum"))?;

            records.push(AppliedMigration {
                version,
                description,
                applied_at: parse_applied_at(&applied_at),
                checksum,
            });
        }

        Ok(records)
    }

    /// Insert the row for `migration`. Must run on the step's transaction.
    pub async fn record_applied(
        &self,
        conn: &mut AnyConnection,
        migration: &Migration,
        checksum: &str,
    ) -> MigrationResult<()> {
        let sql = format!(
            "INSERT INTO {} (version, description, checksum) VALUES ({}, {}, {})",
            self.table,
            self.dialect.placeholder(1),
            self.dialect.placeholder(2),
            self.dialect.placeholder(3),
        );
        sqlx::query(&sql)
            .bind(migration.version)
            .bind(migration.description.as_str())
            .bind(checksum)
            .execute(conn)
            .await
            .map_err(MigrationError::store("record an applied migration"))?;
        Ok(())
    }

    /// Delete the row for `version`. Must run on the step's transaction.
    pub async fn record_rolled_back(&self, conn: &mut AnyConnection, version: i64) -> MigrationResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE version = {}",
            self.table,
            self.dialect.placeholder(1)
        );
        sqlx::query(&sql)
            .bind(version)
            .execute(conn)
            .await
            .map_err(MigrationError::store("remove a migration record"))?;
        Ok(())
    }

    /// Drop the tracking table. Only `reset` does this.
    pub async fn drop_table(&self, pool: &AnyPool) -> MigrationResult<()> {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", self.table))
            .execute(pool)
            .await
            .map_err(MigrationError::store("drop the version table"))?;
        Ok(())
    }

    pub(crate) fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                version INTEGER PRIMARY KEY,\n    \
                description TEXT NOT NULL,\n    \
                applied_at {},\n    \
                checksum TEXT\n\
            )",
            self.table,
            self.dialect.timestamp_column()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_sql_per_dialect() {
        let sqlite = VersionStore::new(Dialect::Sqlite).create_table_sql();
        assert!(sqlite.contains("CREATE TABLE IF NOT EXISTS schema_versions"));
        assert!(sqlite.contains("version INTEGER PRIMARY KEY"));
        assert!(sqlite.contains("applied_at DATETIME DEFAULT CURRENT_TIMESTAMP"));

        let postgres = VersionStore::new(Dialect::Postgres).create_table_sql();
        assert!(postgres.contains("applied_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()"));
        assert!(postgres.contains("checksum TEXT"));
    }

    #[test]
    fn test_custom_table_name() {
        let store = VersionStore::with_table(Dialect::Sqlite, "app_versions");
        assert_eq!(store.table(), "app_versions");
        assert!(store.create_table_sql().contains("IF NOT EXISTS app_versions"));
    }
}
