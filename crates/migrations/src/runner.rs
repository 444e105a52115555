//! Migration Runner - moves the schema between versions
//!
//! Each step runs in its own transaction together with the version-store write
//! that describes it. A failed step is rolled back and aborts the whole call;
//! steps that already committed stay committed.

use std::time::Instant;

use sqlx::{AnyPool, Executor};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::definitions::{AppliedMigration, Migration, MigrationReport, Target};
use crate::dialect::Dialect;
use crate::error::{Direction, MigrationError, MigrationResult};
use crate::store::VersionStore;

/// Orchestrates migrations for one database and one dialect
pub struct Migrator {
    pool: AnyPool,
    dialect: Dialect,
    catalog: Catalog,
    store: VersionStore,
}

impl Migrator {
    /// Create a migrator using the built-in catalog for `dialect`
    pub fn new(pool: AnyPool, dialect: Dialect) -> MigrationResult<Self> {
        let catalog = Catalog::for_dialect(dialect)?;
        Ok(Self::with_catalog(pool, dialect, catalog))
    }

    /// Create a migrator from a dialect name such as `"sqlite"` or `"postgres"`
    pub fn from_dialect_name(pool: AnyPool, dialect: &str) -> MigrationResult<Self> {
        Self::new(pool, dialect.parse()?)
    }

    /// Create a migrator over a caller-supplied catalog
    pub fn with_catalog(pool: AnyPool, dialect: Dialect, catalog: Catalog) -> Self {
        Self {
            pool,
            dialect,
            catalog,
            store: VersionStore::new(dialect),
        }
    }

    /// Track versions in a table other than `schema_versions`
    pub fn with_version_table(mut self, table: impl Into<String>) -> Self {
        self.store = VersionStore::with_table(self.dialect, table);
        self
    }

    /// Get the database pool
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Dialect the catalog and version table were built for
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Get the migration catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Get the version-table accessor
    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    /// Create the version table if it does not exist yet
    pub async fn ensure_version_table(&self) -> MigrationResult<()> {
        self.store.ensure_table_exists(&self.pool).await
    }

    /// Highest applied version; 0 on a database that was never migrated
    pub async fn current_version(&self) -> MigrationResult<i64> {
        self.store.ensure_table_exists(&self.pool).await?;
        self.store.current_version(&self.pool).await
    }

    /// Applied versions, ascending
    pub async fn applied_versions(&self) -> MigrationResult<Vec<i64>> {
        self.store.ensure_table_exists(&self.pool).await?;
        self.store.applied_versions(&self.pool).await
    }

    /// Applied migration records, ascending
    pub async fn applied_migrations(&self) -> MigrationResult<Vec<AppliedMigration>> {
        self.store.ensure_table_exists(&self.pool).await?;
        self.store.applied_migrations(&self.pool).await
    }

    /// Apply every pending migration
    pub async fn up(&self) -> MigrationResult<MigrationReport> {
        self.migrate_to(Target::Latest).await
    }

    /// Move the schema to `target`, forwards or backwards
    pub async fn migrate_to(&self, target: impl Into<Target>) -> MigrationResult<MigrationReport> {
        let start_time = Instant::now();

        self.store.ensure_table_exists(&self.pool).await?;
        let current = self.store.current_version(&self.pool).await?;
        let target = self.resolve_target(target.into())?;

        info!(
            current_version = current,
            target_version = target,
            "Starting migration"
        );

        let mut report = MigrationReport {
            from: current,
            to: current,
            ..Default::default()
        };

        if current == target {
            info!(version = target, "Database is already at target version");
            report.elapsed_ms = start_time.elapsed().as_millis();
            return Ok(report);
        }

        if current > self.catalog.latest_version() {
            return Err(MigrationError::NotInCatalog { version: current });
        }

        if current < target {
            for migration in self.catalog.range(current, target) {
                self.apply(migration).await?;
                report.applied.push(migration.version);
                report.to = migration.version;
            }
        } else {
            for migration in self.catalog.range(target, current).rev() {
                self.revert(migration).await?;
                report.rolled_back.push(migration.version);
            }
            report.to = target;
        }

        report.elapsed_ms = start_time.elapsed().as_millis();
        info!(
            from = report.from,
            to = report.to,
            applied = report.applied.len(),
            rolled_back = report.rolled_back.len(),
            elapsed_ms = report.elapsed_ms as u64,
            "Migration finished"
        );

        Ok(report)
    }

    /// Resolve `Latest` and reject versions the catalog does not know
    fn resolve_target(&self, target: Target) -> MigrationResult<i64> {
        let latest = self.catalog.latest_version();
        match target {
            Target::Latest => Ok(latest),
            Target::Version(0) => Ok(0),
            Target::Version(version) if self.catalog.get(version).is_some() => Ok(version),
            Target::Version(version) => Err(MigrationError::UnknownTarget {
                target: version,
                latest,
            }),
        }
    }

    /// Run one forward step and record it, in a single transaction
    async fn apply(&self, migration: &Migration) -> MigrationResult<()> {
        let version = migration.version;
        let direction = Direction::Up;

        info!(version, description = %migration.description, "Applying migration");

        let mut transaction = self.pool.begin().await.map_err(|source| {
            MigrationError::Transaction {
                version,
                direction,
                source,
            }
        })?;

        let checksum = migration.checksum();
        let result = async {
            (&mut *transaction)
                .execute(migration.up_sql.as_str())
                .await
                .map_err(|source| MigrationError::StepFailed {
                    version,
                    direction,
                    source,
                })?;
            self.store
                .record_applied(&mut *transaction, migration, &checksum)
                .await
        }
        .await;

        if let Err(err) = result {
            if let Err(rollback_err) = transaction.rollback().await {
                warn!(version, error = %rollback_err, "Failed to roll back migration transaction");
            }
            return Err(err);
        }

        transaction
            .commit()
            .await
            .map_err(|source| MigrationError::Transaction {
                version,
                direction,
                source,
            })?;

        debug!(version, checksum = %checksum, "Recorded migration");
        info!(version, "Successfully applied migration");
        Ok(())
    }
}
