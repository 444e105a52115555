//! Migration Rollback - reverse steps and full reset
//!
//! Reverse steps mirror forward steps: reverse script plus version-row delete
//! in one transaction, strictly in descending version order.

use std::time::Instant;

use sqlx::Executor;
use tracing::{info, warn};

use crate::definitions::{Migration, MigrationReport, Target};
use crate::error::{Direction, MigrationError, MigrationResult};
use crate::runner::Migrator;

impl Migrator {
    /// Undo one migration and delete its version row, in a single transaction
    pub(crate) async fn revert(&self, migration: &Migration) -> MigrationResult<()> {
        let version = migration.version;
        let direction = Direction::Down;

        let down_sql = migration
            .down_sql
            .as_deref()
            .ok_or(MigrationError::NoRollback { version })?;

        info!(version, description = %migration.description, "Rolling back migration");

        let mut transaction = self.pool().begin().await.map_err(|source| {
            MigrationError::Transaction {
                version,
                direction,
                source,
            }
        })?;

        let result = async {
            (&mut *transaction)
                .execute(down_sql)
                .await
                .map_err(|source| MigrationError::StepFailed {
                    version,
                    direction,
                    source,
                })?;
            self.store()
                .record_rolled_back(&mut *transaction, version)
                .await
        }
        .await;

        if let Err(err) = result {
            if let Err(rollback_err) = transaction.rollback().await {
                warn!(version, error = %rollback_err, "Failed to roll back rollback transaction");
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

        info!(version, "Successfully rolled back migration");
        Ok(())
    }

    /// Unwind every applied migration, drop the version table and rebuild
    /// from scratch.
    ///
    /// Destructive. Refuses up front, touching nothing, if any applied
    /// migration has no reverse script.
    pub async fn reset(&self) -> MigrationResult<MigrationReport> {
        let start_time = Instant::now();
        warn!("Resetting database - this will drop all tables!");

        let applied = match self.store().applied_versions(self.pool()).await {
            Ok(applied) => applied,
            Err(err) => {
                info!(error = %err, "Could not read applied migrations, assuming empty database");
                Vec::new()
            }
        };
        let current = applied.last().copied().unwrap_or(0);

        let irreversible: Vec<i64> = applied
            .iter()
            .copied()
            .filter(|version| {
                self.catalog()
                    .get(*version)
                    .map_or(false, |migration| !migration.is_reversible())
            })
            .collect();
        if !irreversible.is_empty() {
            return Err(MigrationError::IrreversibleReset {
                versions: irreversible,
            });
        }

        let rolled_back = if current > 0 {
            self.migrate_to(Target::Version(0))
                .await
                .map_err(|err| {
                    warn!(error = %err, "Failed to roll back migrations during reset");
                    err
                })?
                .rolled_back
        } else {
            Vec::new()
        };

        self.store().drop_table(self.pool()).await?;
        info!(table = self.store().table(), "Dropped version table");

        let mut report = self.up().await?;
        report.from = current;
        report.rolled_back = rolled_back;
        report.elapsed_ms = start_time.elapsed().as_millis();
        Ok(report)
    }
}
