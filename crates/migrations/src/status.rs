//! Read-only reporting: status and checksum validation

use std::collections::HashSet;

use tracing::debug;

use crate::definitions::MigrationStatus;
use crate::error::{MigrationError, MigrationResult};
use crate::runner::Migrator;

impl Migrator {
    /// One entry per catalog migration, ascending, flagged applied or not
    pub async fn status(&self) -> MigrationResult<Vec<MigrationStatus>> {
        let applied: HashSet<i64> = self.applied_versions().await?.into_iter().collect();

        Ok(self
            .catalog()
            .iter()
            .map(|migration| MigrationStatus {
                version: migration.version,
                description: migration.description.clone(),
                applied: applied.contains(&migration.version),
            })
            .collect())
    }

    /// Versions in the catalog that are not applied yet, ascending
    pub async fn pending_versions(&self) -> MigrationResult<Vec<i64>> {
        Ok(self
            .status()
            .await?
            .into_iter()
            .filter(|status| !status.applied)
            .map(|status| status.version)
            .collect())
    }

    /// Check every applied migration against the catalog.
    ///
    /// Fails on the first applied version missing from the catalog or whose
    /// stored checksum differs from the catalog's forward script. Returns the
    /// number of migrations verified.
    pub async fn validate(&self) -> MigrationResult<usize> {
        let records = self.applied_migrations().await?;

        for record in &records {
            let migration = self
                .catalog()
                .get(record.version)
                .ok_or(MigrationError::NotInCatalog {
                    version: record.version,
                })?;

            let expected = migration.checksum();
            if record.checksum != expected {
                return Err(MigrationError::ChecksumMismatch {
                    version: record.version,
                    expected,
                    actual: record.checksum.clone(),
                });
            }
            debug!(version = record.version, "Checksum verified");
        }

        Ok(records.len())
    }
}
