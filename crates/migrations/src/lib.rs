//! # printdis-migrations
//!
//! Versioned, reversible schema migrations for the print-dis database.
//!
//! A [`Catalog`] holds the ordered migrations for one [`Dialect`]. The
//! [`Migrator`] compares it with the `schema_versions` table and moves the
//! schema to a target version one transaction per step, recording a SHA-256
//! checksum of each forward script so later edits can be caught by
//! [`Migrator::validate`].
//!
//! ```rust,ignore
//! use printdis_migrations::{connect, Dialect, Migrator, Target};
//!
//! let pool = connect("sqlite://print-dis.db?mode=rwc").await?;
//! let migrator = Migrator::new(pool, Dialect::Sqlite)?;
//!
//! migrator.up().await?;
//! migrator.migrate_to(Target::Version(2)).await?;
//! for row in migrator.status().await? {
//!     println!("{} {} {}", row.version, row.description, row.applied);
//! }
//! ```
//!
//! Only one migrator may run against a database at a time; there is no
//! cross-process lock.

pub mod catalog;
pub mod checksum;
pub mod database;
pub mod definitions;
pub mod dialect;
pub mod error;
mod rollback;
pub mod runner;
mod status;
pub mod store;

pub use catalog::Catalog;
pub use checksum::checksum;
pub use database::connect;
pub use definitions::{AppliedMigration, Migration, MigrationReport, MigrationStatus, Target};
pub use dialect::Dialect;
pub use error::{Direction, MigrationError, MigrationResult};
pub use runner::Migrator;
pub use store::{VersionStore, VERSION_TABLE};
