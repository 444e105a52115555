//! Connection helper for the `Any` driver

use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use tracing::debug;

use crate::error::{MigrationError, MigrationResult};

/// Open a single-connection pool for `url` (`sqlite://...` or `postgres://...`).
///
/// The migrator assumes it is the only writer, so the pool never hands out a
/// second connection and never recycles the one it has.
pub async fn connect(url: &str) -> MigrationResult<AnyPool> {
    install_default_drivers();

    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(url)
        .await
        .map_err(MigrationError::Connection)?;

    debug!("Database connection established");
    Ok(pool)
}
