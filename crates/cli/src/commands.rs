use std::io::{self, BufRead, Write};

use anyhow::Context;
use printdis_migrations::{MigrationReport, MigrationStatus, Migrator, Target};
use tracing::info;

use crate::args::Action;

/// Run one resolved action against an open migrator
pub async fn execute(migrator: &Migrator, action: Action, assume_yes: bool) -> anyhow::Result<()> {
    match action {
        Action::Migrate(target) => migrate(migrator, target).await,
        Action::Status => status(migrator, &mut io::stdout()).await,
        Action::Validate => validate(migrator).await,
        Action::Reset => {
            let confirmed = assume_yes || {
                let stdin = io::stdin();
                confirm_reset(&mut stdin.lock(), &mut io::stdout().lock())?
            };
            reset(migrator, confirmed).await
        }
    }
}

pub async fn migrate(migrator: &Migrator, target: Target) -> anyhow::Result<()> {
    match target {
        Target::Latest => info!("Running all pending migrations..."),
        Target::Version(version) => info!(version, "Migrating to version"),
    }

    let report = migrator.migrate_to(target).await?;
    log_report(&report);
    Ok(())
}

pub async fn status(migrator: &Migrator, out: &mut impl Write) -> anyhow::Result<()> {
    let rows = migrator
        .status()
        .await
        .context("Failed to get migration status")?;
    let current = migrator
        .current_version()
        .await
        .context("Failed to get current version")?;

    render_status(&rows, current, out)?;
    Ok(())
}

pub async fn validate(migrator: &Migrator) -> anyhow::Result<()> {
    info!("Validating migrations...");
    let checked = migrator.validate().await?;
    info!(checked, "All migrations are valid");
    Ok(())
}

pub async fn reset(migrator: &Migrator, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        info!("Reset cancelled");
        return Ok(());
    }

    let report = migrator.reset().await?;
    log_report(&report);
    Ok(())
}

/// Ask before a reset. Only `y` or `Y` confirms.
pub fn confirm_reset(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "Are you sure you want to reset the database? (y/N): ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}

pub fn render_status(rows: &[MigrationStatus], current: i64, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Migration Status:")?;
    writeln!(out, "Version | Description                                    | Applied")?;
    writeln!(out, "--------|------------------------------------------------|--------")?;
    for row in rows {
        let applied = if row.applied { "Yes" } else { "No" };
        writeln!(out, "{:<7} | {:<46} | {}", row.version, row.description, applied)?;
    }
    writeln!(out)?;
    writeln!(out, "Current version: {}", current)?;
    Ok(())
}

fn log_report(report: &MigrationReport) {
    if report.is_noop() {
        info!(version = report.to, "Database is up to date");
        return;
    }

    info!(
        from = report.from,
        to = report.to,
        applied = ?report.applied,
        rolled_back = ?report.rolled_back,
        elapsed_ms = report.elapsed_ms as u64,
        "Migration summary"
    );
}
