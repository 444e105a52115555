mod args;
mod commands;
mod config;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use printdis_migrations::{connect, Migrator};
use tracing::{error, info};

use args::{Action, Cli};
use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Usage errors are reported before configuration or the database is touched
    let action = match cli.action() {
        Ok(action) => action,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(2);
        }
    };

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logging::init_logging(&config.log) {
        eprintln!("error: {:#}", err);
        return ExitCode::FAILURE;
    }

    match run(&cli, &config, action).await {
        Ok(()) => {
            info!(command = %cli.command, "Migration completed successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(command = %cli.command, error = %format!("{:#}", err), "Migration failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: &Config, action: Action) -> anyhow::Result<()> {
    let dialect = config.db.dialect()?;
    let url = config.db.connection_url()?;

    info!(
        db_type = %dialect,
        database = %config.db.database,
        "Connecting to database"
    );
    let pool = connect(&url).await?;
    let migrator = Migrator::new(pool.clone(), dialect)?;

    let result = commands::execute(&migrator, action, cli.yes).await;
    pool.close().await;
    result
}
