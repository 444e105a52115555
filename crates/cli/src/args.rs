use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use printdis_migrations::Target;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "printdis-migrate")]
#[command(about = "Apply, roll back and inspect print-dis schema migrations")]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Migration command
    #[arg(long, value_enum, default_value_t = MigrateCommand::Up)]
    pub command: MigrateCommand,

    /// Target version (-1 or omitted: latest)
    #[arg(long, allow_negative_numbers = true)]
    pub version: Option<i64>,

    /// Path to a YAML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Skip the confirmation prompt of `reset`
    #[arg(long, short)]
    pub yes: bool,

    /// Database type (sqlite or postgres)
    #[arg(long)]
    pub db_type: Option<String>,

    /// Database file (SQLite) or database name (PostgreSQL)
    #[arg(long)]
    pub db_path: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateCommand {
    Up,
    Down,
    Status,
    Validate,
    Reset,
}

impl fmt::Display for MigrateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrateCommand::Up => "up",
            MigrateCommand::Down => "down",
            MigrateCommand::Status => "status",
            MigrateCommand::Validate => "validate",
            MigrateCommand::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// What the process will do once the database is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Migrate(Target),
    Status,
    Validate,
    Reset,
}

/// Argument combinations clap cannot reject on its own
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UsageError {
    #[error("--version is required for the down command")]
    MissingDownVersion,
}

impl Cli {
    /// Resolve the command and version into an action, before anything
    /// touches the database.
    pub fn action(&self) -> Result<Action, UsageError> {
        match self.command {
            MigrateCommand::Up => Ok(Action::Migrate(
                self.version.map_or(Target::Latest, Target::from),
            )),
            MigrateCommand::Down => match self.version {
                None | Some(-1) => Err(UsageError::MissingDownVersion),
                Some(version) => Ok(Action::Migrate(Target::Version(version))),
            },
            MigrateCommand::Status => Ok(Action::Status),
            MigrateCommand::Validate => Ok(Action::Validate),
            MigrateCommand::Reset => Ok(Action::Reset),
        }
    }
}
