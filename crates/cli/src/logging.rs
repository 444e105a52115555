//! tracing-subscriber setup for the migration tool

use std::io;

use anyhow::Context;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Filter directive for a configured level. sqlx statement logging stays at
/// warn unless `RUST_LOG` asks for more.
pub fn filter_directive(level: &str) -> String {
    format!("{},sqlx=warn", level.to_lowercase())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(&config.level)))
        .context("invalid log filter")?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format.to_lowercase().as_str() {
        "json" => registry
            .with(Layer::new().with_writer(io::stdout).json())
            .try_init(),
        "pretty" => registry
            .with(Layer::new().with_writer(io::stdout).pretty())
            .try_init(),
        _ => registry
            .with(Layer::new().with_writer(io::stdout).compact())
            .try_init(),
    };
    result.context("failed to install the tracing subscriber")?;

    tracing::debug!(
        level = %config.level,
        format = %config.format,
        "Logging initialized"
    );
    Ok(())
}
