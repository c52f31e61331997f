//! Tracing setup for binaries and demos embedding the engine
use crate::config::CustodyConfig;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a fmt subscriber. `RUST_LOG` wins over the configured level.
/// Fails if a global subscriber is already set.
pub fn init(config: &CustodyConfig) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .try_init()?;
    Ok(())
}
