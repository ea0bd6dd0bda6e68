pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{Currency, RateSource};
use crate::providers::http_provider::HttpRateSource;
use crate::providers::static_provider::StaticRateSource;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that need configuration and a rate source.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Convert {
        amount: String,
        from: Currency,
        to: Currency,
    },
    Rates,
    Watch,
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub fn build_source(config: &AppConfig, offline: bool) -> Result<Arc<dyn RateSource>> {
    if offline {
        info!("Using built-in rates");
        return Ok(Arc::new(StaticRateSource::new()));
    }
    info!(url = %config.provider.url, "Using remote rates");
    let source = HttpRateSource::new(&config.provider.url, config.provider.timeout())?;
    Ok(Arc::new(source))
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    offline: bool,
) -> Result<()> {
    info!("xrate starting...");

    let config = load_config(config_path)?;
    let source = build_source(&config, offline)?;

    match command {
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(source.as_ref(), &amount, from, to).await
        }
        AppCommand::Rates => cli::rates::run(source.as_ref()).await,
        AppCommand::Watch => cli::watch::run(source, &config).await,
    }
}
