pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{ConversionRequest, RatesProvider};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Convert {
        amount: f64,
        from: String,
        to: String,
    },
    Rates {
        base: Option<String>,
    },
    Currencies,
    Interactive,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxconv starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    run_with_config(command, config).await
}

/// Runs `command` against an already resolved config.
pub async fn run_with_config(command: AppCommand, config: AppConfig) -> Result<()> {
    debug!("Using config: {config:#?}");

    let provider: Arc<dyn RatesProvider> =
        Arc::new(providers::FxRatesProvider::new(&config.providers.fxrates)?);
    let base = config.base_currency.as_str();

    match command {
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(provider, base, ConversionRequest::new(amount, &from, &to)).await
        }
        AppCommand::Rates { base: override_base } => {
            let base = override_base.map_or_else(|| base.to_string(), |b| b.to_uppercase());
            cli::rates::run(provider, &base).await
        }
        AppCommand::Currencies => cli::currencies::run(provider).await,
        AppCommand::Interactive => {
            let request = ConversionRequest::new(
                config.default_amount,
                &config.default_from,
                &config.default_to,
            );
            cli::interactive::run(provider, base, request).await
        }
    }
}
