pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::session::Session;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Convert {
        amount: f64,
        from: Option<String>,
        to: Option<String>,
        swap: bool,
    },
    Rates,
    Refresh,
    History,
    ClearHistory,
    Currencies,
    Shell,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Cambio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    if let AppCommand::Currencies = command {
        cli::commands::currencies(&config.currency_set()?);
        return Ok(());
    }

    let mut session = build_session(&config)?;
    let pb = cli::ui::new_spinner("Loading exchange rates...");
    session.initialize().await;
    pb.finish_and_clear();

    match command {
        AppCommand::Convert {
            amount,
            from,
            to,
            swap,
        } => {
            cli::commands::convert(&mut session, amount, from.as_deref(), to.as_deref(), swap)
                .await
        }
        AppCommand::Rates => cli::commands::rates(&session),
        AppCommand::Refresh => cli::commands::refresh(&mut session).await,
        AppCommand::History => {
            cli::commands::history(&session);
            Ok(())
        }
        AppCommand::ClearHistory => {
            cli::commands::clear_history(&mut session).await;
            Ok(())
        }
        AppCommand::Shell => cli::shell::run(&mut session).await,
        AppCommand::Currencies => Ok(()),
    }
}

/// Wires the configured feed and store into a new, uninitialized session.
pub fn build_session(config: &AppConfig) -> Result<Session> {
    let currencies = config.currency_set()?;
    let provider_config = &config.providers.exchange_rate;

    let feed = providers::ExchangeRateApiProvider::new(&provider_config.base_url)
        .context("Failed to create rate feed client")?;
    let data_path = config.default_data_path()?;
    debug!(path = %data_path.display(), "Opening data store");
    let store = store::open_store(&data_path);

    let session = Session::new(currencies, Arc::new(feed), store)
        .with_retry_policy(provider_config.retry.clone());
    let (source, target) = session.selection();
    let source = config.default_from.clone().unwrap_or_else(|| source.to_string());
    let target = config.default_to.clone().unwrap_or_else(|| target.to_string());
    session
        .with_selection(&source, &target)
        .context("Invalid default currency pair")
}
