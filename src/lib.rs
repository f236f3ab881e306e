pub mod api;
pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use anyhow::Result;
use providers::StaticMarketProvider;
use tracing::{debug, info};

pub enum AppCommand {
    Serve,
    Summary { user_id: String },
    Markets,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Dabloan starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load_or_default()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Serve => api::run(&config).await,
        AppCommand::Summary { user_id } => {
            let stores = store::open(&config)?;
            cli::summary::run(stores.positions.as_ref(), &user_id).await
        }
        AppCommand::Markets => {
            let provider = StaticMarketProvider::new(config.markets);
            cli::markets::run(&provider).await
        }
    }
}
