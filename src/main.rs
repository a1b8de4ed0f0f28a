use std::sync::Arc;

use dotenvy::dotenv;

use herald::config::Config;
use herald::error::ApplicationError;
use herald::{logger, monitor};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env()?;

    let _guard = logger::init(&config)?;

    let monitor = config.monitor()?;
    monitor::watch(Arc::new(monitor), config.poll_interval(), config.run_for()).await;

    Ok(())
}
