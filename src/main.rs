use anyhow::Context as _;
use ircbot::AccessList;
use ircbot::Client;
use ircbot::Config;
use ircbot::QuitHandle;
use ircbot::Services;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(true)
        .init();

    info!(
        nick = %config.nickname,
        server = %config.server.address,
        port = config.server.port,
        "starting"
    );

    let access = AccessList::new(config.admins.iter().cloned());
    let services = Services::from_config(&config).context("failed to set up HTTP services")?;

    let client = Client::builder(config)
        .with_access(access)
        .with_services(services)
        .await?;

    tokio::spawn(watch_interrupts(client.quit_handle()));

    if let Err(err) = client.run().await {
        error!("{err}");
        return Err(err.into());
    }
    info!("bye");
    Ok(())
}

/// First interrupt quits gracefully, the second exits on the spot.
async fn watch_interrupts(quit: QuitHandle) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("interrupt received, quitting");
    quit.quit();

    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("second interrupt, exiting now");
        std::process::exit(130);
    }
}
