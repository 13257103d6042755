use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use livesync::{
    arguments::{self, print_debug_info, print_help},
    config::{self, HubConfig},
    live::{Hub, HubSettings, SessionSettings},
    logger::{self, LogTag},
    paths,
    webserver::{self, AppState},
};

/// Entry point for the livesync hub
///
/// Loads configuration, starts the dispatch loop, and serves the WebSocket
/// endpoint until Ctrl+C.
#[tokio::main]
async fn main() {
    if arguments::is_help_requested() {
        print_help();
        std::process::exit(0);
    }
    if arguments::is_version_requested() {
        println!("livesync {}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    logger::init();

    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            logger::error(LogTag::System, &format!("{:#}", e));
            1
        }
    };

    logger::flush();
    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    logger::info(
        LogTag::System,
        &format!("livesync {} starting up", env!("CARGO_PKG_VERSION")),
    );
    print_debug_info();

    let config_path = arguments::get_config_path_override()
        .map(PathBuf::from)
        .unwrap_or_else(paths::get_config_path);
    config::load_config_from_path(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;

    let (mut server_config, hub_config, logging_config) = config::with_config(|cfg| {
        (cfg.server.clone(), cfg.hub.clone(), cfg.logging.clone())
    });
    logger::apply_settings(logging_config.file_enabled, &logging_config.min_level);

    if let Some(host) = arguments::get_host_override() {
        server_config.host = host;
    }
    if let Some(port) = arguments::get_port_override() {
        server_config.port = port;
    }

    let hub = start_hub(&hub_config);
    let state = Arc::new(AppState::new(
        hub,
        SessionSettings::from(&hub_config),
        server_config,
    ));

    tokio::spawn(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                logger::info(LogTag::System, "Shutdown requested (Ctrl+C)");
                webserver::shutdown();
            }
            Err(e) => logger::warning(
                LogTag::System,
                &format!("Cannot listen for Ctrl+C: {}", e),
            ),
        }
    });

    webserver::start_server(state)
        .await
        .map_err(anyhow::Error::msg)
        .context("webserver failed")?;

    logger::info(LogTag::System, "livesync stopped");
    Ok(())
}

fn start_hub(config: &HubConfig) -> Hub {
    let settings = HubSettings::from(config);
    logger::info(
        LogTag::Hub,
        &format!(
            "Hub started (client queue={}, event queue={}, read timeout={}s, write timeout={}s)",
            settings.client_queue_capacity,
            settings.event_queue_capacity,
            config.read_timeout_secs,
            config.write_timeout_secs
        ),
    );
    Hub::spawn(settings)
}
