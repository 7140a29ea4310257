use anyhow::Context;
use std::sync::Arc;
use tokio::time::Duration;

use gradwatch::arguments::{is_help_requested, is_run_enabled, print_help};
use gradwatch::logger::{log, LogTag};
use gradwatch::webserver::{self, state::AppState};
use gradwatch::{Enricher, MigrationSource, ProviderConfig, ScoringConfig, TokenMonitor};

/// Main entry point for gradwatch
///
/// `--run` starts the monitor and HTTP server; `--help` prints usage.
/// Clean shutdown exits 0, fatal init (bad config, bind failure) exits
/// non-zero.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if is_help_requested() {
        print_help();
        return Ok(());
    }

    if !is_run_enabled() {
        log(LogTag::System, "ERROR", "No execution mode specified");
        print_help();
        std::process::exit(1);
    }

    log(LogTag::System, "INFO", "gradwatch starting up");

    let scoring_config = ScoringConfig::from_env();
    let provider_config = ProviderConfig::from_env();

    if provider_config.moralis_keys.is_empty() {
        log(
            LogTag::System,
            "WARN",
            "MORALIS_API_KEY not set - market data providers will return empty results",
        );
    }
    if provider_config.helius_keys.is_empty() {
        log(
            LogTag::System,
            "WARN",
            "HELIUS_API_KEY not set - on-chain probes will return empty results",
        );
    }

    let enricher = Arc::new(
        Enricher::new(&provider_config, scoring_config)
            .map_err(anyhow::Error::msg)
            .context("initializing provider clients")?,
    );

    let source = MigrationSource::new(provider_config.pumpportal_ws_url.clone());
    let monitor = TokenMonitor::new(enricher.clone(), source);
    monitor.start();

    let state = Arc::new(AppState::new(monitor.clone(), enricher));

    // Graceful shutdown: close the migration source, stop the listener,
    // give in-flight enrichments up to 5 seconds to drain
    {
        let monitor = monitor.clone();
        tokio::spawn(async move {
            wait_for_termination().await;
            log(LogTag::System, "INFO", "Termination signal received");
            monitor.stop().await;
            webserver::server::shutdown();
            tokio::time::sleep(Duration::from_secs(5)).await;
            std::process::exit(0);
        });
    }

    webserver::server::start_server(state, provider_config.port)
        .await
        .map_err(anyhow::Error::msg)
        .context("running webserver")?;

    log(LogTag::System, "SUCCESS", "gradwatch stopped cleanly");
    Ok(())
}

async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
