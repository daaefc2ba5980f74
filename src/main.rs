use std::env;
use std::sync::Arc;

use dotvest::{
    discover, ChainBalanceFetcher, CoinGeckoSource, DotvestConfig, FileStore, InjectedWeb3,
    PortfolioAggregator, PriceFetcher, RefreshOutcome, SessionError, SessionManager,
    WatchOnlyProvider, WsConnector,
};

/// Restore the saved session or connect a fresh one
async fn open_session(config: &DotvestConfig) -> dotvest::Result<SessionManager> {
    let registry = InjectedWeb3::new();

    // Headless stand-in for a browser extension
    let watched: Vec<String> = env::var("DOTVEST_WATCH_ADDRESSES")
        .unwrap_or_default()
        .split(',')
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    for address in &watched {
        if !dotvest::ss58::is_valid(address) {
            log::warn!("⚠️  {} is not a valid SS58 address", address);
        }
    }
    if !watched.is_empty() {
        registry.inject("polkadot-js", Arc::new(WatchOnlyProvider::new(watched)));
    }

    for extension in discover(&registry, config.discovery_delay).await {
        log::info!(
            "{} {}",
            extension.name,
            if extension.installed { "installed" } else { "not installed" }
        );
    }

    let store = Arc::new(FileStore::new_with_base_dir(config.storage_dir.clone())?);
    let mut session = SessionManager::new(registry.clone(), store, config.app_name.clone());

    if registry.is_empty() && session.restore()? {
        return Ok(session);
    }
    session.connect(None).await?;
    Ok(session)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    // Set RUST_LOG=debug for RPC traffic
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DotvestConfig::from_env();

    let session = match open_session(&config).await {
        Ok(session) => session,
        Err(dotvest::DotvestError::Session(SessionError::NoExtensionFound)) => {
            log::error!("Set DOTVEST_WATCH_ADDRESSES to a comma separated list of addresses");
            anyhow::bail!(SessionError::NoExtensionFound);
        }
        Err(e) => return Err(e.into()),
    };

    for account in session.connected_accounts() {
        log::info!("👛 {} ({}) via {}", account.display_name(), account.address, account.source);
    }

    let prices = Arc::new(PriceFetcher::new(
        Arc::new(CoinGeckoSource::new(config.price_api_url.clone())),
        config.price_ttl,
    ));
    let aggregator = Arc::new(PortfolioAggregator::new(
        ChainBalanceFetcher::new(Arc::new(WsConnector)),
        prices,
        config.chains.clone(),
        session.subscribe(),
    ));

    if env::var("DOTVEST_FOLLOW").map(|v| v == "1").unwrap_or(false) {
        log::info!("Refreshing every {:?}, Ctrl-C to stop", config.refresh_interval);
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl-C: {}", e);
            }
        };
        aggregator.run(config.refresh_interval, shutdown).await;
        return Ok(());
    }

    match aggregator.refresh().await {
        RefreshOutcome::Ready(snapshot) => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        RefreshOutcome::Failed(failures) => {
            for failure in failures {
                log::error!("{}: {}", failure.chain, failure.reason);
            }
            anyhow::bail!("no chain returned a balance");
        }
        other => log::warn!("Portfolio not refreshed: {:?}", other),
    }
    Ok(())
}
