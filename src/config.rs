/// DotVest configuration from environment variables
///
/// Controls the chain set, RPC endpoints, price service and refresh cadence.
/// Defaults target Polkadot mainnet and its parachains.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::chains::{default_chains, ChainConfig};

pub const DEFAULT_APP_NAME: &str = "DotVest";
pub const DEFAULT_PRICE_API_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Clone, Debug)]
pub struct DotvestConfig {
    /// Name presented to wallet extensions when requesting authorization
    pub app_name: String,
    /// Price service base URL
    pub price_api_url: String,
    /// How long a fetched price stays fresh
    pub price_ttl: Duration,
    /// Portfolio refresh cadence while a wallet is connected
    pub refresh_interval: Duration,
    /// Grace period for providers to inject themselves before discovery
    pub discovery_delay: Duration,
    /// Directory holding the persisted session file
    pub storage_dir: PathBuf,
    /// Chains aggregated into the portfolio
    pub chains: Vec<ChainConfig>,
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("⚠️  Invalid value '{}' for {}, using default", raw, key);
                default
            }
        },
        Err(_) => default,
    }
}

impl DotvestConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `DOTVEST_APP_NAME`: name shown in extension authorization prompts
    /// - `DOTVEST_PRICE_API_URL`: price service base URL
    /// - `DOTVEST_PRICE_TTL_SECS`, `DOTVEST_REFRESH_SECS`, `DOTVEST_DISCOVERY_DELAY_MS`
    /// - `DOTVEST_STORAGE_DIR`: where the session file lives
    /// - `DOTVEST_CHAINS`: comma separated chain ids (default: all)
    /// - `DOTVEST_RPC_<CHAIN>`: per-chain RPC endpoint, e.g. `DOTVEST_RPC_ACALA`
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Only Polkadot and Acala, Acala through a local node
    /// DOTVEST_CHAINS=polkadot,acala DOTVEST_RPC_ACALA=ws://localhost:9944 cargo run
    /// ```
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let app_name = env::var("DOTVEST_APP_NAME").unwrap_or(defaults.app_name);
        let price_api_url = env::var("DOTVEST_PRICE_API_URL").unwrap_or(defaults.price_api_url);
        log::info!("💱 Price API: {}", price_api_url);

        let price_ttl =
            Duration::from_secs(env_parse("DOTVEST_PRICE_TTL_SECS", defaults.price_ttl.as_secs()));
        let refresh_interval = Duration::from_secs(env_parse(
            "DOTVEST_REFRESH_SECS",
            defaults.refresh_interval.as_secs(),
        ));
        let discovery_delay = Duration::from_millis(env_parse(
            "DOTVEST_DISCOVERY_DELAY_MS",
            defaults.discovery_delay.as_millis() as u64,
        ));

        let storage_dir = env::var("DOTVEST_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);

        let chains = Self::chains_from_env(defaults.chains);
        for chain in &chains {
            log::info!("🔗 {} RPC: {}", chain.name, chain.rpc_url);
        }

        Self {
            app_name,
            price_api_url,
            price_ttl,
            refresh_interval,
            discovery_delay,
            storage_dir,
            chains,
        }
    }

    fn chains_from_env(all: Vec<ChainConfig>) -> Vec<ChainConfig> {
        let selected: Option<Vec<String>> = env::var("DOTVEST_CHAINS").ok().map(|raw| {
            raw.split(',')
                .map(|id| id.trim().to_lowercase())
                .filter(|id| !id.is_empty())
                .collect()
        });

        if let Some(ids) = &selected {
            for id in ids {
                if !all.iter().any(|c| &c.id == id) {
                    log::warn!("⚠️  Unknown chain '{}' in DOTVEST_CHAINS, ignoring", id);
                }
            }
        }

        all.into_iter()
            .filter(|chain| match &selected {
                Some(ids) => ids.iter().any(|id| id == &chain.id),
                None => true,
            })
            .map(|mut chain| {
                if let Ok(url) = env::var(chain.rpc_env_var()) {
                    chain.rpc_url = url;
                }
                chain
            })
            .collect()
    }

    /// Look up a configured chain by id
    pub fn chain(&self, id: &str) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.id == id)
    }
}

impl Default for DotvestConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            price_api_url: DEFAULT_PRICE_API_URL.to_string(),
            price_ttl: Duration::from_secs(300),
            refresh_interval: Duration::from_secs(30),
            discovery_delay: Duration::from_millis(1000),
            storage_dir: PathBuf::from("./dotvest-data"),
            chains: default_chains(),
        }
    }
}
