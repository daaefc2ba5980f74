//! Wallet extension discovery
//!
//! Providers register themselves in an [`InjectedWeb3`] registry under a
//! well-known key, possibly some time after start-up. Discovery waits a short
//! grace period and then reports, for every supported brand, whether its key
//! is present. Absence is a normal state, not an error.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExtensionError;

/// Wallet brands the dashboard knows how to talk to: (provider key, display name)
pub const SUPPORTED_WALLETS: [(&str, &str); 3] = [
    ("polkadot-js", "Polkadot.js"),
    ("talisman", "Talisman"),
    ("subwallet-js", "SubWallet"),
];

/// Discovery snapshot for one wallet brand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletExtension {
    pub name: String,
    pub version: String,
    pub installed: bool,
}

/// Account as enumerated by an extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedAccount {
    pub address: String,
    pub name: Option<String>,
}

/// An injected wallet provider
#[async_trait]
pub trait InjectedProvider: Send + Sync {
    fn version(&self) -> String;

    /// Ask the user to authorize `app_name`
    async fn enable(&self, app_name: &str) -> Result<Arc<dyn InjectedSession>, ExtensionError>;
}

/// Capabilities granted after authorization
#[async_trait]
pub trait InjectedSession: Send + Sync {
    async fn accounts(&self) -> Result<Vec<InjectedAccount>, ExtensionError>;
}

/// Shared registry of injected providers, keyed by provider key
#[derive(Clone, Default)]
pub struct InjectedWeb3 {
    providers: Arc<RwLock<HashMap<String, Arc<dyn InjectedProvider>>>>,
}

impl InjectedWeb3 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, key: impl Into<String>, provider: Arc<dyn InjectedProvider>) {
        let key = key.into();
        log::debug!("Provider injected: {}", key);
        self.providers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, provider);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn InjectedProvider>> {
        self.providers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// All injected providers, ordered by key
    pub fn providers(&self) -> Vec<(String, Arc<dyn InjectedProvider>)> {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<_> = providers
            .iter()
            .map(|(k, p)| (k.clone(), p.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().unwrap_or_else(|e| e.into_inner()).is_empty()
    }
}

/// Report which supported wallets are installed after `delay`
pub async fn discover(registry: &InjectedWeb3, delay: Duration) -> Vec<WalletExtension> {
    tokio::time::sleep(delay).await;

    let extensions: Vec<WalletExtension> = SUPPORTED_WALLETS
        .iter()
        .map(|(key, name)| match registry.get(key) {
            Some(provider) => WalletExtension {
                name: name.to_string(),
                version: provider.version(),
                installed: true,
            },
            None => WalletExtension {
                name: name.to_string(),
                version: String::new(),
                installed: false,
            },
        })
        .collect();

    let installed = extensions.iter().filter(|e| e.installed).count();
    log::info!("Discovered {} of {} supported wallet extensions", installed, extensions.len());
    extensions
}

/// Provider exposing a fixed set of addresses without signing capability
///
/// Stands in for a browser extension when running headless.
#[derive(Clone)]
pub struct WatchOnlyProvider {
    accounts: Vec<InjectedAccount>,
}

impl WatchOnlyProvider {
    pub fn new(addresses: impl IntoIterator<Item = String>) -> Self {
        let accounts = addresses
            .into_iter()
            .enumerate()
            .map(|(i, address)| InjectedAccount {
                address,
                name: Some(format!("Watch {}", i + 1)),
            })
            .collect();
        Self { accounts }
    }
}

#[async_trait]
impl InjectedProvider for WatchOnlyProvider {
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    async fn enable(&self, app_name: &str) -> Result<Arc<dyn InjectedSession>, ExtensionError> {
        log::debug!("Watch-only provider enabled for {}", app_name);
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl InjectedSession for WatchOnlyProvider {
    async fn accounts(&self) -> Result<Vec<InjectedAccount>, ExtensionError> {
        Ok(self.accounts.clone())
    }
}
