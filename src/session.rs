//! Account session management
//!
//! Connects to injected wallet providers, reconciles the reported accounts
//! with locally persisted custom names and selection, and publishes the
//! active selection to whoever aggregates balances for it.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::SessionError;
use crate::extension::{InjectedProvider, InjectedSession, InjectedWeb3};
use crate::storage::{KeyValueStore, SelectionStore, WalletAccount};

/// Active selection as seen by balance consumers
///
/// `generation` increases on every change so in-flight work started for an
/// older selection can be recognised and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub address: Option<String>,
    pub generation: u64,
}

pub struct SessionManager {
    registry: InjectedWeb3,
    store: SelectionStore,
    app_name: String,
    accounts: Vec<WalletAccount>,
    selected: Option<WalletAccount>,
    error: Option<String>,
    selection_tx: watch::Sender<Selection>,
}

impl SessionManager {
    pub fn new(
        registry: InjectedWeb3,
        store: Arc<dyn KeyValueStore>,
        app_name: impl Into<String>,
    ) -> Self {
        let (selection_tx, _) = watch::channel(Selection::default());
        Self {
            registry,
            store: SelectionStore::new(store),
            app_name: app_name.into(),
            accounts: Vec::new(),
            selected: None,
            error: None,
            selection_tx,
        }
    }

    /// Reload the previous session from storage
    ///
    /// Returns `false` when no connected session was persisted. The restored
    /// selection falls back to the first account if the saved address is no
    /// longer in the list.
    pub fn restore(&mut self) -> Result<bool, SessionError> {
        if !self.store.is_connected()? {
            return Ok(false);
        }

        let names = self.store.load_custom_names()?;
        let mut accounts = self.store.load_accounts()?;
        for account in &mut accounts {
            account.custom_name = names.get(&account.address).cloned();
        }
        if accounts.is_empty() {
            log::debug!("Connection flag set but no accounts persisted");
            return Ok(false);
        }

        let saved = self.store.load_selected()?;
        let selected = saved
            .and_then(|addr| accounts.iter().find(|a| a.address == addr).cloned())
            .or_else(|| accounts.first().cloned());

        log::info!("Restored session with {} account(s)", accounts.len());
        self.accounts = accounts;
        self.set_selected(selected);
        Ok(true)
    }

    /// Authorize with every installed provider, or only `wallet_name`
    ///
    /// On failure the accounts and selection are left untouched and the
    /// error message is kept for display.
    pub async fn connect(&mut self, wallet_name: Option<&str>) -> Result<(), SessionError> {
        match self.try_connect(wallet_name).await {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(e) => {
                log::warn!("Wallet connection failed: {}", e);
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn try_connect(&mut self, wallet_name: Option<&str>) -> Result<(), SessionError> {
        let providers: Vec<(String, Arc<dyn InjectedProvider>)> = match wallet_name {
            Some(key) => self
                .registry
                .get(key)
                .map(|p| vec![(key.to_string(), p)])
                .unwrap_or_default(),
            None => self.registry.providers(),
        };

        let app_name = self.app_name.clone();
        let enabled = join_all(providers.into_iter().map(|(key, provider)| {
            let app_name = app_name.clone();
            async move { (key, provider.enable(&app_name).await) }
        }))
        .await;

        let sessions: Vec<(String, Arc<dyn InjectedSession>)> = enabled
            .into_iter()
            .filter_map(|(key, result)| match result {
                Ok(session) => Some((key, session)),
                Err(e) => {
                    log::warn!("Provider {} did not authorize: {}", key, e);
                    None
                }
            })
            .collect();

        if sessions.is_empty() {
            return Err(SessionError::NoExtensionFound);
        }

        let mut accounts = Vec::new();
        let mut seen = HashSet::new();
        for (source, session) in &sessions {
            let injected = match session.accounts().await {
                Ok(list) => list,
                Err(e) => {
                    log::warn!("Failed to list accounts from {}: {}", source, e);
                    continue;
                }
            };
            for account in injected {
                if !seen.insert(account.address.clone()) {
                    continue;
                }
                let name = account
                    .name
                    .unwrap_or_else(|| format!("Account {}", accounts.len() + 1));
                accounts.push(WalletAccount::new(account.address, name, source.clone()));
            }
        }

        if accounts.is_empty() {
            return Err(SessionError::NoAccountsFound);
        }

        let names = self.store.load_custom_names()?;
        for account in &mut accounts {
            account.custom_name = names.get(&account.address).cloned();
        }

        let previous = self.store.load_selected()?;
        let selected = previous
            .and_then(|addr| accounts.iter().find(|a| a.address == addr).cloned())
            .or_else(|| accounts.first().cloned());

        self.store.save_accounts(&accounts)?;
        if let Some(account) = &selected {
            self.store.save_selected(&account.address)?;
        }
        self.store.set_connected()?;

        log::info!(
            "Connected {} account(s) from {} provider(s)",
            accounts.len(),
            sessions.len()
        );
        self.accounts = accounts;
        self.set_selected(selected);
        Ok(())
    }

    /// Make `address` the active account
    ///
    /// Unknown addresses leave the selection unchanged and return `false`.
    pub fn switch_account(&mut self, address: &str) -> Result<bool, SessionError> {
        let Some(account) = self.accounts.iter().find(|a| a.address == address).cloned() else {
            log::warn!("Ignoring switch to unknown account {}", address);
            return Ok(false);
        };

        if self.selected.as_ref().map(|s| s.address.as_str()) == Some(address) {
            return Ok(true);
        }

        self.store.save_selected(address)?;
        log::info!("Switched active account to {}", account.display_name());
        self.set_selected(Some(account));
        Ok(true)
    }

    /// Forget the session locally
    ///
    /// Extension-level authorization is not revoked.
    pub fn disconnect(&mut self) -> Result<(), SessionError> {
        self.accounts.clear();
        self.error = None;
        self.set_selected(None);
        self.store.clear()?;
        log::info!("Wallet disconnected");
        Ok(())
    }

    /// Set (or, with an empty name, remove) the display name override for `address`
    pub fn save_custom_name(&mut self, address: &str, name: &str) -> Result<(), SessionError> {
        let trimmed = name.trim();
        let custom = (!trimmed.is_empty()).then(|| trimmed.to_string());

        let mut names = self.store.load_custom_names()?;
        match &custom {
            Some(n) => names.insert(address.to_string(), n.clone()),
            None => names.remove(address),
        };
        self.store.save_custom_names(&names)?;

        for account in self.accounts.iter_mut().filter(|a| a.address == address) {
            account.custom_name = custom.clone();
        }
        if let Some(selected) = self.selected.as_mut().filter(|s| s.address == address) {
            selected.custom_name = custom;
        }
        Ok(())
    }

    fn set_selected(&mut self, selected: Option<WalletAccount>) {
        let address = selected.as_ref().map(|a| a.address.clone());
        self.selected = selected;
        self.selection_tx.send_modify(|s| {
            s.address = address;
            s.generation += 1;
        });
    }

    /// Receiver that observes every selection change
    pub fn subscribe(&self) -> watch::Receiver<Selection> {
        self.selection_tx.subscribe()
    }

    pub fn selection(&self) -> Selection {
        self.selection_tx.borrow().clone()
    }

    pub fn connected_accounts(&self) -> &[WalletAccount] {
        &self.accounts
    }

    pub fn selected_account(&self) -> Option<&WalletAccount> {
        self.selected.as_ref()
    }

    /// Whether an account is connected and selected
    pub fn is_ready(&self) -> bool {
        self.selected.is_some()
    }

    /// Message of the last failed connection attempt
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::WatchOnlyProvider;
    use crate::storage::MemoryStore;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    fn watch_alice() -> Arc<WatchOnlyProvider> {
        Arc::new(WatchOnlyProvider::new(vec![ALICE.to_string()]))
    }

    fn manager(registry: InjectedWeb3) -> SessionManager {
        SessionManager::new(registry, Arc::new(MemoryStore::new()), "DotVest")
    }

    #[tokio::test]
    async fn test_generation_bumps_on_connect() {
        let registry = InjectedWeb3::new();
        registry.inject("polkadot-js", watch_alice());
        let mut session = manager(registry);
        let rx = session.subscribe();

        session.connect(None).await.unwrap();
        let selection = rx.borrow().clone();
        assert_eq!(selection.address.as_deref(), Some(ALICE));
        assert_eq!(selection.generation, 1);
    }

    #[tokio::test]
    async fn test_duplicate_accounts_across_providers() {
        let registry = InjectedWeb3::new();
        registry.inject("polkadot-js", watch_alice());
        registry.inject("talisman", watch_alice());
        let mut session = manager(registry);

        session.connect(None).await.unwrap();
        assert_eq!(session.connected_accounts().len(), 1);
        assert_eq!(session.connected_accounts()[0].source, "polkadot-js");
    }

    #[tokio::test]
    async fn test_named_wallet_only() {
        let registry = InjectedWeb3::new();
        registry.inject("talisman", watch_alice());
        let mut session = manager(registry);

        let err = session.connect(Some("polkadot-js")).await.unwrap_err();
        assert!(matches!(err, SessionError::NoExtensionFound));
        session.connect(Some("talisman")).await.unwrap();
        assert!(session.is_ready());
        assert_eq!(session.error(), None);
    }
}
