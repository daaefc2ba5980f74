//! Typed access to the persisted wallet selection
//!
//! Four keys under a fixed prefix: the JSON account list, the selected
//! address, the JSON custom-name map and a connection flag. Nothing keeps
//! them consistent with each other; the session manager corrects stale
//! entries on the next connect.

use std::collections::HashMap;
use std::sync::Arc;

use super::{KeyValueStore, WalletAccount};
use crate::error::StorageError;

pub const STORAGE_PREFIX: &str = "dotvest_";

const CONNECTED_ACCOUNTS: &str = "connected_accounts";
const SELECTED_ACCOUNT: &str = "selected_account";
const CUSTOM_NAMES: &str = "custom_names";
const WALLET_CONNECTED: &str = "wallet_connected";

#[derive(Clone)]
pub struct SelectionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SelectionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn key(name: &str) -> String {
        format!("{}{}", STORAGE_PREFIX, name)
    }

    pub fn load_accounts(&self) -> Result<Vec<WalletAccount>, StorageError> {
        match self.store.get(&Self::key(CONNECTED_ACCOUNTS))? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn save_accounts(&self, accounts: &[WalletAccount]) -> Result<(), StorageError> {
        let json = serde_json::to_string(accounts)?;
        self.store.set(&Self::key(CONNECTED_ACCOUNTS), &json)
    }

    pub fn load_selected(&self) -> Result<Option<String>, StorageError> {
        self.store.get(&Self::key(SELECTED_ACCOUNT))
    }

    pub fn save_selected(&self, address: &str) -> Result<(), StorageError> {
        self.store.set(&Self::key(SELECTED_ACCOUNT), address)
    }

    pub fn load_custom_names(&self) -> Result<HashMap<String, String>, StorageError> {
        match self.store.get(&Self::key(CUSTOM_NAMES))? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(HashMap::new()),
        }
    }

    pub fn save_custom_names(&self, names: &HashMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string(names)?;
        self.store.set(&Self::key(CUSTOM_NAMES), &json)
    }

    pub fn is_connected(&self) -> Result<bool, StorageError> {
        Ok(self.store.get(&Self::key(WALLET_CONNECTED))?.as_deref() == Some("true"))
    }

    pub fn set_connected(&self) -> Result<(), StorageError> {
        self.store.set(&Self::key(WALLET_CONNECTED), "true")
    }

    /// Remove every persisted key, custom names included
    pub fn clear(&self) -> Result<(), StorageError> {
        for name in [CONNECTED_ACCOUNTS, SELECTED_ACCOUNT, CUSTOM_NAMES, WALLET_CONNECTED] {
            self.store.remove(&Self::key(name))?;
        }
        Ok(())
    }
}
