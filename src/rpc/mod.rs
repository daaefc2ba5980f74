//! Substrate JSON-RPC access
//!
//! - Connection and query traits used by the balance fetcher
//! - WebSocket JSON-RPC client
//! - Storage key derivation and typed storage DTOs

mod account_info;
mod ws_client;

pub use account_info::{AccountData, AccountInfo};
pub use ws_client::{WsConnector, WsRpcClient};

use async_trait::async_trait;
use blake2::digest::consts::U16;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::error::RpcError;
use crate::ss58::AccountId;

/// Opens a fresh RPC connection to a chain endpoint
#[async_trait]
pub trait RpcConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn ChainRpc>, RpcError>;
}

/// Storage queries against one chain
#[async_trait]
pub trait ChainRpc: Send {
    /// Raw SCALE value at `key` (hex), `None` when the entry does not exist
    async fn storage(&mut self, key: &str) -> Result<Option<String>, RpcError>;

    /// Start a storage subscription, returning its id
    async fn subscribe_storage(&mut self, key: &str) -> Result<String, RpcError>;

    /// Wait for the next change set of a subscription
    async fn next_storage_change(
        &mut self,
        subscription: &str,
    ) -> Result<StorageChangeSet, RpcError>;

    async fn close(&mut self);
}

/// Payload of a `state_storage` notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChangeSet {
    pub block: String,
    pub changes: Vec<(String, Option<String>)>,
}

impl StorageChangeSet {
    /// New value of `key` in this change set, if it changed
    pub fn value_of(&self, key: &str) -> Option<Option<&str>> {
        self.changes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_deref())
    }
}

type Blake2b128 = Blake2b<U16>;

fn twox_128(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&xxh64(data, 0).to_le_bytes());
    out[8..].copy_from_slice(&xxh64(data, 1).to_le_bytes());
    out
}

fn blake2_128_concat(data: &[u8]) -> Vec<u8> {
    let mut out = Blake2b128::digest(data).to_vec();
    out.extend_from_slice(data);
    out
}

/// Storage key of `System.Account(account_id)` as `0x`-prefixed hex
pub fn system_account_key(account_id: &AccountId) -> String {
    let mut key = Vec::with_capacity(32 + 16 + 32);
    key.extend_from_slice(&twox_128(b"System"));
    key.extend_from_slice(&twox_128(b"Account"));
    key.extend_from_slice(&blake2_128_concat(account_id));
    format!("0x{}", hex::encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_account_prefix() {
        let key = system_account_key(&[0u8; 32]);
        assert!(key.starts_with(
            "0x26aa394eea5630e07c48ae0c9558cef7b99d880ec681799c0cf30e8886371da9"
        ));
        // prefix + blake2_128 + account id, hex encoded
        assert_eq!(key.len(), 2 + 2 * (32 + 16 + 32));
        assert!(key.ends_with(&"00".repeat(32)));
    }

    #[test]
    fn test_change_set_lookup() {
        let set = StorageChangeSet {
            block: "0x01".to_string(),
            changes: vec![
                ("0xAB".to_string(), None),
                ("0xcd".to_string(), Some("0x00".to_string())),
            ],
        };
        assert_eq!(set.value_of("0xab"), Some(None));
        assert_eq!(set.value_of("0xcd"), Some(Some("0x00")));
        assert_eq!(set.value_of("0xef"), None);
    }
}
