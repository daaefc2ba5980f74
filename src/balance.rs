//! Per-chain balance queries
//!
//! Every fetch opens its own RPC connection, reads the account's
//! `System.Account` entry, values the free balance in USD and closes the
//! connection again. Failures come back as `Err` values so the aggregator can
//! report which chains are missing instead of treating them as zero.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chains::{format_balance, to_units, ChainConfig};
use crate::error::ChainFetchError;
use crate::price::PriceMap;
use crate::rpc::{system_account_key, AccountData, AccountInfo, ChainRpc, RpcConnector};
use crate::ss58;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub token: String,
    pub symbol: String,
    /// Raw integer amount in the token's smallest unit
    pub balance: String,
    /// Human readable amount
    pub formatted: String,
    pub usd_value: f64,
    pub chain: String,
}

/// Amount of unbonded stake ready to withdraw
///
/// Not read from chain yet; consumers must show it as unavailable rather
/// than as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "amount", rename_all = "camelCase")]
pub enum Redeemable {
    Unimplemented,
    Amount(u128),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingSummary {
    pub redeemable: Redeemable,
}

impl Default for StakingSummary {
    fn default() -> Self {
        Self {
            redeemable: Redeemable::Unimplemented,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainBalance {
    pub chain: String,
    pub rpc_url: String,
    /// Account address in this chain's SS58 format
    pub address: String,
    pub tokens: Vec<TokenBalance>,
    pub total_usd_value: f64,
    pub account: AccountData,
    pub staking: StakingSummary,
}

impl ChainBalance {
    /// Value `account` on `chain` at the given prices
    ///
    /// Only the free balance is valued. A missing price values it at zero.
    pub fn from_account(
        chain: &ChainConfig,
        address: String,
        account: AccountData,
        prices: &PriceMap,
    ) -> Self {
        let price = prices.get(&chain.symbol).copied().unwrap_or_else(|| {
            log::warn!("No price for {}, valuing {} balance at 0", chain.symbol, chain.name);
            0.0
        });
        let usd_value = to_units(account.free, chain.decimals) * price;

        let token = TokenBalance {
            token: chain.symbol.clone(),
            symbol: chain.symbol.clone(),
            balance: account.free.to_string(),
            formatted: format_balance(account.free, chain.decimals),
            usd_value,
            chain: chain.name.clone(),
        };

        Self {
            chain: chain.name.clone(),
            rpc_url: chain.rpc_url.clone(),
            address,
            tokens: vec![token],
            total_usd_value: usd_value,
            account,
            staking: StakingSummary::default(),
        }
    }
}

pub struct ChainBalanceFetcher {
    connector: Arc<dyn RpcConnector>,
}

impl ChainBalanceFetcher {
    pub fn new(connector: Arc<dyn RpcConnector>) -> Self {
        Self { connector }
    }

    /// Query and value `address` on `chain`
    pub async fn fetch(
        &self,
        chain: &ChainConfig,
        address: &str,
        prices: &PriceMap,
    ) -> Result<ChainBalance, ChainFetchError> {
        let (_, account_id) = ss58::decode(address)?;
        let chain_address = ss58::encode(&account_id, chain.ss58_prefix)?;
        let key = system_account_key(&account_id);

        let mut rpc = self.connector.connect(&chain.rpc_url).await?;
        let raw = rpc.storage(&key).await;
        rpc.close().await;

        let account = match raw? {
            Some(encoded) => AccountInfo::decode_hex(&encoded)?.data,
            None => {
                log::debug!("{} has no account on {}", chain_address, chain.name);
                AccountData::default()
            }
        };

        let balance = ChainBalance::from_account(chain, chain_address, account, prices);
        log::debug!(
            "{}: {} {} (${:.2})",
            chain.name,
            balance.tokens[0].formatted,
            chain.symbol,
            balance.total_usd_value
        );
        Ok(balance)
    }

    /// Subscribe to balance changes of `address` on `chain`
    pub async fn watch(
        &self,
        chain: &ChainConfig,
        address: &str,
    ) -> Result<BalanceWatch, ChainFetchError> {
        let (_, account_id) = ss58::decode(address)?;
        let key = system_account_key(&account_id);

        let mut rpc = self.connector.connect(&chain.rpc_url).await?;
        let subscription = match rpc.subscribe_storage(&key).await {
            Ok(id) => id,
            Err(e) => {
                rpc.close().await;
                return Err(e.into());
            }
        };
        log::info!("Watching {} on {} (subscription {})", address, chain.name, subscription);

        Ok(BalanceWatch {
            rpc,
            subscription,
            key,
        })
    }
}

/// Live balance updates for one account on one chain
pub struct BalanceWatch {
    rpc: Box<dyn ChainRpc>,
    subscription: String,
    key: String,
}

impl BalanceWatch {
    /// Wait for the next change of the account's balances
    pub async fn next(&mut self) -> Result<AccountData, ChainFetchError> {
        loop {
            let change_set = self.rpc.next_storage_change(&self.subscription).await?;
            match change_set.value_of(&self.key) {
                Some(Some(encoded)) => return Ok(AccountInfo::decode_hex(encoded)?.data),
                Some(None) => return Ok(AccountData::default()),
                None => continue,
            }
        }
    }

    pub async fn close(mut self) {
        self.rpc.close().await;
    }
}
