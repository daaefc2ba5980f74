//! Common test utilities for DotVest integration tests
//!
//! This module provides shared test infrastructure including:
//! - In-process RPC connector with per-chain balances, failures and latency
//! - Counting price source
//! - Wallet providers that reject or report no accounts
//! - Mock price API and JSON-RPC node servers on ephemeral ports

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dotvest::rpc::system_account_key;
use dotvest::ss58::{self, AccountId};
use dotvest::{
    AccountData, AccountInfo, ChainConfig, ChainRpc, ExtensionError, InjectedAccount,
    InjectedProvider, InjectedSession, PriceError, PriceSource, RpcConnector, RpcError,
    StorageChangeSet,
};

pub const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
pub const BOB: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";

pub fn init_logger() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

pub fn account_id(address: &str) -> AccountId {
    ss58::decode(address).expect("valid test address").1
}

pub fn assert_usd_eq(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected ${}, got ${}",
        expected,
        actual
    );
}

/// Four chains pointing at fake endpoints, one per tracked token
pub fn test_chains() -> Vec<ChainConfig> {
    [
        ChainConfig::polkadot(),
        ChainConfig::acala(),
        ChainConfig::hydration(),
        ChainConfig::bifrost(),
    ]
    .into_iter()
    .map(|mut chain| {
        chain.rpc_url = format!("ws://fake/{}", chain.id);
        chain
    })
    .collect()
}

// ============================================================================
// Fake RPC
// ============================================================================

#[derive(Clone, Default)]
struct FakeChain {
    balances: HashMap<AccountId, u128>,
    failing: bool,
    latency: Duration,
}

/// Connector serving `System.Account` from in-memory balances
#[derive(Clone, Default)]
pub struct FakeConnector {
    chains: Arc<Mutex<HashMap<String, FakeChain>>>,
    pub connects: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, chain: &ChainConfig, address: &str, free: u128) {
        let mut chains = self.chains.lock().unwrap();
        let entry = chains.entry(chain.rpc_url.clone()).or_default();
        entry.balances.insert(account_id(address), free);
    }

    pub fn set_failing(&self, chain: &ChainConfig, failing: bool) {
        let mut chains = self.chains.lock().unwrap();
        chains.entry(chain.rpc_url.clone()).or_default().failing = failing;
    }

    pub fn set_latency(&self, latency: Duration) {
        let mut chains = self.chains.lock().unwrap();
        for chain in chains.values_mut() {
            chain.latency = latency;
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RpcConnector for FakeConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn ChainRpc>, RpcError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let chain = self.chains.lock().unwrap().get(url).cloned().unwrap_or_default();
        if chain.failing {
            return Err(RpcError::Connection {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(Box::new(FakeRpc {
            chain,
            closes: self.closes.clone(),
        }))
    }
}

struct FakeRpc {
    chain: FakeChain,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl ChainRpc for FakeRpc {
    async fn storage(&mut self, key: &str) -> Result<Option<String>, RpcError> {
        if !self.chain.latency.is_zero() {
            tokio::time::sleep(self.chain.latency).await;
        }
        let found = self
            .chain
            .balances
            .iter()
            .find(|(id, _)| system_account_key(id) == key)
            .map(|(_, free)| {
                AccountInfo {
                    providers: 1,
                    data: AccountData {
                        free: *free,
                        ..Default::default()
                    },
                    ..Default::default()
                }
                .encode_hex()
            });
        Ok(found)
    }

    async fn subscribe_storage(&mut self, _key: &str) -> Result<String, RpcError> {
        Err(RpcError::Rpc {
            code: -32601,
            message: "Method not found".to_string(),
        })
    }

    async fn next_storage_change(
        &mut self,
        _subscription: &str,
    ) -> Result<StorageChangeSet, RpcError> {
        Err(RpcError::Closed)
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Prices
// ============================================================================

/// Price source answering fixed quotes and counting requests
#[derive(Default)]
pub struct CountingPriceSource {
    pub calls: AtomicUsize,
}

impl CountingPriceSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for CountingPriceSource {
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, f64>, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let quotes = [
            ("polkadot", 7.5),
            ("acala", 0.08),
            ("hydradx", 0.02),
            ("bifrost-native-coin", 0.5),
        ];
        Ok(quotes
            .into_iter()
            .filter(|(id, _)| ids.iter().any(|i| i == id))
            .map(|(id, price)| (id.to_string(), price))
            .collect())
    }
}

// ============================================================================
// Wallet providers
// ============================================================================

/// Provider whose user declines the authorization prompt
pub struct RejectingProvider;

#[async_trait]
impl InjectedProvider for RejectingProvider {
    fn version(&self) -> String {
        "0.1.0".to_string()
    }

    async fn enable(&self, _app_name: &str) -> Result<Arc<dyn InjectedSession>, ExtensionError> {
        Err(ExtensionError::Rejected("test".to_string()))
    }
}

/// Provider exposing named accounts
#[derive(Clone)]
pub struct NamedProvider {
    pub accounts: Vec<(String, String)>,
}

impl NamedProvider {
    pub fn new(accounts: &[(&str, &str)]) -> Self {
        Self {
            accounts: accounts
                .iter()
                .map(|(a, n)| (a.to_string(), n.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl InjectedProvider for NamedProvider {
    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    async fn enable(&self, _app_name: &str) -> Result<Arc<dyn InjectedSession>, ExtensionError> {
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl InjectedSession for NamedProvider {
    async fn accounts(&self) -> Result<Vec<InjectedAccount>, ExtensionError> {
        Ok(self
            .accounts
            .iter()
            .map(|(address, name)| InjectedAccount {
                address: address.clone(),
                name: Some(name.clone()),
            })
            .collect())
    }
}

// ============================================================================
// Mock servers
// ============================================================================

/// Serve `app` on an ephemeral local port
pub async fn spawn_server(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    addr
}
