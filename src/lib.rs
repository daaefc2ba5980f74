//! DotVest: multi-chain Polkadot portfolio aggregation
//!
//! This crate connects to injected wallet providers, keeps the selected
//! account and its custom names in a persistent key/value store, and
//! aggregates native balances across Polkadot and its parachains into a
//! single USD-valued portfolio.
//!
//! # Architecture
//!
//! - **Extension discovery**: reports which supported wallet providers are injected
//! - **Session manager**: connect, switch, rename, disconnect; publishes the selection
//! - **Price fetcher**: batched USD prices with a TTL cache and static fallback
//! - **Chain balance fetcher**: one WebSocket JSON-RPC query per chain
//! - **Portfolio aggregator**: concurrent fan-out, partial-failure tolerant totals
//!
//! # Example
//!
//! ```ignore
//! use dotvest::{
//!     ChainBalanceFetcher, CoinGeckoSource, DotvestConfig, InjectedWeb3, MemoryStore,
//!     PortfolioAggregator, PriceFetcher, SessionManager, WsConnector,
//! };
//!
//! let config = DotvestConfig::from_env();
//! let store = Arc::new(MemoryStore::new());
//! let mut session = SessionManager::new(InjectedWeb3::new(), store, "DotVest");
//! session.connect(None).await?;
//!
//! let prices = Arc::new(PriceFetcher::new(
//!     Arc::new(CoinGeckoSource::new(&config.price_api_url)),
//!     config.price_ttl,
//! ));
//! let aggregator = PortfolioAggregator::new(
//!     ChainBalanceFetcher::new(Arc::new(WsConnector)),
//!     prices,
//!     config.chains.clone(),
//!     session.subscribe(),
//! );
//! let outcome = aggregator.refresh().await;
//! ```

// Public modules
pub mod balance;
pub mod chains;
pub mod config;
pub mod error;
pub mod extension;
pub mod portfolio;
pub mod price;
pub mod rpc;
pub mod session;
pub mod ss58;
pub mod storage;

// Re-exports for convenience
pub use balance::{
    BalanceWatch, ChainBalance, ChainBalanceFetcher, Redeemable, StakingSummary, TokenBalance,
};
pub use chains::{default_chains, format_balance, ChainConfig};
pub use config::DotvestConfig;
pub use error::{
    AddressError, ChainFetchError, DotvestError, ExtensionError, PriceError, RpcError,
    SessionError, StorageError,
};
pub use extension::{
    discover, InjectedAccount, InjectedProvider, InjectedSession, InjectedWeb3, WalletExtension,
    WatchOnlyProvider, SUPPORTED_WALLETS,
};
pub use portfolio::{
    ChainFailure, PortfolioAggregator, PortfolioSnapshot, PortfolioState, RefreshOutcome,
};
pub use price::{fallback_prices, CoinGeckoSource, PriceFetcher, PriceMap, PriceSource};
pub use rpc::{AccountData, AccountInfo, ChainRpc, RpcConnector, StorageChangeSet, WsConnector};
pub use session::{Selection, SessionManager};
pub use storage::{FileStore, KeyValueStore, MemoryStore, SelectionStore, WalletAccount};

// Common result type
pub type Result<T> = std::result::Result<T, DotvestError>;
