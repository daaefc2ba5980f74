//! Error types for DotVest portfolio operations
//!
//! Session-level failures (no extension, no accounts) propagate to the caller
//! and must be shown to the user. Per-chain and price failures are absorbed
//! by the aggregator and price fetcher, so their error types only travel as
//! values inside results and snapshots.

use thiserror::Error;

/// Top-level error for the crate
#[derive(Error, Debug)]
pub enum DotvestError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Chain(#[from] ChainFetchError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Price(#[from] PriceError),
}

/// Account session failures surfaced to the user
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No wallet extension found. Please install Polkadot.js, Talisman or SubWallet and authorize this app")]
    NoExtensionFound,

    #[error("No accounts found. Please create an account in your wallet extension first")]
    NoAccountsFound,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reported by an injected wallet provider
#[derive(Error, Debug, Clone)]
pub enum ExtensionError {
    #[error("Authorization rejected by {0}")]
    Rejected(String),

    #[error("Extension {0} is unavailable: {1}")]
    Unavailable(String, String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid base58 encoding: {0}")]
    Base58(String),

    #[error("Invalid address length: {0} bytes")]
    InvalidLength(usize),

    #[error("Invalid address checksum")]
    BadChecksum,

    #[error("Unsupported SS58 prefix: {0}")]
    UnsupportedPrefix(u16),
}

#[derive(Error, Debug, Clone)]
pub enum RpcError {
    #[error("Failed to connect to {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Connection closed")]
    Closed,
}

/// Why a single chain contributed nothing to a portfolio refresh
#[derive(Error, Debug, Clone)]
pub enum ChainFetchError {
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    #[error("RPC failure: {0}")]
    Rpc(#[from] RpcError),

    #[error("Failed to decode account info: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone)]
pub enum PriceError {
    #[error("Price request failed: {0}")]
    Http(String),

    #[error("Price service returned status {0}")]
    Status(u16),

    #[error("Invalid price response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for PriceError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => PriceError::Status(status.as_u16()),
            None => PriceError::Http(e.to_string()),
        }
    }
}
