//! Chain registry and balance formatting
//!
//! Every supported network carries its RPC endpoint, native token, decimal
//! precision, price-service id and SS58 prefix.

use serde::{Deserialize, Serialize};

/// Fractional digits shown in formatted balances
pub const DISPLAY_DECIMALS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Stable identifier (also used for `DOTVEST_RPC_<ID>` overrides)
    pub id: String,
    /// Human readable network name
    pub name: String,
    pub rpc_url: String,
    /// Native token symbol
    pub symbol: String,
    pub decimals: u8,
    /// Identifier of the token on the price service
    pub price_id: String,
    pub ss58_prefix: u16,
}

impl ChainConfig {
    fn new(
        id: &str,
        name: &str,
        rpc_url: &str,
        symbol: &str,
        decimals: u8,
        price_id: &str,
        ss58_prefix: u16,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            rpc_url: rpc_url.to_string(),
            symbol: symbol.to_string(),
            decimals,
            price_id: price_id.to_string(),
            ss58_prefix,
        }
    }

    pub fn polkadot() -> Self {
        Self::new("polkadot", "Polkadot", "wss://rpc.polkadot.io", "DOT", 10, "polkadot", 0)
    }

    pub fn asset_hub() -> Self {
        Self::new(
            "asset-hub",
            "Polkadot Asset Hub",
            "wss://polkadot-asset-hub-rpc.polkadot.io",
            "DOT",
            10,
            "polkadot",
            0,
        )
    }

    pub fn acala() -> Self {
        Self::new("acala", "Acala", "wss://acala-rpc.dwellir.com", "ACA", 12, "acala", 10)
    }

    pub fn hydration() -> Self {
        Self::new("hydration", "Hydration", "wss://rpc.hydradx.cloud", "HDX", 12, "hydradx", 63)
    }

    pub fn bifrost() -> Self {
        Self::new(
            "bifrost",
            "Bifrost",
            "wss://bifrost-polkadot-rpc.dwellir.com",
            "BNC",
            12,
            "bifrost-native-coin",
            6,
        )
    }

    /// Environment variable that overrides this chain's RPC endpoint
    pub fn rpc_env_var(&self) -> String {
        format!("DOTVEST_RPC_{}", self.id.replace('-', "_").to_uppercase())
    }
}

/// All chains aggregated by default
pub fn default_chains() -> Vec<ChainConfig> {
    vec![
        ChainConfig::polkadot(),
        ChainConfig::asset_hub(),
        ChainConfig::acala(),
        ChainConfig::hydration(),
        ChainConfig::bifrost(),
    ]
}

/// Render a raw integer balance as a decimal string with four fractional digits
///
/// Truncates rather than rounds so a displayed balance is never more than
/// what the account holds. Above 38 decimals no `u128` reaches one whole unit.
pub fn format_balance(raw: u128, decimals: u8) -> String {
    let (whole, rest) = match 10u128.checked_pow(decimals as u32) {
        Some(unit) => (raw / unit, raw % unit),
        None => (0, raw),
    };
    let frac = format!("{:0width$}", rest, width = decimals as usize);
    let mut shown: String = frac.chars().take(DISPLAY_DECIMALS).collect();
    while shown.len() < DISPLAY_DECIMALS {
        shown.push('0');
    }
    format!("{}.{}", whole, shown)
}

/// Convert a raw integer balance into token units for valuation
pub fn to_units(raw: u128, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}
