//! Data models for session storage

use serde::{Deserialize, Serialize};

/// An account enumerated from a wallet extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    /// SS58 address, unique key of the account
    pub address: String,
    /// Name reported by the extension
    pub name: String,
    /// Provider key the account came from (e.g. `polkadot-js`)
    pub source: String,
    /// User supplied override, kept apart from the extension name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
}

impl WalletAccount {
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            source: source.into(),
            custom_name: None,
        }
    }

    /// Name to show: the custom override when present, else the extension name
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.name)
    }
}
