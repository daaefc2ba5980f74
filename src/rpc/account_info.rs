//! Typed view of the `System.Account` storage entry
//!
//! SCALE layout: nonce, consumers, providers, sufficients as little-endian
//! u32, followed by the balance record as four little-endian u128.

use serde::{Deserialize, Serialize};

use crate::error::ChainFetchError;

const REF_COUNTS_LEN: usize = 16;
const BALANCE_FIELD_LEN: usize = 16;
pub const ENCODED_LEN: usize = REF_COUNTS_LEN + 4 * BALANCE_FIELD_LEN;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    pub free: u128,
    pub reserved: u128,
    pub frozen: u128,
    pub flags: u128,
}

impl AccountData {
    /// Free balance not locked by freezes
    pub fn transferable(&self) -> u128 {
        self.free.saturating_sub(self.frozen)
    }

    pub fn total(&self) -> u128 {
        self.free.saturating_add(self.reserved)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub nonce: u32,
    pub consumers: u32,
    pub providers: u32,
    pub sufficients: u32,
    pub data: AccountData,
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

fn read_u128(bytes: &[u8], offset: usize) -> u128 {
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&bytes[offset..offset + 16]);
    u128::from_le_bytes(buf)
}

impl AccountInfo {
    pub fn decode(bytes: &[u8]) -> Result<Self, ChainFetchError> {
        if bytes.len() < ENCODED_LEN {
            return Err(ChainFetchError::Decode(format!(
                "expected at least {} bytes, got {}",
                ENCODED_LEN,
                bytes.len()
            )));
        }

        let balances = REF_COUNTS_LEN;
        Ok(Self {
            nonce: read_u32(bytes, 0),
            consumers: read_u32(bytes, 4),
            providers: read_u32(bytes, 8),
            sufficients: read_u32(bytes, 12),
            data: AccountData {
                free: read_u128(bytes, balances),
                reserved: read_u128(bytes, balances + BALANCE_FIELD_LEN),
                frozen: read_u128(bytes, balances + 2 * BALANCE_FIELD_LEN),
                flags: read_u128(bytes, balances + 3 * BALANCE_FIELD_LEN),
            },
        })
    }

    /// Decode the `0x`-prefixed hex string returned by `state_getStorage`
    pub fn decode_hex(encoded: &str) -> Result<Self, ChainFetchError> {
        let raw = encoded.strip_prefix("0x").unwrap_or(encoded);
        let bytes = hex::decode(raw).map_err(|e| ChainFetchError::Decode(e.to_string()))?;
        Self::decode(&bytes)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCODED_LEN);
        for v in [self.nonce, self.consumers, self.providers, self.sufficients] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        for v in [self.data.free, self.data.reserved, self.data.frozen, self.data.flags] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    pub fn encode_hex(&self) -> String {
        format!("0x{}", hex::encode(self.encode()))
    }
}
