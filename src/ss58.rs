//! SS58 address codec
//!
//! The same 32-byte account id is rendered differently on every chain, so
//! balance queries work on the decoded id and only re-encode for display.

use blake2::{Blake2b512, Digest};

use crate::error::AddressError;

const CHECKSUM_PREFIX: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;
const ACCOUNT_ID_LEN: usize = 32;

/// Highest prefix expressible in the two-byte SS58 format
const MAX_PREFIX: u16 = 16_383;

/// Generic Substrate prefix (`5...` addresses)
pub const GENERIC_PREFIX: u16 = 42;

pub type AccountId = [u8; ACCOUNT_ID_LEN];

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Blake2b512::new();
    hasher.update(CHECKSUM_PREFIX);
    hasher.update(payload);
    let hash = hasher.finalize();
    [hash[0], hash[1]]
}

fn encode_prefix(prefix: u16) -> Vec<u8> {
    if prefix < 64 {
        vec![prefix as u8]
    } else {
        let first = (((prefix & 0b0000_0000_1111_1100) as u8) >> 2) | 0b0100_0000;
        let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
        vec![first, second]
    }
}

/// Decode an SS58 address into its network prefix and account id
pub fn decode(address: &str) -> Result<(u16, AccountId), AddressError> {
    let data = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| AddressError::Base58(e.to_string()))?;

    let (prefix, prefix_len) = match data.first() {
        None => return Err(AddressError::InvalidLength(0)),
        Some(&b) if b < 64 => (b as u16, 1),
        Some(&b) if b < 128 => {
            let second = *data.get(1).ok_or(AddressError::InvalidLength(data.len()))?;
            let lower = (b << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            (lower as u16 | ((upper as u16) << 8), 2)
        }
        Some(&b) => return Err(AddressError::UnsupportedPrefix(b as u16)),
    };

    if data.len() != prefix_len + ACCOUNT_ID_LEN + CHECKSUM_LEN {
        return Err(AddressError::InvalidLength(data.len()));
    }

    let body_end = prefix_len + ACCOUNT_ID_LEN;
    if checksum(&data[..body_end]) != data[body_end..] {
        return Err(AddressError::BadChecksum);
    }

    let mut account_id = [0u8; ACCOUNT_ID_LEN];
    account_id.copy_from_slice(&data[prefix_len..body_end]);
    Ok((prefix, account_id))
}

/// Encode an account id with the given network prefix
pub fn encode(account_id: &AccountId, prefix: u16) -> Result<String, AddressError> {
    if prefix > MAX_PREFIX {
        return Err(AddressError::UnsupportedPrefix(prefix));
    }
    let mut payload = encode_prefix(prefix);
    payload.extend_from_slice(account_id);
    let check = checksum(&payload);
    payload.extend_from_slice(&check);
    Ok(bs58::encode(payload).into_string())
}

/// Re-encode an address for another network
pub fn reformat(address: &str, prefix: u16) -> Result<String, AddressError> {
    let (_, account_id) = decode(address)?;
    encode(&account_id, prefix)
}

/// Whether a string is a well-formed SS58 address for any network
pub fn is_valid(address: &str) -> bool {
    decode(address).is_ok()
}
