//! Bech32 account addresses.
//!
//! An account address is the RIPEMD-160 digest of the SHA-256 of the
//! compressed secp256k1 public key, bech32-encoded under the environment's
//! human-readable prefix (`bnb` on mainnet, `tbnb` on testnet). The bech32
//! checksum catches transcription errors before anything reaches the wire.

use crate::core::errors::ChainError;
use bech32::{Bech32, Hrp};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Number of bytes in the account hash every address carries.
pub const ADDRESS_LEN: usize = 20;

/// Derive the 20-byte account hash from a compressed public key.
pub fn public_key_hash(public_key: &[u8]) -> [u8; ADDRESS_LEN] {
    let sha = Sha256::digest(public_key);
    let ripe = Ripemd160::digest(sha);
    let mut hash = [0u8; ADDRESS_LEN];
    hash.copy_from_slice(&ripe);
    hash
}

/// Encode a 20-byte account hash as a bech32 address under the given prefix.
pub fn encode_address(hrp: &str, hash: &[u8; ADDRESS_LEN]) -> Result<String, ChainError> {
    let hrp = Hrp::parse(hrp)
        .map_err(|e| ChainError::MalformedAddress(format!("invalid address prefix: {}", e)))?;
    bech32::encode::<Bech32>(hrp, hash)
        .map_err(|e| ChainError::MalformedAddress(format!("bech32 encoding failed: {}", e)))
}

/// Decode a bech32 address into its 20-byte account hash.
///
/// Checksum and data length are enforced; the prefix is not. An address from
/// the wrong network decodes fine here and is caught by the environment
/// check at broadcast time instead.
pub fn decode_address(address: &str) -> Result<[u8; ADDRESS_LEN], ChainError> {
    let (_hrp, data) = bech32::decode(address)
        .map_err(|e| ChainError::MalformedAddress(format!("{}: {}", address, e)))?;

    if data.len() != ADDRESS_LEN {
        return Err(ChainError::MalformedAddress(format!(
            "expected {} bytes of address data, got {}",
            ADDRESS_LEN,
            data.len()
        )));
    }

    let mut hash = [0u8; ADDRESS_LEN];
    hash.copy_from_slice(&data);
    Ok(hash)
}

/// Derive the bech32 address for a compressed public key.
pub fn address_from_public_key(hrp: &str, public_key: &[u8]) -> Result<String, ChainError> {
    encode_address(hrp, &public_key_hash(public_key))
}
