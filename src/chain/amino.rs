//! Amino-style framing for transaction payloads.
//!
//! Every message carried inside a transaction is a protobuf payload wrapped
//! in up to two envelope pieces: a registered 4-byte type prefix, and a
//! varint length prefix. Which pieces apply is fixed per message type and
//! the two are independent: the transaction envelope carries both, order
//! and token messages carry only the type prefix, and an embedded signature
//! carries neither.

use super::encode::encode_varint;

/// Registered type prefix for new order messages.
pub const NEW_ORDER_PREFIX: [u8; 4] = [0xCE, 0x6D, 0xC0, 0x43];
/// Registered type prefix for cancel order messages.
pub const CANCEL_ORDER_PREFIX: [u8; 4] = [0x16, 0x6E, 0x68, 0x1B];
/// Registered type prefix for token freeze messages.
pub const FREEZE_PREFIX: [u8; 4] = [0xE7, 0x74, 0xB3, 0x2D];
/// Registered type prefix for token unfreeze messages.
pub const UNFREEZE_PREFIX: [u8; 4] = [0x65, 0x15, 0xFF, 0x0D];
/// Registered type prefix for transfer messages.
pub const TRANSFER_PREFIX: [u8; 4] = [0x2A, 0x2C, 0x87, 0xFA];
/// Registered type prefix for the signed transaction envelope.
pub const STD_TX_PREFIX: [u8; 4] = [0xF0, 0x62, 0x5D, 0xEE];
/// Registered type prefix for secp256k1 public keys.
pub const PUB_KEY_PREFIX: [u8; 4] = [0xEB, 0x5A, 0xE9, 0x87];

/// Framing descriptor for one message type.
///
/// When a type prefix is present, the length prefix (if any) covers the
/// prefix plus the payload; without a type prefix it covers the payload
/// alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AminoWrap {
    pub type_prefix: Option<[u8; 4]>,
    pub length_prefixed: bool,
}

impl AminoWrap {
    /// Type prefix only, no length framing. Used by the message variants
    /// embedded in a transaction.
    pub const fn tagged(type_prefix: [u8; 4]) -> Self {
        Self {
            type_prefix: Some(type_prefix),
            length_prefixed: false,
        }
    }

    /// Type prefix plus varint length framing. Used by the outer
    /// transaction envelope.
    pub const fn framed(type_prefix: [u8; 4]) -> Self {
        Self {
            type_prefix: Some(type_prefix),
            length_prefixed: true,
        }
    }

    /// Neither prefix. The payload goes out as raw protobuf bytes.
    pub const fn bare() -> Self {
        Self {
            type_prefix: None,
            length_prefixed: false,
        }
    }

    /// Apply this framing to a protobuf payload.
    pub fn wrap(&self, payload: &[u8]) -> Vec<u8> {
        let tag_len = self.type_prefix.map_or(0, |prefix| prefix.len());
        let mut out = Vec::with_capacity(payload.len() + tag_len + 2);
        if self.length_prefixed {
            out.extend(encode_varint((payload.len() + tag_len) as u64));
        }
        if let Some(prefix) = self.type_prefix {
            out.extend_from_slice(&prefix);
        }
        out.extend_from_slice(payload);
        out
    }
}

/// Wrap a compressed public key for embedding in a signature.
///
/// Public keys use their own layout: the type prefix comes first and the
/// varint length covers only the key bytes, not the prefix.
pub fn wrap_public_key(key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() + 6);
    out.extend_from_slice(&PUB_KEY_PREFIX);
    out.extend(encode_varint(key.len() as u64));
    out.extend_from_slice(key);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_wrap_prepends_prefix_only() {
        let wrapped = AminoWrap::tagged(NEW_ORDER_PREFIX).wrap(b"abc");
        assert_eq!(&wrapped[..4], &NEW_ORDER_PREFIX);
        assert_eq!(&wrapped[4..], b"abc");
    }

    #[test]
    fn framed_wrap_counts_prefix_in_length() {
        let wrapped = AminoWrap::framed(STD_TX_PREFIX).wrap(b"abc");
        // 4 bytes of prefix + 3 bytes of payload
        assert_eq!(wrapped[0], 7);
        assert_eq!(&wrapped[1..5], &STD_TX_PREFIX);
        assert_eq!(&wrapped[5..], b"abc");
    }

    #[test]
    fn bare_wrap_is_identity() {
        assert_eq!(AminoWrap::bare().wrap(b"abc"), b"abc");
    }

    #[test]
    fn framed_wrap_uses_multi_byte_varint_for_long_payloads() {
        let payload = vec![0u8; 200];
        let wrapped = AminoWrap::framed(STD_TX_PREFIX).wrap(&payload);
        // 204 = 0xcc 0x01 as a varint
        assert_eq!(&wrapped[..2], &[0xcc, 0x01]);
        assert_eq!(wrapped.len(), 2 + 4 + 200);
    }

    #[test]
    fn public_key_length_excludes_prefix() {
        let key = [0x02u8; 33];
        let wrapped = wrap_public_key(&key);
        assert_eq!(&wrapped[..4], &PUB_KEY_PREFIX);
        assert_eq!(wrapped[4], 33);
        assert_eq!(&wrapped[5..], &key);
        assert_eq!(wrapped.len(), 38);
    }
}
