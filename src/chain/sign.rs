//! Sign-doc construction and the signed transaction envelope.
//!
//! Signing happens over a canonical JSON document, not over the wire bytes.
//! The chain re-renders the same document from the decoded transaction and
//! checks the signature against it, so byte-exact JSON (key order, string
//! counters, no whitespace) is a correctness requirement here.

use prost::Message as _;
use serde::Serialize;

use super::amino::{self, AminoWrap};
use super::messages::{MsgDoc, TxMsg};
use super::proto;
use super::wallet::Wallet;
use crate::core::errors::ChainError;

/// Client identifier stamped into the `source` field of every transaction.
pub const BROADCAST_SOURCE: i64 = 1;

/// The JSON document whose SHA-256 digest is signed.
///
/// Keys are declared in canonical (lexicographic) order and the integer
/// counters are rendered as decimal strings, per the chain's signing
/// convention. Unknown `chain_id` and absent `data` serialize as `null`
/// rather than being dropped.
#[derive(Debug, Clone, Serialize)]
pub struct SignDoc {
    pub account_number: String,
    pub chain_id: Option<String>,
    pub data: Option<String>,
    pub memo: String,
    pub msgs: [MsgDoc; 1],
    pub sequence: String,
    pub source: String,
}

impl SignDoc {
    /// Compact JSON rendering, the exact bytes that get signed.
    ///
    /// Non-ASCII memo text passes through as UTF-8, unescaped.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ChainError> {
        serde_json::to_vec(self).map_err(ChainError::from)
    }
}

/// Render the signing document for one message under the wallet's current
/// account state.
pub fn build_sign_doc(wallet: &Wallet, msg: &dyn TxMsg) -> Result<SignDoc, ChainError> {
    Ok(SignDoc {
        account_number: wallet.require_account_number()?.to_string(),
        chain_id: wallet.chain_id().map(str::to_string),
        data: None,
        memo: msg.memo().to_string(),
        msgs: [msg.to_doc(wallet)?],
        sequence: wallet.require_sequence()?.to_string(),
        source: BROADCAST_SOURCE.to_string(),
    })
}

/// Assemble and sign the full broadcast envelope for one message.
///
/// Layout: varint total length, the `StdTx` type prefix, then a `StdTx`
/// whose `msgs` holds the framed message and whose single signature covers
/// the canonical sign-doc JSON.
pub fn encode_std_tx(wallet: &Wallet, msg: &dyn TxMsg) -> Result<Vec<u8>, ChainError> {
    let sign_doc = build_sign_doc(wallet, msg)?;
    let signature = wallet.sign(&sign_doc.to_bytes()?);

    let std_sig = proto::StdSignature {
        pub_key: amino::wrap_public_key(&wallet.public_key_bytes()),
        signature,
        account_number: wallet.require_account_number()?,
        sequence: wallet.require_sequence()?,
    };

    let tx = proto::StdTx {
        msgs: vec![msg.to_amino(wallet)?],
        signatures: vec![std_sig.encode_to_vec()],
        memo: msg.memo().to_string(),
        source: BROADCAST_SOURCE,
        data: Vec::new(),
    };

    Ok(AminoWrap::framed(amino::STD_TX_PREFIX).wrap(&tx.encode_to_vec()))
}

/// Hex form of [`encode_std_tx`], the exact string the broadcast endpoints
/// accept.
pub fn tx_hex(wallet: &Wallet, msg: &dyn TxMsg) -> Result<String, ChainError> {
    Ok(hex::encode(encode_std_tx(wallet, msg)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::messages::{CancelOrderMsg, FreezeMsg, TransferMsg};
    use crate::core::config::ChainEnv;

    const KNOWN_KEY: &str = "3dcc267e1f7edca86e03f0963b2d0b7804552d3014caddcfc435a4d7bc240cf5";
    const KNOWN_ADDRESS: &str = "tbnb10a6kkxlf823w9lwr6l9hzw4uyphcw7qzrud5rr";

    fn synced_wallet() -> Wallet {
        let mut wallet = Wallet::from_private_key(KNOWN_KEY, ChainEnv::testnet()).unwrap();
        wallet.set_account_number(23_452);
        wallet.set_sequence(2);
        wallet
    }

    fn read_varint(bytes: &[u8]) -> (u64, usize) {
        let mut value = 0u64;
        let mut used = 0;
        for (i, byte) in bytes.iter().enumerate() {
            value |= u64::from(byte & 0x7f) << (7 * i);
            used = i + 1;
            if byte & 0x80 == 0 {
                break;
            }
        }
        (value, used)
    }

    #[test]
    fn sign_doc_renders_canonical_json() {
        let doc = build_sign_doc(&synced_wallet(), &FreezeMsg::new("BNB", 1i64)).unwrap();
        let json = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert_eq!(
            json,
            "{\"account_number\":\"23452\",\"chain_id\":null,\"data\":null,\"memo\":\"\",\
             \"msgs\":[{\"amount\":100000000,\
             \"from\":\"tbnb10a6kkxlf823w9lwr6l9hzw4uyphcw7qzrud5rr\",\"symbol\":\"BNB\"}],\
             \"sequence\":\"2\",\"source\":\"1\"}"
        );
    }

    #[test]
    fn sign_doc_carries_chain_id_when_known() {
        let mut wallet = synced_wallet();
        wallet.set_chain_id("Binance-Chain-Ganges".to_string());
        let doc = build_sign_doc(&wallet, &FreezeMsg::new("BNB", 1i64)).unwrap();
        let json = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(json.contains("\"chain_id\":\"Binance-Chain-Ganges\""));
    }

    #[test]
    fn sign_doc_passes_memo_through_as_utf8() {
        let wallet = synced_wallet();
        let transfer = TransferMsg::new("BNB", 1i64, KNOWN_ADDRESS).with_memo("入金 123");
        let doc = build_sign_doc(&wallet, &transfer).unwrap();
        let json = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(json.contains("\"memo\":\"入金 123\""));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn envelope_frames_message_and_signature() {
        let wallet = synced_wallet();
        let cancel = CancelOrderMsg::new("ANN-457_BNB", "7F756B1BE93AA2E2FDC3D7CB713ABC206F877802-3");
        let tx = encode_std_tx(&wallet, &cancel).unwrap();

        let (declared, used) = read_varint(&tx);
        assert_eq!(declared as usize, tx.len() - used);
        assert_eq!(&tx[used..used + 4], &amino::STD_TX_PREFIX);
        // StdTx field 1 (msgs) opens the protobuf body
        assert_eq!(tx[used + 4], 0x0a);
    }

    #[test]
    fn memo_lands_in_doc_and_envelope() {
        let wallet = synced_wallet();
        let transfer = TransferMsg::new("BNB", 1i64, KNOWN_ADDRESS).with_memo("x");
        let tx = encode_std_tx(&wallet, &transfer).unwrap();
        // StdTx field 3, length 1, "x"
        assert!(tx.windows(3).any(|w| w == [0x1a, 0x01, b'x']));
    }

    #[test]
    fn uninitialized_wallet_cannot_sign() {
        let wallet = Wallet::from_private_key(KNOWN_KEY, ChainEnv::testnet()).unwrap();
        assert!(matches!(
            encode_std_tx(&wallet, &FreezeMsg::new("BNB", 1i64)),
            Err(ChainError::UninitializedAccount(_))
        ));
    }

    #[test]
    fn tx_hex_is_lowercase_hex_of_envelope() {
        let wallet = synced_wallet();
        let msg = FreezeMsg::new("BNB", 1i64);
        let hex_data = tx_hex(&wallet, &msg).unwrap();
        assert_eq!(hex::decode(&hex_data).unwrap(), encode_std_tx(&wallet, &msg).unwrap());
        assert_eq!(hex_data, hex_data.to_lowercase());
    }
}
