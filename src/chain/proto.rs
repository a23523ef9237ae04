//! Protobuf payloads for the transaction wire format.
//!
//! Hand-maintained prost structs rather than build-time codegen: the schema
//! is small, frozen by the chain, and the field numbers below are pinned by
//! recorded transactions the encoder is tested against. proto3 rules apply,
//! so zero/empty fields are omitted from the encoding.

/// Body of a new order transaction.
#[derive(Clone, PartialEq, prost::Message)]
pub struct NewOrder {
    /// Sender account hash (20 bytes)
    #[prost(bytes = "vec", tag = "1")]
    pub sender: Vec<u8>,
    /// Order id, `HEX(sender).upper() + "-" + (sequence + 1)`
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub symbol: String,
    #[prost(int64, tag = "4")]
    pub ordertype: i64,
    #[prost(int64, tag = "5")]
    pub side: i64,
    /// Price in fixed-point base units
    #[prost(int64, tag = "6")]
    pub price: i64,
    /// Quantity in fixed-point base units
    #[prost(int64, tag = "7")]
    pub quantity: i64,
    #[prost(int64, tag = "8")]
    pub timeinforce: i64,
}

/// Body of a cancel order transaction.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CancelOrder {
    /// Sender account hash (20 bytes)
    #[prost(bytes = "vec", tag = "1")]
    pub sender: Vec<u8>,
    #[prost(string, tag = "2")]
    pub symbol: String,
    /// Id of the order being cancelled
    #[prost(string, tag = "3")]
    pub refid: String,
}

/// Body of a token freeze transaction.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TokenFreeze {
    /// Owner account hash (20 bytes); named `from` in the chain schema
    #[prost(bytes = "vec", tag = "1")]
    pub from_address: Vec<u8>,
    #[prost(string, tag = "2")]
    pub symbol: String,
    #[prost(int64, tag = "3")]
    pub amount: i64,
}

/// Body of a token unfreeze transaction.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TokenUnfreeze {
    /// Owner account hash (20 bytes); named `from` in the chain schema
    #[prost(bytes = "vec", tag = "1")]
    pub from_address: Vec<u8>,
    #[prost(string, tag = "2")]
    pub symbol: String,
    #[prost(int64, tag = "3")]
    pub amount: i64,
}

/// One denomination/amount pair inside a transfer.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Token {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(int64, tag = "2")]
    pub amount: i64,
}

/// Debit side of a transfer.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Input {
    /// Account hash (20 bytes)
    #[prost(bytes = "vec", tag = "1")]
    pub address: Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    pub coins: Vec<Token>,
}

/// Credit side of a transfer.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Output {
    /// Account hash (20 bytes)
    #[prost(bytes = "vec", tag = "1")]
    pub address: Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    pub coins: Vec<Token>,
}

/// Body of a funds transfer transaction.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Send {
    #[prost(message, repeated, tag = "1")]
    pub inputs: Vec<Input>,
    #[prost(message, repeated, tag = "2")]
    pub outputs: Vec<Output>,
}

/// A signature plus the key and account coordinates it was made under.
///
/// Unlike the message bodies this is embedded as raw protobuf bytes with no
/// type prefix.
#[derive(Clone, PartialEq, prost::Message)]
pub struct StdSignature {
    /// Amino-wrapped compressed public key
    #[prost(bytes = "vec", tag = "1")]
    pub pub_key: Vec<u8>,
    /// 64-byte compact ECDSA signature
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
    #[prost(int64, tag = "3")]
    pub account_number: i64,
    #[prost(int64, tag = "4")]
    pub sequence: i64,
}

/// The outer transaction envelope.
///
/// `msgs` and `signatures` hold already-framed amino bytes, which is why
/// they are `bytes` rather than nested messages.
#[derive(Clone, PartialEq, prost::Message)]
pub struct StdTx {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub msgs: Vec<Vec<u8>>,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub signatures: Vec<Vec<u8>>,
    #[prost(string, tag = "3")]
    pub memo: String,
    #[prost(int64, tag = "4")]
    pub source: i64,
    #[prost(bytes = "vec", tag = "5")]
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    const SENDER_HASH: &str = "7f756b1be93aa2e2fdc3d7cb713abc206f877802";

    // Payload slices of transactions recorded from the chain.
    const NEW_ORDER_PAYLOAD: &str = "0a147f756b1be93aa2e2fdc3d7cb713abc206f877802122a374637353642314245393341413245324644433344374342373133414243323036463837373830322d331a0b414e4e2d3435375f424e422002280130b0b502388094ebdc034001";

    #[test]
    fn new_order_layout_matches_recorded_transaction() {
        let order = NewOrder {
            sender: hex::decode(SENDER_HASH).unwrap(),
            id: "7F756B1BE93AA2E2FDC3D7CB713ABC206F877802-3".to_string(),
            symbol: "ANN-457_BNB".to_string(),
            ordertype: 2,
            side: 1,
            price: 39_600,
            quantity: 1_000_000_000,
            timeinforce: 1,
        };

        let expected = hex::decode(NEW_ORDER_PAYLOAD).unwrap();
        assert_eq!(order.encode_to_vec(), expected);
    }

    #[test]
    fn cancel_order_layout_matches_recorded_transaction() {
        let cancel = CancelOrder {
            sender: hex::decode(SENDER_HASH).unwrap(),
            symbol: "ANN-457_BNB".to_string(),
            refid: "7F756B1BE93AA2E2FDC3D7CB713ABC206F877802-3".to_string(),
        };

        let expected = hex::decode(
            "0a147f756b1be93aa2e2fdc3d7cb713abc206f877802120b414e4e2d3435375f424e421a2a374637353642314245393341413245324644433344374342373133414243323036463837373830322d33",
        )
        .unwrap();
        assert_eq!(cancel.encode_to_vec(), expected);
    }

    #[test]
    fn send_layout_matches_recorded_transaction() {
        let coin = Token {
            denom: "BNB".to_string(),
            amount: 100_000_000,
        };
        let transfer = Send {
            inputs: vec![Input {
                address: hex::decode(SENDER_HASH).unwrap(),
                coins: vec![coin.clone()],
            }],
            outputs: vec![Output {
                address: hex::decode(SENDER_HASH).unwrap(),
                coins: vec![coin],
            }],
        };

        let expected = hex::decode(
            "0a220a147f756b1be93aa2e2fdc3d7cb713abc206f877802120a0a03424e421080c2d72f12220a147f756b1be93aa2e2fdc3d7cb713abc206f877802120a0a03424e421080c2d72f",
        )
        .unwrap();
        assert_eq!(transfer.encode_to_vec(), expected);
    }

    #[test]
    fn std_signature_field_tags() {
        let sig = StdSignature {
            pub_key: vec![0xAA; 3],
            signature: vec![0xBB; 4],
            account_number: 23_452,
            sequence: 2,
        };
        let encoded = sig.encode_to_vec();
        assert_eq!(
            encoded,
            [
                0x0a, 0x03, 0xAA, 0xAA, 0xAA, // pub_key, field 1
                0x12, 0x04, 0xBB, 0xBB, 0xBB, 0xBB, // signature, field 2
                0x18, 0x9c, 0xb7, 0x01, // account_number, field 3
                0x20, 0x02, // sequence, field 4
            ]
        );
    }

    #[test]
    fn std_tx_omits_empty_fields() {
        let tx = StdTx {
            msgs: vec![vec![0x01, 0x02]],
            signatures: vec![vec![0x03]],
            memo: String::new(),
            source: 1,
            data: Vec::new(),
        };
        // memo and data are proto3 defaults and must not appear
        assert_eq!(
            tx.encode_to_vec(),
            [0x0a, 0x02, 0x01, 0x02, 0x12, 0x01, 0x03, 0x20, 0x01]
        );
    }

    #[test]
    fn token_freeze_from_field_is_tag_one() {
        let freeze = TokenFreeze {
            from_address: vec![0x01; 2],
            symbol: "BNB".to_string(),
            amount: 5,
        };
        assert_eq!(
            freeze.encode_to_vec(),
            [0x0a, 0x02, 0x01, 0x01, 0x12, 0x03, b'B', b'N', b'B', 0x18, 0x05]
        );
    }
}
