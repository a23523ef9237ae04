//! Transaction message types and their canonical signing documents.
//!
//! Every message has two faithful renderings: a canonical JSON document
//! that is signed, and a protobuf payload that is broadcast. The chain
//! verifies the signature against its own rendering of the document, so
//! the two must agree on every value.

use prost::Message as _;
use serde::Serialize;

use super::address::decode_address;
use super::amino::{self, AminoWrap};
use super::encode::{encode_fixed_point, Amount};
use super::proto;
use super::wallet::Wallet;
use crate::core::errors::ChainError;
use crate::core::types::{OrderSide, OrderType, TimeInForce};

/// One signable transaction message.
///
/// Implementations render themselves against a wallet because the document
/// embeds the sender address and, for orders, an id derived from the wallet
/// sequence.
pub trait TxMsg {
    /// Framing applied to the wire payload.
    fn amino(&self) -> AminoWrap;

    /// Memo carried by the transaction envelope.
    fn memo(&self) -> &str {
        ""
    }

    /// Canonical JSON document for signing.
    fn to_doc(&self, wallet: &Wallet) -> Result<MsgDoc, ChainError>;

    /// Protobuf payload before framing.
    fn to_wire(&self, wallet: &Wallet) -> Result<Vec<u8>, ChainError>;

    /// Framed wire bytes, ready for embedding in the transaction envelope.
    fn to_amino(&self, wallet: &Wallet) -> Result<Vec<u8>, ChainError> {
        Ok(self.amino().wrap(&self.to_wire(wallet)?))
    }

    /// Hex-encoded signed transaction, ready for broadcast.
    fn to_hex_data(&self, wallet: &Wallet) -> Result<String, ChainError>
    where
        Self: Sized,
    {
        super::sign::tx_hex(wallet, self)
    }
}

/// Canonical JSON form of one message.
///
/// Field declaration order in each document struct matches the canonical
/// (lexicographic) key order the chain signs, so plain serde serialization
/// yields signable JSON without a sorting pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MsgDoc {
    NewOrder(NewOrderDoc),
    CancelOrder(CancelOrderDoc),
    TokenOp(TokenOpDoc),
    Transfer(TransferDoc),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderDoc {
    pub id: String,
    pub ordertype: i64,
    pub price: i64,
    pub quantity: i64,
    pub sender: String,
    pub side: i64,
    pub symbol: String,
    pub timeinforce: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelOrderDoc {
    pub refid: String,
    pub sender: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenOpDoc {
    pub amount: i64,
    #[serde(rename = "from")]
    pub from_address: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoinDoc {
    pub amount: i64,
    pub denom: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IoDoc {
    pub address: String,
    pub coins: Vec<CoinDoc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferDoc {
    pub inputs: Vec<IoDoc>,
    pub outputs: Vec<IoDoc>,
}

/// Place a limit order on the exchange.
///
/// The order id is not chosen by the caller; it is derived from the wallet
/// at encoding time as `HEX(address_hash)-{sequence + 1}`.
#[derive(Debug, Clone)]
pub struct NewOrderMsg {
    pub symbol: String,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub price: Amount,
    pub quantity: Amount,
    pub time_in_force: TimeInForce,
}

impl NewOrderMsg {
    pub fn new(
        symbol: impl Into<String>,
        side: OrderSide,
        price: impl Into<Amount>,
        quantity: impl Into<Amount>,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            order_type: OrderType::Limit,
            side,
            price: price.into(),
            quantity: quantity.into(),
            time_in_force,
        }
    }

    /// Limit buy that rests on the book until filled or cancelled.
    pub fn limit_buy(
        symbol: impl Into<String>,
        price: impl Into<Amount>,
        quantity: impl Into<Amount>,
    ) -> Self {
        Self::new(
            symbol,
            OrderSide::Buy,
            price,
            quantity,
            TimeInForce::GoodTillExpire,
        )
    }

    /// Limit sell that rests on the book until filled or cancelled.
    pub fn limit_sell(
        symbol: impl Into<String>,
        price: impl Into<Amount>,
        quantity: impl Into<Amount>,
    ) -> Self {
        Self::new(
            symbol,
            OrderSide::Sell,
            price,
            quantity,
            TimeInForce::GoodTillExpire,
        )
    }
}

impl TxMsg for NewOrderMsg {
    fn amino(&self) -> AminoWrap {
        AminoWrap::tagged(amino::NEW_ORDER_PREFIX)
    }

    fn to_doc(&self, wallet: &Wallet) -> Result<MsgDoc, ChainError> {
        Ok(MsgDoc::NewOrder(NewOrderDoc {
            id: wallet.generate_order_id()?,
            ordertype: self.order_type.to_wire(),
            price: encode_fixed_point(self.price)?,
            quantity: encode_fixed_point(self.quantity)?,
            sender: wallet.address().to_string(),
            side: self.side.to_wire(),
            symbol: self.symbol.clone(),
            timeinforce: self.time_in_force.to_wire(),
        }))
    }

    fn to_wire(&self, wallet: &Wallet) -> Result<Vec<u8>, ChainError> {
        let body = proto::NewOrder {
            sender: wallet.address_hash().to_vec(),
            id: wallet.generate_order_id()?,
            symbol: self.symbol.clone(),
            ordertype: self.order_type.to_wire(),
            side: self.side.to_wire(),
            price: encode_fixed_point(self.price)?,
            quantity: encode_fixed_point(self.quantity)?,
            timeinforce: self.time_in_force.to_wire(),
        };
        Ok(body.encode_to_vec())
    }
}

/// Cancel a resting order by its id.
#[derive(Debug, Clone)]
pub struct CancelOrderMsg {
    pub symbol: String,
    pub refid: String,
}

impl CancelOrderMsg {
    pub fn new(symbol: impl Into<String>, refid: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            refid: refid.into(),
        }
    }
}

impl TxMsg for CancelOrderMsg {
    fn amino(&self) -> AminoWrap {
        AminoWrap::tagged(amino::CANCEL_ORDER_PREFIX)
    }

    fn to_doc(&self, wallet: &Wallet) -> Result<MsgDoc, ChainError> {
        Ok(MsgDoc::CancelOrder(CancelOrderDoc {
            refid: self.refid.clone(),
            sender: wallet.address().to_string(),
            symbol: self.symbol.clone(),
        }))
    }

    fn to_wire(&self, wallet: &Wallet) -> Result<Vec<u8>, ChainError> {
        let body = proto::CancelOrder {
            sender: wallet.address_hash().to_vec(),
            symbol: self.symbol.clone(),
            refid: self.refid.clone(),
        };
        Ok(body.encode_to_vec())
    }
}

/// Move part of the wallet balance into the frozen (non-spendable) bucket.
#[derive(Debug, Clone)]
pub struct FreezeMsg {
    pub symbol: String,
    pub amount: Amount,
}

impl FreezeMsg {
    pub fn new(symbol: impl Into<String>, amount: impl Into<Amount>) -> Self {
        Self {
            symbol: symbol.into(),
            amount: amount.into(),
        }
    }
}

impl TxMsg for FreezeMsg {
    fn amino(&self) -> AminoWrap {
        AminoWrap::tagged(amino::FREEZE_PREFIX)
    }

    fn to_doc(&self, wallet: &Wallet) -> Result<MsgDoc, ChainError> {
        Ok(MsgDoc::TokenOp(TokenOpDoc {
            amount: encode_fixed_point(self.amount)?,
            from_address: wallet.address().to_string(),
            symbol: self.symbol.clone(),
        }))
    }

    fn to_wire(&self, wallet: &Wallet) -> Result<Vec<u8>, ChainError> {
        let body = proto::TokenFreeze {
            from_address: wallet.address_hash().to_vec(),
            symbol: self.symbol.clone(),
            amount: encode_fixed_point(self.amount)?,
        };
        Ok(body.encode_to_vec())
    }
}

/// Release previously frozen balance back to spendable.
#[derive(Debug, Clone)]
pub struct UnfreezeMsg {
    pub symbol: String,
    pub amount: Amount,
}

impl UnfreezeMsg {
    pub fn new(symbol: impl Into<String>, amount: impl Into<Amount>) -> Self {
        Self {
            symbol: symbol.into(),
            amount: amount.into(),
        }
    }
}

impl TxMsg for UnfreezeMsg {
    fn amino(&self) -> AminoWrap {
        AminoWrap::tagged(amino::UNFREEZE_PREFIX)
    }

    fn to_doc(&self, wallet: &Wallet) -> Result<MsgDoc, ChainError> {
        Ok(MsgDoc::TokenOp(TokenOpDoc {
            amount: encode_fixed_point(self.amount)?,
            from_address: wallet.address().to_string(),
            symbol: self.symbol.clone(),
        }))
    }

    fn to_wire(&self, wallet: &Wallet) -> Result<Vec<u8>, ChainError> {
        let body = proto::TokenUnfreeze {
            from_address: wallet.address_hash().to_vec(),
            symbol: self.symbol.clone(),
            amount: encode_fixed_point(self.amount)?,
        };
        Ok(body.encode_to_vec())
    }
}

/// Send tokens to another address, optionally with a memo.
///
/// Single input, single output, single denomination. The recipient address
/// is validated (bech32 form, 20-byte hash) before anything is signed.
#[derive(Debug, Clone)]
pub struct TransferMsg {
    pub symbol: String,
    pub amount: Amount,
    pub to_address: String,
    pub memo: String,
}

impl TransferMsg {
    pub fn new(
        symbol: impl Into<String>,
        amount: impl Into<Amount>,
        to_address: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            amount: amount.into(),
            to_address: to_address.into(),
            memo: String::new(),
        }
    }

    /// Attach a memo. Exchange deposits usually require one.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }
}

impl TxMsg for TransferMsg {
    fn amino(&self) -> AminoWrap {
        AminoWrap::tagged(amino::TRANSFER_PREFIX)
    }

    fn memo(&self) -> &str {
        &self.memo
    }

    fn to_doc(&self, wallet: &Wallet) -> Result<MsgDoc, ChainError> {
        // rejects malformed recipients before the sequence is consumed
        decode_address(&self.to_address)?;
        let coins = vec![CoinDoc {
            amount: encode_fixed_point(self.amount)?,
            denom: self.symbol.clone(),
        }];
        Ok(MsgDoc::Transfer(TransferDoc {
            inputs: vec![IoDoc {
                address: wallet.address().to_string(),
                coins: coins.clone(),
            }],
            outputs: vec![IoDoc {
                address: self.to_address.clone(),
                coins,
            }],
        }))
    }

    fn to_wire(&self, wallet: &Wallet) -> Result<Vec<u8>, ChainError> {
        let to_hash = decode_address(&self.to_address)?;
        let coins = vec![proto::Token {
            denom: self.symbol.clone(),
            amount: encode_fixed_point(self.amount)?,
        }];
        let body = proto::Send {
            inputs: vec![proto::Input {
                address: wallet.address_hash().to_vec(),
                coins: coins.clone(),
            }],
            outputs: vec![proto::Output {
                address: to_hash.to_vec(),
                coins,
            }],
        };
        Ok(body.encode_to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ChainEnv;

    const KNOWN_KEY: &str = "3dcc267e1f7edca86e03f0963b2d0b7804552d3014caddcfc435a4d7bc240cf5";
    const KNOWN_ADDRESS: &str = "tbnb10a6kkxlf823w9lwr6l9hzw4uyphcw7qzrud5rr";

    fn synced_wallet() -> Wallet {
        let mut wallet = Wallet::from_private_key(KNOWN_KEY, ChainEnv::testnet()).unwrap();
        wallet.set_account_number(23_452);
        wallet.set_sequence(2);
        wallet
    }

    fn doc_json(msg: &impl TxMsg, wallet: &Wallet) -> String {
        serde_json::to_string(&msg.to_doc(wallet).unwrap()).unwrap()
    }

    #[test]
    fn new_order_doc_uses_canonical_key_order() {
        let order = NewOrderMsg::limit_buy("ANN-457_BNB", 0.000_396_f64, 10i64);
        assert_eq!(
            doc_json(&order, &synced_wallet()),
            "{\"id\":\"7F756B1BE93AA2E2FDC3D7CB713ABC206F877802-3\",\"ordertype\":2,\
             \"price\":39600,\"quantity\":1000000000,\
             \"sender\":\"tbnb10a6kkxlf823w9lwr6l9hzw4uyphcw7qzrud5rr\",\"side\":1,\
             \"symbol\":\"ANN-457_BNB\",\"timeinforce\":1}"
        );
    }

    #[test]
    fn cancel_order_doc_uses_canonical_key_order() {
        let cancel = CancelOrderMsg::new(
            "ANN-457_BNB",
            "7F756B1BE93AA2E2FDC3D7CB713ABC206F877802-3",
        );
        assert_eq!(
            doc_json(&cancel, &synced_wallet()),
            "{\"refid\":\"7F756B1BE93AA2E2FDC3D7CB713ABC206F877802-3\",\
             \"sender\":\"tbnb10a6kkxlf823w9lwr6l9hzw4uyphcw7qzrud5rr\",\
             \"symbol\":\"ANN-457_BNB\"}"
        );
    }

    #[test]
    fn token_op_doc_uses_from_key() {
        let freeze = FreezeMsg::new("BNB", 1i64);
        assert_eq!(
            doc_json(&freeze, &synced_wallet()),
            "{\"amount\":100000000,\
             \"from\":\"tbnb10a6kkxlf823w9lwr6l9hzw4uyphcw7qzrud5rr\",\"symbol\":\"BNB\"}"
        );
        let unfreeze = UnfreezeMsg::new("BNB", 1i64);
        assert_eq!(doc_json(&unfreeze, &synced_wallet()), doc_json(&freeze, &synced_wallet()));
    }

    #[test]
    fn transfer_doc_mirrors_coins_on_both_sides() {
        let wallet = synced_wallet();
        let transfer = TransferMsg::new("BNB", 1i64, KNOWN_ADDRESS);
        assert_eq!(
            doc_json(&transfer, &wallet),
            format!(
                "{{\"inputs\":[{{\"address\":\"{a}\",\"coins\":[{{\"amount\":100000000,\
                 \"denom\":\"BNB\"}}]}}],\"outputs\":[{{\"address\":\"{a}\",\
                 \"coins\":[{{\"amount\":100000000,\"denom\":\"BNB\"}}]}}]}}",
                a = KNOWN_ADDRESS
            )
        );
    }

    #[test]
    fn new_order_wire_matches_recorded_transaction() {
        let order = NewOrderMsg::limit_buy("ANN-457_BNB", 0.000_396_f64, 10i64);
        let framed = order.to_amino(&synced_wallet()).unwrap();
        assert_eq!(
            hex::encode(framed),
            "ce6dc0430a147f756b1be93aa2e2fdc3d7cb713abc206f877802122a374637353642314245393341413245324644433344374342373133414243323036463837373830322d331a0b414e4e2d3435375f424e422002280130b0b502388094ebdc034001"
        );
    }

    #[test]
    fn transfer_wire_matches_recorded_transaction() {
        let transfer = TransferMsg::new("BNB", 1i64, KNOWN_ADDRESS);
        let framed = transfer.to_amino(&synced_wallet()).unwrap();
        assert_eq!(
            hex::encode(framed),
            "2a2c87fa0a220a147f756b1be93aa2e2fdc3d7cb713abc206f877802120a0a03424e421080c2d72f12220a147f756b1be93aa2e2fdc3d7cb713abc206f877802120a0a03424e421080c2d72f"
        );
    }

    #[test]
    fn order_messages_require_wallet_sequence() {
        let unsynced = Wallet::from_private_key(KNOWN_KEY, ChainEnv::testnet()).unwrap();
        let order = NewOrderMsg::limit_buy("ANN-457_BNB", 0.000_396_f64, 10i64);
        assert!(matches!(
            order.to_doc(&unsynced),
            Err(ChainError::UninitializedAccount(_))
        ));
        assert!(matches!(
            order.to_wire(&unsynced),
            Err(ChainError::UninitializedAccount(_))
        ));
    }

    #[test]
    fn transfer_rejects_malformed_recipient() {
        let wallet = synced_wallet();
        let transfer = TransferMsg::new("BNB", 1i64, "not-an-address");
        assert!(matches!(
            transfer.to_doc(&wallet),
            Err(ChainError::MalformedAddress(_))
        ));
    }

    #[test]
    fn transfer_memo_rides_on_the_message() {
        let transfer = TransferMsg::new("BNB", 1i64, KNOWN_ADDRESS).with_memo("order 42");
        assert_eq!(transfer.memo(), "order 42");
        let bare = CancelOrderMsg::new("ANN-457_BNB", "x");
        assert_eq!(bare.memo(), "");
    }
}
