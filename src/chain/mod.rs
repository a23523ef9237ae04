//! Transaction building and signing.
//!
//! This module is self-contained and offline: given a [`Wallet`] whose
//! account state is known, any message can be rendered to broadcast-ready
//! hex without touching the network. The pieces layer bottom-up:
//!
//! - [`encode`]: fixed-point amounts and varints
//! - [`amino`]: type prefixes and length framing
//! - [`address`]: bech32 account addresses
//! - [`proto`]: protobuf payload structs
//! - [`messages`]: the signable message types and their canonical documents
//! - [`wallet`]: key material and account state
//! - [`sign`]: the sign-doc and the final `StdTx` envelope
//!
//! # Example
//!
//! ```rust,no_run
//! use bnbchain::chain::{NewOrderMsg, TxMsg, Wallet};
//! use bnbchain::core::config::ChainEnv;
//!
//! # fn main() -> Result<(), bnbchain::core::errors::ChainError> {
//! let mut wallet = Wallet::from_private_key("aa..ff", ChainEnv::testnet())?;
//! wallet.set_account_number(23_452);
//! wallet.set_sequence(2);
//! wallet.set_chain_id("Binance-Chain-Ganges".to_string());
//!
//! let order = NewOrderMsg::limit_buy("BNB_BTC.B-918", 0.0096, 10i64);
//! let hex_data = order.to_hex_data(&wallet)?;
//! # let _ = hex_data;
//! # Ok(())
//! # }
//! ```
//!
//! [`DexClient`](crate::dex::DexClient) drives the same path end to end:
//! sync the wallet, encode, broadcast, bump the sequence.

pub mod address;
pub mod amino;
pub mod encode;
pub mod messages;
pub mod proto;
pub mod sign;
pub mod wallet;

pub use address::{address_from_public_key, decode_address, encode_address, ADDRESS_LEN};
pub use encode::{encode_fixed_point, Amount, FIXED_POINT_SCALE};
pub use messages::{
    CancelOrderMsg, FreezeMsg, MsgDoc, NewOrderMsg, TransferMsg, TxMsg, UnfreezeMsg,
};
pub use sign::{build_sign_doc, encode_std_tx, tx_hex, SignDoc, BROADCAST_SOURCE};
pub use wallet::{AccountSnapshot, AccountSource, Wallet, HD_PATH};
