pub mod chain;
pub mod core;
pub mod dex;
pub mod node;
pub mod stream;

pub use crate::core::{config::ChainEnv, config::WalletConfig, errors::ChainError, types::*};

pub use crate::chain::{
    CancelOrderMsg, FreezeMsg, NewOrderMsg, TransferMsg, TxMsg, UnfreezeMsg, Wallet,
};
pub use crate::dex::DexClient;
pub use crate::node::NodeRpcClient;
pub use crate::stream::{DexStream, StreamEvent};
