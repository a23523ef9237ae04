//! Direct node RPC client.
//!
//! Nodes expose a JSON-RPC 2.0 service next to the exchange HTTP API.
//! Queries go as POST bodies to the endpoint root; the broadcast family is
//! served as plain GET paths. Endpoint URLs usually come from
//! [`crate::dex::DexClient::node_peers`].
//!
//! Integer parameters travel as decimal strings, matching what the
//! consensus layer parses, and heights come back the same way.
//!
//! # Example
//!
//! ```rust,no_run
//! use bnbchain::node::NodeRpcClient;
//!
//! # async fn run() -> Result<(), bnbchain::core::errors::ChainError> {
//! let rpc = NodeRpcClient::new("https://data-seed-pre-0-s1.binance.org:443")?;
//! let status = rpc.status().await?;
//! println!("synced to {}", status.sync_info.latest_block_height);
//! # Ok(())
//! # }
//! ```

pub mod types;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::instrument;

use crate::chain::messages::TxMsg;
use crate::chain::sign::tx_hex;
use crate::chain::wallet::Wallet;
use crate::core::errors::ChainError;
use crate::core::kernel::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
use crate::core::types::RpcBroadcastMode;

pub use types::{
    AbciInfo, AbciQuery, AbciQueryDetail, BlockchainInfo, ConsensusParamsInfo, NetInfo,
    NodeStatus, RpcTx, RpcValidator, RpcValidatorSet, TxSearchResult, UnconfirmedTxs,
};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client for one node's RPC endpoint.
#[derive(Debug)]
pub struct NodeRpcClient<R: RestClient = ReqwestRest> {
    rest: R,
    request_id: AtomicU64,
}

impl NodeRpcClient<ReqwestRest> {
    /// Client for the node listening at `endpoint_url`.
    pub fn new(endpoint_url: &str) -> Result<Self, ChainError> {
        let config = RestClientConfig::new(
            endpoint_url.trim_end_matches('/').to_string(),
            "node-rpc".to_string(),
        )
        .with_timeout(DEFAULT_TIMEOUT_SECS);
        let rest = RestClientBuilder::new(config).build()?;
        Ok(Self::from_rest(rest))
    }
}

impl<R: RestClient> NodeRpcClient<R> {
    /// Wrap an existing transport.
    pub fn from_rest(rest: R) -> Self {
        Self {
            rest,
            request_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let mut body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "id": self.request_id.fetch_add(1, Ordering::Relaxed),
        });
        if params.as_object().is_some_and(|map| !map.is_empty()) {
            body["params"] = params;
        }

        let raw = self.rest.post_json("", &body).await?;
        let value = unwrap_rpc_envelope(raw)?;
        serde_json::from_value(value)
            .map_err(|e| ChainError::DeserializationError(format!("{method}: {e}")))
    }

    /// Node and sync state summary.
    pub async fn status(&self) -> Result<NodeStatus, ChainError> {
        self.call("status", json!({})).await
    }

    /// Liveness probe. The node answers an empty result when healthy.
    pub async fn health(&self) -> Result<(), ChainError> {
        let _: Value = self.call("health", json!({})).await?;
        Ok(())
    }

    /// Application-level info of the ABCI layer.
    pub async fn abci_info(&self) -> Result<AbciInfo, ChainError> {
        self.call("abci_info", json!({})).await
    }

    /// Summary of the consensus round state.
    pub async fn consensus_state(&self) -> Result<Value, ChainError> {
        self.call("consensus_state", json!({})).await
    }

    /// Full dump of the consensus state, peers included.
    pub async fn dump_consensus_state(&self) -> Result<Value, ChainError> {
        self.call("dump_consensus_state", json!({})).await
    }

    /// Genesis document the chain was started from.
    pub async fn genesis(&self) -> Result<Value, ChainError> {
        self.call("genesis", json!({})).await
    }

    /// P2P networking state.
    pub async fn net_info(&self) -> Result<NetInfo, ChainError> {
        self.call("net_info", json!({})).await
    }

    /// Count of transactions waiting in the mempool.
    pub async fn num_unconfirmed_txs(&self) -> Result<UnconfirmedTxs, ChainError> {
        self.call("num_unconfirmed_txs", json!({})).await
    }

    /// Mempool transactions, raw and base64 encoded.
    pub async fn unconfirmed_txs(&self) -> Result<UnconfirmedTxs, ChainError> {
        self.call("unconfirmed_txs", json!({})).await
    }

    /// Current validator set.
    pub async fn validators(&self) -> Result<RpcValidatorSet, ChainError> {
        self.call("validators", json!({})).await
    }

    /// Query the application state directly.
    ///
    /// `data` is the hex-encoded query payload; `path` selects the store,
    /// like `/store/acc/key`. Heights travel as strings; `0` or absent
    /// means latest.
    pub async fn abci_query(
        &self,
        data: &str,
        path: Option<&str>,
        prove: bool,
        height: Option<i64>,
    ) -> Result<AbciQuery, ChainError> {
        let mut params = json!({ "data": data });
        if let Some(path) = path {
            params["path"] = json!(path);
        }
        if prove {
            params["prove"] = json!(true);
        }
        if let Some(height) = height {
            params["height"] = json!(height.to_string());
        }
        self.call("abci_query", params).await
    }

    /// Block at a height, or the latest when `height` is `None`.
    pub async fn block(&self, height: Option<i64>) -> Result<Value, ChainError> {
        let params = match height {
            Some(height) => json!({ "height": height.to_string() }),
            None => json!({}),
        };
        self.call("block", params).await
    }

    /// ABCI results produced by the block at `height`.
    pub async fn block_result(&self, height: i64) -> Result<Value, ChainError> {
        self.call("block_result", json!({ "height": height.to_string() }))
            .await
    }

    /// Commit (precommit signatures) for the block at `height`.
    pub async fn commit(&self, height: i64) -> Result<Value, ChainError> {
        self.call("commit", json!({ "height": height.to_string() }))
            .await
    }

    /// Block headers for `min_height..=max_height`, newest first. The node
    /// caps the answer at 20 headers.
    pub async fn blockchain(
        &self,
        min_height: i64,
        max_height: i64,
    ) -> Result<BlockchainInfo, ChainError> {
        if max_height <= min_height {
            return Err(ChainError::InvalidParameters(format!(
                "max_height {max_height} must be greater than min_height {min_height}"
            )));
        }
        self.call(
            "blockchain",
            json!({
                "minHeight": min_height.to_string(),
                "maxHeight": max_height.to_string(),
            }),
        )
        .await
    }

    /// Consensus parameters at a height, or the current ones.
    pub async fn consensus_params(
        &self,
        height: Option<i64>,
    ) -> Result<ConsensusParamsInfo, ChainError> {
        let params = match height {
            Some(height) => json!({ "height": height.to_string() }),
            None => json!({}),
        };
        self.call("consensus_params", params).await
    }

    /// Look up a committed transaction by hash.
    ///
    /// A missing transaction may be in the mempool, invalidated, or never
    /// sent; the node cannot tell those apart.
    pub async fn tx(&self, tx_hash: &str, prove: bool) -> Result<RpcTx, ChainError> {
        let mut params = json!({ "hash": tx_hash });
        if prove {
            params["prove"] = json!(true);
        }
        self.call("tx", params).await
    }

    /// Search committed transactions with a tag query like
    /// `"tx.height=1000"`. Pages are 1-based.
    pub async fn tx_search(
        &self,
        query: &str,
        prove: bool,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<TxSearchResult, ChainError> {
        let mut params = json!({ "query": query });
        if prove {
            params["prove"] = json!(true);
        }
        if let Some(page) = page {
            params["page"] = json!(page.to_string());
        }
        if let Some(per_page) = per_page {
            params["per_page"] = json!(per_page.to_string());
        }
        self.call("tx_search", params).await
    }

    /// Sign and submit one message straight to this node.
    ///
    /// The wallet must already carry its account number, sequence and
    /// chain id; sync it through the exchange API first. The shape of the
    /// answer depends on `mode`, so it comes back raw.
    #[instrument(skip(self, wallet, msg), fields(address = %wallet.address(), mode = mode.path()))]
    pub async fn broadcast_msg(
        &self,
        wallet: &mut Wallet,
        msg: &dyn TxMsg,
        mode: RpcBroadcastMode,
    ) -> Result<Value, ChainError> {
        let hex_data = tx_hex(wallet, msg)?;
        let result = self.broadcast_tx_hex(&hex_data, mode).await?;
        wallet.increment_sequence();
        Ok(result)
    }

    /// Submit an already-signed transaction. Sequence bookkeeping stays
    /// with the caller.
    pub async fn broadcast_tx_hex(
        &self,
        hex_data: &str,
        mode: RpcBroadcastMode,
    ) -> Result<Value, ChainError> {
        let tx_param = format!("0x{hex_data}");
        let raw = self
            .rest
            .get(&format!("/{}", mode.path()), &[("tx", tx_param.as_str())])
            .await?;
        unwrap_rpc_envelope(raw)
    }
}

/// Unwrap a JSON-RPC 2.0 envelope into its result, surfacing the `error`
/// member when the node set one.
fn unwrap_rpc_envelope(value: Value) -> Result<Value, ChainError> {
    match value {
        Value::Object(mut map) => {
            if let Some(error) = map.get("error") {
                if !error.is_null() {
                    return Err(ChainError::RpcError {
                        code: error.get("code").and_then(Value::as_i64).unwrap_or(-1),
                        message: error
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("rpc call failed")
                            .to_string(),
                        data: error
                            .get("data")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    });
                }
            }
            let result = map.remove("result");
            Ok(result.unwrap_or_else(|| Value::Object(map)))
        }
        other => Ok(other),
    }
}
