//! Exchange HTTP API client.
//!
//! [`DexClient`] wraps the public exchange REST service under
//! `{api_url}/api/v1`. Queries need no credentials; transaction submission
//! authenticates through the signature embedded in the broadcast payload,
//! so the broadcast path couples a [`Wallet`] with the signing pipeline in
//! [`crate::chain`].
//!
//! # Example
//!
//! ```rust,no_run
//! use bnbchain::chain::{NewOrderMsg, Wallet};
//! use bnbchain::core::config::ChainEnv;
//! use bnbchain::dex::DexClient;
//!
//! # async fn run() -> Result<(), bnbchain::core::errors::ChainError> {
//! let client = DexClient::testnet()?;
//! let markets = client.markets().await?;
//! println!("{} pairs listed", markets.len());
//!
//! let mut wallet = Wallet::from_private_key("aa..ff", ChainEnv::testnet())?;
//! let order = NewOrderMsg::limit_buy("BNB_BTC.B-918", 0.0096, 10i64);
//! let receipt = client.broadcast_msg(&mut wallet, &order, true).await?;
//! println!("accepted: {}", receipt[0].hash);
//! # Ok(())
//! # }
//! ```

pub mod types;

use async_trait::async_trait;
use governor::Quota;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use crate::chain::messages::TxMsg;
use crate::chain::sign::tx_hex;
use crate::chain::wallet::{AccountSnapshot, AccountSource, Wallet};
use crate::core::config::ChainEnv;
use crate::core::errors::ChainError;
use crate::core::kernel::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
use crate::core::types::{KlineInterval, PeerType};

pub use types::{
    Account, Balance, BlockFee, BlockFeePage, BlockFeeQuery, BroadcastResult, ClosedOrdersQuery,
    Kline, MarketPair, NodeInfo, Order, OrderBook, OrderPage, Peer, TickerStats, Times, Token,
    Trade, TradePage, TradesQuery, TransactionsQuery, Tx, TxInfo, TxPage, Validator,
    ValidatorSet,
};

/// The public endpoints answer well within this; it also bounds how long a
/// broadcast waits for CheckTx.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client for the exchange HTTP API.
///
/// Generic over the transport so tests can substitute a canned
/// [`RestClient`]; production code uses the [`ReqwestRest`] default.
#[derive(Debug, Clone)]
pub struct DexClient<R: RestClient = ReqwestRest> {
    rest: R,
    env: ChainEnv,
}

impl DexClient<ReqwestRest> {
    /// Client for the given environment with default transport settings.
    pub fn new(env: ChainEnv) -> Result<Self, ChainError> {
        let config = RestClientConfig::new(format!("{}/api/v1", env.api_url), "dex-api".to_string())
            .with_timeout(DEFAULT_TIMEOUT_SECS);
        let rest = RestClientBuilder::new(config).build()?;
        Ok(Self { rest, env })
    }

    /// Mainnet client.
    pub fn production() -> Result<Self, ChainError> {
        Self::new(ChainEnv::production())
    }

    /// Public testnet client.
    pub fn testnet() -> Result<Self, ChainError> {
        Self::new(ChainEnv::testnet())
    }

    /// Client that throttles itself to `quota` before each request.
    pub fn with_rate_limit(env: ChainEnv, quota: Quota) -> Result<Self, ChainError> {
        let config = RestClientConfig::new(format!("{}/api/v1", env.api_url), "dex-api".to_string())
            .with_timeout(DEFAULT_TIMEOUT_SECS);
        let rest = RestClientBuilder::new(config).with_rate_limit(quota).build()?;
        Ok(Self { rest, env })
    }
}

impl<R: RestClient> DexClient<R> {
    /// Wrap an existing transport.
    pub const fn from_rest(rest: R, env: ChainEnv) -> Self {
        Self { rest, env }
    }

    pub const fn env(&self) -> &ChainEnv {
        &self.env
    }

    async fn get_unwrapped<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ChainError> {
        let raw = self.rest.get(endpoint, params).await?;
        let value = unwrap_envelope(raw)?;
        serde_json::from_value(value)
            .map_err(|e| ChainError::DeserializationError(format!("{endpoint}: {e}")))
    }

    /// Server and block timestamps.
    pub async fn time(&self) -> Result<Times, ChainError> {
        self.get_unwrapped("/time", &[]).await
    }

    /// Runtime information of the answering node, including the chain id.
    pub async fn node_info(&self) -> Result<NodeInfo, ChainError> {
        self.get_unwrapped("/node-info", &[]).await
    }

    /// Current consensus validator set.
    pub async fn validators(&self) -> Result<ValidatorSet, ChainError> {
        self.get_unwrapped("/validators", &[]).await
    }

    /// Network peers, optionally narrowed to one capability.
    ///
    /// The endpoint has no server-side filter; narrowing happens here on
    /// the advertised capability tags.
    pub async fn peers(&self, peer_type: Option<PeerType>) -> Result<Vec<Peer>, ChainError> {
        let peers = self.get_unwrapped("/peers", &[]).await?;
        Ok(filter_peers(peers, peer_type))
    }

    /// Peers that accept node RPC connections.
    pub async fn node_peers(&self) -> Result<Vec<Peer>, ChainError> {
        self.peers(Some(PeerType::Node)).await
    }

    /// Peers that accept websocket connections.
    pub async fn websocket_peers(&self) -> Result<Vec<Peer>, ChainError> {
        self.peers(Some(PeerType::Websocket)).await
    }

    /// Account metadata and balances for an address.
    pub async fn account(&self, address: &str) -> Result<Account, ChainError> {
        self.get_unwrapped(&format!("/account/{address}"), &[])
            .await
    }

    /// Current sequence number for an address.
    pub async fn account_sequence(&self, address: &str) -> Result<i64, ChainError> {
        let seq: types::AccountSequence = self
            .get_unwrapped(&format!("/account/{address}/sequence"), &[])
            .await?;
        Ok(seq.sequence)
    }

    /// Look up a committed transaction by hash.
    pub async fn transaction(&self, hash: &str) -> Result<TxInfo, ChainError> {
        self.get_unwrapped(&format!("/tx/{hash}"), &[("format", "json")])
            .await
    }

    /// All issued tokens.
    pub async fn tokens(&self) -> Result<Vec<Token>, ChainError> {
        self.get_unwrapped("/tokens", &[]).await
    }

    /// All listed trading pairs.
    pub async fn markets(&self) -> Result<Vec<MarketPair>, ChainError> {
        self.get_unwrapped("/markets", &[]).await
    }

    /// Current fee schedule. Entries are polymorphic across message types,
    /// so they come back as raw JSON.
    pub async fn fees(&self) -> Result<Vec<Value>, ChainError> {
        self.get_unwrapped("/fees", &[]).await
    }

    /// Order book snapshot for one pair.
    pub async fn order_book(&self, symbol: &str) -> Result<OrderBook, ChainError> {
        self.get_unwrapped("/depth", &[("symbol", symbol)]).await
    }

    /// Candlesticks for one pair. Bars are identified by their open time.
    pub async fn klines(
        &self,
        symbol: &str,
        interval: KlineInterval,
        limit: Option<u32>,
        start_time: Option<i64>,
        end_time: Option<i64>,
    ) -> Result<Vec<Kline>, ChainError> {
        let mut params = vec![("symbol", symbol), ("interval", interval.as_str())];

        let limit_str;
        let start_time_str;
        let end_time_str;

        if let Some(limit) = limit {
            limit_str = limit.to_string();
            params.push(("limit", limit_str.as_str()));
        }
        if let Some(start_time) = start_time {
            start_time_str = start_time.to_string();
            params.push(("startTime", start_time_str.as_str()));
        }
        if let Some(end_time) = end_time {
            end_time_str = end_time.to_string();
            params.push(("endTime", end_time_str.as_str()));
        }

        self.get_unwrapped("/klines", &params).await
    }

    /// Filled and cancelled orders for an address.
    pub async fn closed_orders(&self, query: &ClosedOrdersQuery) -> Result<OrderPage, ChainError> {
        let mut params = vec![("address", query.address.as_str())];

        let side_str;
        let offset_str;
        let limit_str;
        let start_str;
        let end_str;
        let total_str;

        if let Some(symbol) = &query.symbol {
            params.push(("symbol", symbol.as_str()));
        }
        if let Some(status) = query.status {
            params.push(("status", status.as_str()));
        }
        if let Some(side) = query.side {
            side_str = side.to_wire().to_string();
            params.push(("side", side_str.as_str()));
        }
        if let Some(offset) = query.offset {
            offset_str = offset.to_string();
            params.push(("offset", offset_str.as_str()));
        }
        if let Some(limit) = query.limit {
            limit_str = limit.to_string();
            params.push(("limit", limit_str.as_str()));
        }
        if let Some(start_time) = query.start_time {
            start_str = start_time.to_string();
            params.push(("start", start_str.as_str()));
        }
        if let Some(end_time) = query.end_time {
            end_str = end_time.to_string();
            params.push(("end", end_str.as_str()));
        }
        if let Some(total) = query.total {
            total_str = total.to_string();
            params.push(("total", total_str.as_str()));
        }

        self.get_unwrapped("/orders/closed", &params).await
    }

    /// Open orders for an address.
    pub async fn open_orders(
        &self,
        address: &str,
        symbol: Option<&str>,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<OrderPage, ChainError> {
        let mut params = vec![("address", address)];

        let offset_str;
        let limit_str;

        if let Some(symbol) = symbol {
            params.push(("symbol", symbol));
        }
        if let Some(offset) = offset {
            offset_str = offset.to_string();
            params.push(("offset", offset_str.as_str()));
        }
        if let Some(limit) = limit {
            limit_str = limit.to_string();
            params.push(("limit", limit_str.as_str()));
        }

        self.get_unwrapped("/orders/open", &params).await
    }

    /// One order by id.
    pub async fn order(&self, order_id: &str) -> Result<Order, ChainError> {
        self.get_unwrapped(&format!("/orders/{order_id}"), &[])
            .await
    }

    /// 24 hour statistics for one pair. The endpoint answers with a list
    /// even for a single symbol.
    pub async fn ticker(&self, symbol: &str) -> Result<Vec<TickerStats>, ChainError> {
        self.get_unwrapped("/ticker/24hr", &[("symbol", symbol)])
            .await
    }

    /// Historical trades.
    pub async fn trades(&self, query: &TradesQuery) -> Result<TradePage, ChainError> {
        let mut params: Vec<(&str, &str)> = Vec::new();

        let side_str;
        let height_str;
        let offset_str;
        let limit_str;
        let start_str;
        let end_str;
        let total_str;

        if let Some(address) = &query.address {
            params.push(("address", address.as_str()));
        }
        if let Some(symbol) = &query.symbol {
            params.push(("symbol", symbol.as_str()));
        }
        if let Some(side) = query.side {
            side_str = side.to_wire().to_string();
            params.push(("side", side_str.as_str()));
        }
        if let Some(quote_asset) = &query.quote_asset {
            params.push(("quoteAsset", quote_asset.as_str()));
        }
        if let Some(buyer_order_id) = &query.buyer_order_id {
            params.push(("buyerOrderId", buyer_order_id.as_str()));
        }
        if let Some(seller_order_id) = &query.seller_order_id {
            params.push(("sellerOrderId", seller_order_id.as_str()));
        }
        if let Some(height) = query.height {
            height_str = height.to_string();
            params.push(("height", height_str.as_str()));
        }
        if let Some(offset) = query.offset {
            offset_str = offset.to_string();
            params.push(("offset", offset_str.as_str()));
        }
        if let Some(limit) = query.limit {
            limit_str = limit.to_string();
            params.push(("limit", limit_str.as_str()));
        }
        if let Some(start_time) = query.start_time {
            start_str = start_time.to_string();
            params.push(("start", start_str.as_str()));
        }
        if let Some(end_time) = query.end_time {
            end_str = end_time.to_string();
            params.push(("end", end_str.as_str()));
        }
        if let Some(total) = query.total {
            total_str = total.to_string();
            params.push(("total", total_str.as_str()));
        }

        self.get_unwrapped("/trades", &params).await
    }

    /// Transactions involving an address.
    pub async fn transactions(&self, query: &TransactionsQuery) -> Result<TxPage, ChainError> {
        let mut params = vec![("address", query.address.as_str())];

        let height_str;
        let offset_str;
        let limit_str;
        let start_str;
        let end_str;

        if let Some(symbol) = &query.symbol {
            params.push(("symbol", symbol.as_str()));
        }
        if let Some(side) = query.side {
            params.push(("side", side.as_str()));
        }
        if let Some(tx_asset) = &query.tx_asset {
            params.push(("txAsset", tx_asset.as_str()));
        }
        if let Some(tx_type) = query.tx_type {
            params.push(("txType", tx_type.as_str()));
        }
        if let Some(block_height) = query.block_height {
            height_str = block_height.to_string();
            params.push(("blockHeight", height_str.as_str()));
        }
        if let Some(offset) = query.offset {
            offset_str = offset.to_string();
            params.push(("offset", offset_str.as_str()));
        }
        if let Some(limit) = query.limit {
            limit_str = limit.to_string();
            params.push(("limit", limit_str.as_str()));
        }
        if let Some(start_time) = query.start_time {
            start_str = start_time.to_string();
            params.push(("startTime", start_str.as_str()));
        }
        if let Some(end_time) = query.end_time {
            end_str = end_time.to_string();
            params.push(("endTime", end_str.as_str()));
        }

        self.get_unwrapped("/transactions", &params).await
    }

    /// Trading fees of an address grouped by block.
    pub async fn block_exchange_fee(
        &self,
        query: &BlockFeeQuery,
    ) -> Result<BlockFeePage, ChainError> {
        let mut params: Vec<(&str, &str)> = Vec::new();

        let offset_str;
        let limit_str;
        let start_str;
        let end_str;
        let total_str;

        if let Some(address) = &query.address {
            params.push(("address", address.as_str()));
        }
        if let Some(offset) = query.offset {
            offset_str = offset.to_string();
            params.push(("offset", offset_str.as_str()));
        }
        if let Some(limit) = query.limit {
            limit_str = limit.to_string();
            params.push(("limit", limit_str.as_str()));
        }
        if let Some(start_time) = query.start_time {
            start_str = start_time.to_string();
            params.push(("start", start_str.as_str()));
        }
        if let Some(end_time) = query.end_time {
            end_str = end_time.to_string();
            params.push(("end", end_str.as_str()));
        }
        if let Some(total) = query.total {
            total_str = total.to_string();
            params.push(("total", total_str.as_str()));
        }

        self.get_unwrapped("/block-exchange-fee", &params).await
    }

    /// Sign and submit one message through this wallet.
    ///
    /// Syncs missing account state first, refuses wallets bound to a
    /// different environment, and advances the wallet sequence once the
    /// chain accepts the transaction. With `sync` the call waits for
    /// CheckTx and returns its outcome; without it the chain answers as
    /// soon as the transaction enters the mempool.
    #[instrument(skip(self, wallet, msg), fields(address = %wallet.address(), sync = sync))]
    pub async fn broadcast_msg(
        &self,
        wallet: &mut Wallet,
        msg: &dyn TxMsg,
        sync: bool,
    ) -> Result<Vec<BroadcastResult>, ChainError> {
        if wallet.env() != &self.env {
            return Err(ChainError::EnvironmentMismatch(format!(
                "wallet is bound to {} but this client talks to {}",
                wallet.env().api_url, self.env.api_url
            )));
        }

        wallet.sync(self).await?;
        let hex_data = tx_hex(wallet, msg)?;
        let result = self.broadcast_hex(&hex_data, sync).await?;
        wallet.increment_sequence();
        Ok(result)
    }

    /// Submit an already-signed transaction.
    ///
    /// Useful when signing happened elsewhere. Sequence bookkeeping is the
    /// caller's job here.
    #[instrument(skip(self, hex_data), fields(sync = sync))]
    pub async fn broadcast_hex(
        &self,
        hex_data: &str,
        sync: bool,
    ) -> Result<Vec<BroadcastResult>, ChainError> {
        let params: &[(&str, &str)] = if sync { &[("sync", "1")] } else { &[] };
        let raw = self
            .rest
            .post_text("/broadcast", params, hex_data.to_string())
            .await?;
        let value = unwrap_envelope(raw)?;
        serde_json::from_value(value)
            .map_err(|e| ChainError::DeserializationError(format!("/broadcast: {e}")))
    }
}

#[async_trait]
impl<R: RestClient> AccountSource for DexClient<R> {
    async fn account_snapshot(&self, address: &str) -> Result<AccountSnapshot, ChainError> {
        let account = self.account(address).await?;
        Ok(AccountSnapshot {
            account_number: account.account_number,
            sequence: account.sequence,
        })
    }

    async fn chain_id(&self) -> Result<String, ChainError> {
        Ok(self.node_info().await?.node_info.network)
    }
}

/// Apply the API's body-level error conventions and peel the `data`
/// wrapper where present.
///
/// A `code` member other than `"200000"` or `0`, or `success: false`,
/// signals a rejected request even under HTTP 200.
fn unwrap_envelope(value: Value) -> Result<Value, ChainError> {
    match value {
        Value::Object(mut map) => {
            if let Some(code) = map.get("code") {
                let accepted = code.as_str() == Some("200000") || code.as_i64() == Some(0);
                if !accepted {
                    return Err(ChainError::ApiError {
                        code: code.as_i64().unwrap_or(-1) as i32,
                        message: map
                            .get("message")
                            .and_then(Value::as_str)
                            .unwrap_or("request rejected")
                            .to_string(),
                    });
                }
            }
            if map.get("success").and_then(Value::as_bool) == Some(false) {
                return Err(ChainError::ApiError {
                    code: -1,
                    message: map
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("request reported failure")
                        .to_string(),
                });
            }
            let data = map.remove("data");
            Ok(data.unwrap_or_else(|| Value::Object(map)))
        }
        other => Ok(other),
    }
}

fn filter_peers(peers: Vec<Peer>, peer_type: Option<PeerType>) -> Vec<Peer> {
    match peer_type {
        Some(capability) => peers
            .into_iter()
            .filter(|peer| peer.capabilities.iter().any(|c| c == capability.as_str()))
            .collect(),
        None => peers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::messages::FreezeMsg;
    use serde_json::json;

    const KNOWN_KEY: &str = "3dcc267e1f7edca86e03f0963b2d0b7804552d3014caddcfc435a4d7bc240cf5";

    struct CannedRest {
        value: Value,
    }

    #[async_trait]
    impl RestClient for CannedRest {
        async fn get(
            &self,
            _endpoint: &str,
            _query_params: &[(&str, &str)],
        ) -> Result<Value, ChainError> {
            Ok(self.value.clone())
        }

        async fn get_json<T: DeserializeOwned>(
            &self,
            _endpoint: &str,
            _query_params: &[(&str, &str)],
        ) -> Result<T, ChainError> {
            serde_json::from_value(self.value.clone())
                .map_err(|e| ChainError::DeserializationError(e.to_string()))
        }

        async fn post_json(&self, _endpoint: &str, _body: &Value) -> Result<Value, ChainError> {
            Ok(self.value.clone())
        }

        async fn post_text(
            &self,
            _endpoint: &str,
            _query_params: &[(&str, &str)],
            _body: String,
        ) -> Result<Value, ChainError> {
            Ok(self.value.clone())
        }
    }

    #[test]
    fn client_builds_for_both_environments() {
        assert!(DexClient::production().is_ok());
        let client = DexClient::testnet().unwrap();
        assert!(client.env().is_testnet());
    }

    #[test]
    fn rate_limited_client_builds() {
        use nonzero_ext::nonzero;

        let quota = Quota::per_second(nonzero!(5u32));
        assert!(DexClient::with_rate_limit(ChainEnv::testnet(), quota).is_ok());
    }

    #[test]
    fn envelope_accepts_success_codes() {
        let passthrough = json!({"hash": "ABC", "code": 0});
        assert_eq!(
            unwrap_envelope(passthrough.clone()).unwrap(),
            passthrough
        );
        let wrapped = json!({"code": "200000", "data": {"x": 1}});
        assert_eq!(unwrap_envelope(wrapped).unwrap(), json!({"x": 1}));
    }

    #[test]
    fn envelope_rejects_error_codes() {
        let err = unwrap_envelope(json!({"code": 429, "message": "too much"})).unwrap_err();
        match err {
            ChainError::ApiError { code, message } => {
                assert_eq!(code, 429);
                assert_eq!(message, "too much");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(unwrap_envelope(json!({"success": false})).is_err());
    }

    #[test]
    fn envelope_passes_arrays_through() {
        let list = json!([{"hash": "ABC"}]);
        assert_eq!(unwrap_envelope(list.clone()).unwrap(), list);
    }

    #[test]
    fn peer_filter_matches_capability_tags() {
        let peers: Vec<Peer> = serde_json::from_value(json!([
            {"id": "a", "listen_addr": "x", "network": "chain", "moniker": "one",
             "capabilities": ["node", "qs"]},
            {"id": "b", "listen_addr": "y", "network": "chain", "moniker": "two",
             "capabilities": ["ap", "ws"]}
        ]))
        .unwrap();

        let nodes = filter_peers(peers.clone(), Some(PeerType::Node));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "a");

        let sockets = filter_peers(peers.clone(), Some(PeerType::Websocket));
        assert_eq!(sockets[0].id, "b");

        assert_eq!(filter_peers(peers, None).len(), 2);
    }

    #[tokio::test]
    async fn account_endpoint_decodes_payload() {
        let rest = CannedRest {
            value: json!({
                "account_number": 23452,
                "address": "tbnb10a6kkxlf823w9lwr6l9hzw4uyphcw7qzrud5rr",
                "balances": [
                    {"symbol": "BNB", "free": "1.00000000", "locked": "0.00000000",
                     "frozen": "0.00000000"}
                ],
                "sequence": 2
            }),
        };
        let client = DexClient::from_rest(rest, ChainEnv::testnet());
        let account = client.account("tbnb1...").await.unwrap();
        assert_eq!(account.account_number, 23_452);

        let snapshot = client.account_snapshot("tbnb1...").await.unwrap();
        assert_eq!(snapshot.sequence, 2);
    }

    #[tokio::test]
    async fn broadcast_hex_parses_result_list() {
        let rest = CannedRest {
            value: json!([{"code": 0, "hash": "ABC123", "ok": true}]),
        };
        let client = DexClient::from_rest(rest, ChainEnv::testnet());
        let results = client.broadcast_hex("deadbeef", true).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].hash, "ABC123");
    }

    #[tokio::test]
    async fn broadcast_refuses_cross_environment_wallet() {
        let client = DexClient::from_rest(CannedRest { value: Value::Null }, ChainEnv::production());
        let mut wallet = Wallet::from_private_key(KNOWN_KEY, ChainEnv::testnet()).unwrap();
        let msg = FreezeMsg::new("BNB", 1i64);
        assert!(matches!(
            client.broadcast_msg(&mut wallet, &msg, true).await,
            Err(ChainError::EnvironmentMismatch(_))
        ));
    }

    #[tokio::test]
    async fn broadcast_msg_advances_wallet_sequence() {
        let rest = CannedRest {
            value: json!([{"code": 0, "hash": "ABC123", "ok": true}]),
        };
        let client = DexClient::from_rest(rest, ChainEnv::testnet());
        let mut wallet = Wallet::from_private_key(KNOWN_KEY, ChainEnv::testnet()).unwrap();
        wallet.set_account_number(23_452);
        wallet.set_sequence(2);
        wallet.set_chain_id("Binance-Chain-Ganges".to_string());

        client
            .broadcast_msg(&mut wallet, &FreezeMsg::new("BNB", 1i64), true)
            .await
            .unwrap();
        assert_eq!(wallet.sequence(), Some(3));
    }
}
