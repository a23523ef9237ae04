//! Typed models for the exchange HTTP API.
//!
//! The API mixes two spellings: chain-level resources (accounts, tokens,
//! node info) use snake_case, while exchange-level resources (orders,
//! trades, tickers) use camelCase. Renames are per-field so each struct
//! reads against the documented payload.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::types::{OrderSide, OrderStatus, TransactionSide, TransactionType};

/// Server and block timestamps from `/time`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Times {
    pub ap_time: DateTime<Utc>,
    pub block_time: DateTime<Utc>,
}

/// Runtime information of the node answering `/node-info`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeInfo {
    pub node_info: NodeIdentity,
    pub sync_info: SyncInfo,
    pub validator_info: ValidatorInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeIdentity {
    pub id: String,
    pub listen_addr: String,
    /// Chain id, e.g. `Binance-Chain-Tigris`
    pub network: String,
    pub version: String,
    pub channels: String,
    pub moniker: String,
    #[serde(default)]
    pub other: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncInfo {
    pub latest_block_hash: String,
    pub latest_app_hash: String,
    pub latest_block_height: i64,
    pub latest_block_time: DateTime<Utc>,
    pub catching_up: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorInfo {
    pub address: String,
    #[serde(default)]
    pub pub_key: Value,
    pub voting_power: i64,
}

/// Consensus validator set from `/validators`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorSet {
    pub block_height: i64,
    pub validators: Vec<Validator>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Validator {
    pub address: String,
    #[serde(default)]
    pub pub_key: Value,
    pub voting_power: i64,
}

/// One network peer from `/peers`.
#[derive(Debug, Clone, Deserialize)]
pub struct Peer {
    pub id: String,
    pub listen_addr: String,
    #[serde(default)]
    pub original_listen_addr: Option<String>,
    #[serde(default)]
    pub access_addr: Option<String>,
    #[serde(default)]
    pub stream_addr: Option<String>,
    pub network: String,
    #[serde(default)]
    pub version: Option<String>,
    pub moniker: String,
    /// Service tags, e.g. `["node", "ap", "ws"]`
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub accelerated: Option<bool>,
}

/// Account metadata from `/account/{address}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub account_number: i64,
    pub address: String,
    pub balances: Vec<Balance>,
    #[serde(default)]
    pub flags: Option<i64>,
    #[serde(default)]
    pub public_key: Option<Value>,
    pub sequence: i64,
}

/// Per-token balance split into its three buckets.
#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub free: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub locked: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub frozen: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AccountSequence {
    pub sequence: i64,
}

/// Transaction lookup result from `/tx/{hash}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TxInfo {
    #[serde(default)]
    pub code: Option<i64>,
    pub hash: String,
    /// Block height, returned as a decimal string
    pub height: String,
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub ok: Option<bool>,
    /// Decoded transaction, shape depends on the message type
    #[serde(default)]
    pub tx: Value,
}

/// Issued token from `/tokens`.
#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub mintable: bool,
    pub name: String,
    pub original_symbol: String,
    pub owner: String,
    pub symbol: String,
    pub total_supply: String,
}

/// Listed trading pair from `/markets`.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketPair {
    pub base_asset_symbol: String,
    pub quote_asset_symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub list_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub lot_size: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub tick_size: Decimal,
}

/// Order book snapshot from `/depth`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderBook {
    /// `[price, quantity]` pairs, best ask first
    pub asks: Vec<[String; 2]>,
    /// `[price, quantity]` pairs, best bid first
    pub bids: Vec<[String; 2]>,
    #[serde(default)]
    pub height: Option<i64>,
}

/// Per-message outcome of a broadcast. The endpoint returns one entry per
/// message in the transaction, so a single-message broadcast yields a
/// one-element list.
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastResult {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub data: Option<String>,
    pub hash: String,
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub ok: Option<bool>,
}

/// One candlestick. The endpoint returns bare arrays; this deserializes
/// positionally and parses the string-typed prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kline {
    pub open_time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: i64,
    pub quote_asset_volume: Decimal,
    pub trade_count: i64,
}

impl<'de> Deserialize<'de> for Kline {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        fn dec<E: serde::de::Error>(field: &str, value: &str) -> Result<Decimal, E> {
            Decimal::from_str(value)
                .map_err(|e| E::custom(format!("bad {field} value {value:?}: {e}")))
        }

        type Row = (i64, String, String, String, String, String, i64, String, i64);
        let (open_time, open, high, low, close, volume, close_time, quote_volume, trades): Row =
            Deserialize::deserialize(deserializer)?;
        Ok(Self {
            open_time,
            open: dec("open", &open)?,
            high: dec("high", &high)?,
            low: dec("low", &low)?,
            close: dec("close", &close)?,
            volume: dec("volume", &volume)?,
            close_time,
            quote_asset_volume: dec("quoteAssetVolume", &quote_volume)?,
            trade_count: trades,
        })
    }
}

/// One order as the exchange reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    #[serde(rename = "orderId")]
    pub order_id: String,
    pub symbol: String,
    pub owner: String,
    pub price: String,
    pub quantity: String,
    #[serde(rename = "cumulateQuantity", default)]
    pub cumulate_quantity: Option<String>,
    #[serde(default)]
    pub fee: Option<String>,
    #[serde(rename = "lastExecutedPrice", default)]
    pub last_executed_price: Option<String>,
    #[serde(rename = "lastExecutedQuantity", default)]
    pub last_executed_quantity: Option<String>,
    pub side: i64,
    pub status: String,
    #[serde(rename = "timeInForce")]
    pub time_in_force: i64,
    #[serde(rename = "type")]
    pub order_type: i64,
    #[serde(rename = "orderCreateTime", default)]
    pub order_create_time: Option<String>,
    #[serde(rename = "tradeId", default)]
    pub trade_id: Option<String>,
    #[serde(rename = "transactionHash", default)]
    pub transaction_hash: Option<String>,
    #[serde(rename = "transactionTime", default)]
    pub transaction_time: Option<String>,
}

/// Page of orders from `/orders/open` and `/orders/closed`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderPage {
    #[serde(default)]
    pub order: Vec<Order>,
    pub total: i64,
}

/// 24 hour rolling statistics for one pair.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerStats {
    pub symbol: String,
    #[serde(rename = "askPrice")]
    pub ask_price: String,
    #[serde(rename = "askQuantity")]
    pub ask_quantity: String,
    #[serde(rename = "bidPrice")]
    pub bid_price: String,
    #[serde(rename = "bidQuantity")]
    pub bid_quantity: String,
    #[serde(rename = "closeTime")]
    pub close_time: i64,
    pub count: i64,
    #[serde(rename = "firstId")]
    pub first_id: String,
    #[serde(rename = "highPrice")]
    pub high_price: String,
    #[serde(rename = "lastId")]
    pub last_id: String,
    #[serde(rename = "lastPrice")]
    pub last_price: String,
    #[serde(rename = "lastQuantity")]
    pub last_quantity: String,
    #[serde(rename = "lowPrice")]
    pub low_price: String,
    #[serde(rename = "openPrice")]
    pub open_price: String,
    #[serde(rename = "openTime")]
    pub open_time: i64,
    #[serde(rename = "prevClosePrice")]
    pub prev_close_price: String,
    #[serde(rename = "priceChange")]
    pub price_change: String,
    #[serde(rename = "priceChangePercent")]
    pub price_change_percent: String,
    #[serde(rename = "quoteVolume")]
    pub quote_volume: String,
    pub volume: String,
    #[serde(rename = "weightedAvgPrice")]
    pub weighted_avg_price: String,
}

/// One executed trade.
#[derive(Debug, Clone, Deserialize)]
pub struct Trade {
    #[serde(rename = "tradeId")]
    pub trade_id: String,
    pub symbol: String,
    #[serde(rename = "blockHeight")]
    pub block_height: i64,
    #[serde(rename = "baseAsset")]
    pub base_asset: String,
    #[serde(rename = "quoteAsset")]
    pub quote_asset: String,
    pub price: String,
    pub quantity: String,
    #[serde(rename = "buyerOrderId")]
    pub buyer_order_id: String,
    #[serde(rename = "sellerOrderId")]
    pub seller_order_id: String,
    #[serde(rename = "buyerId", default)]
    pub buyer_id: Option<String>,
    #[serde(rename = "sellerId", default)]
    pub seller_id: Option<String>,
    #[serde(rename = "buyFee", default)]
    pub buy_fee: Option<String>,
    #[serde(rename = "sellFee", default)]
    pub sell_fee: Option<String>,
    pub time: i64,
}

/// Page of trades from `/trades`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradePage {
    #[serde(default)]
    pub trade: Vec<Trade>,
    pub total: i64,
}

/// One transaction in an address history.
#[derive(Debug, Clone, Deserialize)]
pub struct Tx {
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    #[serde(rename = "blockHeight")]
    pub block_height: i64,
    #[serde(rename = "txType")]
    pub tx_type: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    #[serde(rename = "fromAddr")]
    pub from_addr: String,
    #[serde(rename = "toAddr", default)]
    pub to_addr: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "txAsset", default)]
    pub tx_asset: Option<String>,
    #[serde(rename = "txFee", default)]
    pub tx_fee: Option<String>,
    #[serde(rename = "txAge")]
    pub tx_age: i64,
    #[serde(rename = "orderId", default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(rename = "confirmBlocks", default)]
    pub confirm_blocks: Option<i64>,
    #[serde(rename = "proposalId", default)]
    pub proposal_id: Option<String>,
    #[serde(default)]
    pub sequence: Option<i64>,
    #[serde(default)]
    pub source: Option<i64>,
}

/// Page of transactions from `/transactions`.
#[derive(Debug, Clone, Deserialize)]
pub struct TxPage {
    #[serde(default)]
    pub tx: Vec<Tx>,
    pub total: i64,
}

/// Per-block trading fee totals for an address.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockFee {
    pub address: String,
    #[serde(rename = "blockHeight")]
    pub block_height: i64,
    #[serde(rename = "blockTime", default)]
    pub block_time: Option<i64>,
    pub fee: String,
    #[serde(rename = "tradeCount", default)]
    pub trade_count: Option<i64>,
}

/// Page of block fees from `/block-exchange-fee`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockFeePage {
    #[serde(rename = "blockExchangeFeeList", default)]
    pub block_exchange_fee_list: Vec<BlockFee>,
    pub total: i64,
}

/// Query parameters for `/orders/closed`.
#[derive(Debug, Clone, Default)]
pub struct ClosedOrdersQuery {
    pub address: String,
    pub symbol: Option<String>,
    pub status: Option<OrderStatus>,
    pub side: Option<OrderSide>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    /// 1 to ask the server for an exact total, 0 (default) returns -1
    pub total: Option<i32>,
}

impl ClosedOrdersQuery {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

/// Query parameters for `/trades`.
#[derive(Debug, Clone, Default)]
pub struct TradesQuery {
    pub address: Option<String>,
    pub symbol: Option<String>,
    pub side: Option<OrderSide>,
    pub quote_asset: Option<String>,
    pub buyer_order_id: Option<String>,
    pub seller_order_id: Option<String>,
    pub height: Option<i64>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub total: Option<i32>,
}

/// Query parameters for `/transactions`.
#[derive(Debug, Clone, Default)]
pub struct TransactionsQuery {
    pub address: String,
    pub symbol: Option<String>,
    pub side: Option<TransactionSide>,
    pub tx_asset: Option<String>,
    pub tx_type: Option<TransactionType>,
    pub block_height: Option<i64>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl TransactionsQuery {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

/// Query parameters for `/block-exchange-fee`.
#[derive(Debug, Clone, Default)]
pub struct BlockFeeQuery {
    pub address: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub total: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kline_rows_decode_from_arrays() {
        let raw = r#"[
            [1555459200000, "0.00559400", "0.00561700", "0.00559400", "0.00560700", "76968.00000000", 1555545599999, "431.26630433", 1580]
        ]"#;
        let klines: Vec<Kline> = serde_json::from_str(raw).unwrap();
        assert_eq!(klines.len(), 1);
        let k = &klines[0];
        assert_eq!(k.open_time, 1_555_459_200_000);
        assert_eq!(k.open.to_string(), "0.00559400");
        assert_eq!(k.close_time, 1_555_545_599_999);
        assert_eq!(k.trade_count, 1580);
    }

    #[test]
    fn kline_rejects_unparseable_price() {
        let raw = r#"[[0, "x", "0", "0", "0", "0", 0, "0", 0]]"#;
        assert!(serde_json::from_str::<Vec<Kline>>(raw).is_err());
    }

    #[test]
    fn account_parses_balances_as_decimals() {
        let raw = r#"{
            "account_number": 23452,
            "address": "tbnb10a6kkxlf823w9lwr6l9hzw4uyphcw7qzrud5rr",
            "balances": [
                {"symbol": "BNB", "free": "10.00000000", "locked": "0.00000000", "frozen": "1.50000000"}
            ],
            "public_key": null,
            "sequence": 2
        }"#;
        let account: Account = serde_json::from_str(raw).unwrap();
        assert_eq!(account.account_number, 23_452);
        assert_eq!(account.sequence, 2);
        assert_eq!(account.balances[0].free, Decimal::new(10, 0));
        assert_eq!(account.balances[0].frozen.to_string(), "1.50000000");
        assert!(account.public_key.is_none());
        assert!(account.flags.is_none());
    }

    #[test]
    fn order_maps_the_type_field() {
        let raw = r#"{
            "orderId": "7F756B1BE93AA2E2FDC3D7CB713ABC206F877802-3",
            "symbol": "ANN-457_BNB",
            "owner": "tbnb10a6kkxlf823w9lwr6l9hzw4uyphcw7qzrud5rr",
            "price": "0.00039600",
            "quantity": "10.00000000",
            "side": 1,
            "status": "Ack",
            "timeInForce": 1,
            "type": 2
        }"#;
        let order: Order = serde_json::from_str(raw).unwrap();
        assert_eq!(order.order_type, 2);
        assert_eq!(order.side, 1);
        assert!(order.trade_id.is_none());
    }

    #[test]
    fn broadcast_results_arrive_as_a_list() {
        let raw = r#"[{"code": 0, "hash": "ABC123", "log": "Msg 0: ", "ok": true}]"#;
        let results: Vec<BroadcastResult> = serde_json::from_str(raw).unwrap();
        assert_eq!(results[0].hash, "ABC123");
        assert_eq!(results[0].ok, Some(true));
        assert!(results[0].data.is_none());
    }

    #[test]
    fn transaction_page_tolerates_nulls() {
        let raw = r#"{
            "tx": [{
                "txHash": "E81B...", "blockHeight": 12345, "txType": "TRANSFER",
                "timeStamp": "2019-04-16T01:00:00Z", "fromAddr": "tbnb1...",
                "toAddr": null, "value": "1.00000000", "txAsset": "BNB",
                "txFee": "0.00012500", "txAge": 100, "orderId": null,
                "code": 0, "data": null, "memo": "", "confirmBlocks": 0,
                "proposalId": null, "sequence": 2, "source": 1
            }],
            "total": 1
        }"#;
        let page: TxPage = serde_json::from_str(raw).unwrap();
        assert_eq!(page.total, 1);
        assert!(page.tx[0].to_addr.is_none());
        assert_eq!(page.tx[0].sequence, Some(2));
    }

    #[test]
    fn order_book_levels_are_price_quantity_pairs() {
        let raw = r#"{"asks": [["0.00560000", "100.00000000"]], "bids": [], "height": 123}"#;
        let book: OrderBook = serde_json::from_str(raw).unwrap();
        assert_eq!(book.asks[0][0], "0.00560000");
        assert!(book.bids.is_empty());
        assert_eq!(book.height, Some(123));
    }
}
