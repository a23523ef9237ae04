//! Event payloads for the websocket streams.
//!
//! Market events arrive with single-letter keys on the wire; the structs
//! here spell them out. Quantities and prices stay as the decimal strings
//! the server sends.

use serde::Deserialize;
use serde_json::Value;

/// One decoded event from any subscribed stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Periodic top-of-book snapshot (`marketDepth`).
    DepthSnapshot(DepthSnapshot),
    /// Incremental book update (`marketDiff`).
    DepthDiff(DepthDiff),
    /// Batch of matches (`trades`).
    Trades(Vec<TradeEvent>),
    /// Rolling 24 hour statistics (`ticker`).
    Ticker(TickerEvent),
    /// Candlestick update (`kline_<interval>`).
    Kline(KlineEvent),
    /// Order state changes for the subscribed address (`orders`).
    Orders(Vec<OrderEvent>),
    /// Balance changes for the subscribed address (`accounts`).
    Accounts(AccountEvent),
    /// New block height (`blockheight`).
    BlockHeight(i64),
    /// Anything the codec does not recognize, kept verbatim.
    Raw(Value),
}

/// Top 20 levels per side, refreshed once a second.
#[derive(Debug, Clone, Deserialize)]
pub struct DepthSnapshot {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: i64,
    pub symbol: String,
    /// `[price, quantity]` pairs.
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepthDiff {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    /// Levels to upsert; a zero quantity removes the level.
    #[serde(rename = "b")]
    pub bids: Vec<[String; 2]>,
    #[serde(rename = "a")]
    pub asks: Vec<[String; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_height: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "t")]
    pub trade_id: String,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub quantity: String,
    #[serde(rename = "b")]
    pub buyer_order_id: String,
    #[serde(rename = "a")]
    pub seller_order_id: String,
    #[serde(rename = "T")]
    pub trade_time: i64,
    #[serde(rename = "sa")]
    pub seller_address: String,
    #[serde(rename = "ba")]
    pub buyer_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TickerEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "p")]
    pub price_change: String,
    #[serde(rename = "P")]
    pub price_change_percent: String,
    #[serde(rename = "w")]
    pub weighted_avg_price: String,
    #[serde(rename = "x")]
    pub prev_close_price: String,
    #[serde(rename = "c")]
    pub last_price: String,
    #[serde(rename = "Q")]
    pub last_quantity: String,
    #[serde(rename = "b")]
    pub best_bid_price: String,
    #[serde(rename = "B")]
    pub best_bid_quantity: String,
    #[serde(rename = "a")]
    pub best_ask_price: String,
    #[serde(rename = "A")]
    pub best_ask_quantity: String,
    #[serde(rename = "o")]
    pub open_price: String,
    #[serde(rename = "h")]
    pub high_price: String,
    #[serde(rename = "l")]
    pub low_price: String,
    #[serde(rename = "v")]
    pub volume: String,
    #[serde(rename = "q")]
    pub quote_volume: String,
    #[serde(rename = "O")]
    pub open_time: i64,
    #[serde(rename = "C")]
    pub close_time: i64,
    #[serde(rename = "F")]
    pub first_trade_id: String,
    #[serde(rename = "L")]
    pub last_trade_id: String,
    #[serde(rename = "n")]
    pub trade_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KlineEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "k")]
    pub kline: KlineDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KlineDetail {
    #[serde(rename = "t")]
    pub open_time: i64,
    #[serde(rename = "T")]
    pub close_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "f")]
    pub first_trade_id: String,
    #[serde(rename = "L")]
    pub last_trade_id: String,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "c")]
    pub close: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "v")]
    pub volume: String,
    #[serde(rename = "n")]
    pub trade_count: i64,
    #[serde(rename = "q")]
    pub quote_volume: String,
    /// Whether this bar is final.
    #[serde(rename = "x")]
    pub closed: bool,
}

/// `executionReport` entry from the `orders` stream.
///
/// Side, order type and time in force carry the same numeric encoding the
/// signed transactions use.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_height: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "S")]
    pub side: i64,
    #[serde(rename = "o")]
    pub order_type: i64,
    #[serde(rename = "f")]
    pub time_in_force: i64,
    #[serde(rename = "q")]
    pub quantity: String,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "x")]
    pub execution_type: String,
    #[serde(rename = "X")]
    pub order_status: String,
    #[serde(rename = "i")]
    pub order_id: String,
    #[serde(rename = "l")]
    pub last_executed_quantity: String,
    #[serde(rename = "z")]
    pub cumulative_filled_quantity: String,
    #[serde(rename = "L")]
    pub last_executed_price: String,
    /// Commission amount with its asset suffix, like `"10000BNB"`.
    #[serde(rename = "n")]
    pub commission: String,
    #[serde(rename = "T")]
    pub transaction_time: i64,
    #[serde(rename = "t")]
    pub trade_id: String,
    #[serde(rename = "O")]
    pub order_creation_time: i64,
}

/// `outboundAccountInfo` entry from the `accounts` stream.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_height: i64,
    #[serde(rename = "B")]
    pub balances: Vec<AccountBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountBalance {
    #[serde(rename = "a")]
    pub asset: String,
    #[serde(rename = "f")]
    pub free: String,
    #[serde(rename = "l")]
    pub locked: String,
    #[serde(rename = "r")]
    pub frozen: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execution_report_decodes_short_keys() {
        let event: OrderEvent = serde_json::from_value(json!({
            "e": "executionReport",
            "E": 62904,
            "s": "ANN-457_BNB",
            "S": 1,
            "o": 2,
            "f": 1,
            "q": "10.00000000",
            "p": "0.00039600",
            "x": "NEW",
            "X": "Ack",
            "i": "7F756B1BE93AA2E2FDC3D7CB713ABC206F877802-3",
            "l": "0.00000000",
            "z": "0.00000000",
            "L": "0.00000000",
            "n": "0",
            "T": 1561964954045i64,
            "t": "",
            "O": 1561964954045i64
        }))
        .unwrap();

        assert_eq!(event.order_status, "Ack");
        assert_eq!(event.side, 1);
        assert_eq!(event.order_id.len(), 42);
    }

    #[test]
    fn account_info_decodes_balance_list() {
        let event: AccountEvent = serde_json::from_value(json!({
            "e": "outboundAccountInfo",
            "E": 62905,
            "B": [
                {"a": "BNB", "f": "10989.96220000", "l": "0.00000000", "r": "0.00000000"},
                {"a": "ANN-457", "f": "1000.00000000", "l": "10.00000000", "r": "0.00000000"}
            ]
        }))
        .unwrap();

        assert_eq!(event.balances.len(), 2);
        assert_eq!(event.balances[1].asset, "ANN-457");
        assert_eq!(event.balances[1].locked, "10.00000000");
    }

    #[test]
    fn kline_decodes_nested_bar() {
        let event: KlineEvent = serde_json::from_value(json!({
            "e": "kline",
            "E": 123456789,
            "s": "BNB_BTC.B-918",
            "k": {
                "t": 123400000,
                "T": 123460000,
                "s": "BNB_BTC.B-918",
                "i": "1m",
                "f": "100",
                "L": "200",
                "o": "0.0010",
                "c": "0.0020",
                "h": "0.0025",
                "l": "0.0015",
                "v": "1000",
                "n": 100,
                "q": "1.0000",
                "x": false
            }
        }))
        .unwrap();

        assert_eq!(event.kline.interval, "1m");
        assert!(!event.kline.closed);
        assert_eq!(event.kline.high, "0.0025");
    }

    #[test]
    fn ticker_decodes_full_statistics() {
        let event: TickerEvent = serde_json::from_value(json!({
            "e": "24hrTicker",
            "E": 123456789,
            "s": "ABC_0DC-BNB",
            "p": "0.0015",
            "P": "250.00",
            "w": "0.0018",
            "x": "0.0009",
            "c": "0.0025",
            "Q": "10",
            "b": "0.0024",
            "B": "10",
            "a": "0.0026",
            "A": "100",
            "o": "0.0010",
            "h": "0.0025",
            "l": "0.0010",
            "v": "10000",
            "q": "18",
            "O": 0,
            "C": 86400000,
            "F": "0",
            "L": "18150",
            "n": 18151
        }))
        .unwrap();

        assert_eq!(event.last_price, "0.0025");
        assert_eq!(event.trade_count, 18_151);
    }
}
