//! Websocket market data and user event streams.
//!
//! One connection multiplexes any number of topics. Market topics carry a
//! symbol list, user topics an address; the server expects a keepalive
//! frame at least once a minute from a silent client and [`DexStream`]
//! sends it automatically from `next_event`.
//!
//! # Example
//!
//! ```rust,no_run
//! use bnbchain::core::config::ChainEnv;
//! use bnbchain::stream::{DexStream, StreamEvent};
//!
//! # async fn run() -> Result<(), bnbchain::core::errors::ChainError> {
//! let mut stream = DexStream::new(&ChainEnv::testnet());
//! stream.connect().await?;
//! stream.subscribe_trades(&["BNB_BTC.B-918"]).await?;
//!
//! while let Some(event) = stream.next_event().await {
//!     if let StreamEvent::Trades(trades) = event? {
//!         println!("{} fills", trades.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod types;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use crate::core::config::ChainEnv;
use crate::core::errors::ChainError;
use crate::core::kernel::{ReconnectWs, TungsteniteWs, WsCodec, WsConfig, WsSession};
use crate::core::types::KlineInterval;

pub use types::{
    AccountBalance, AccountEvent, DepthDiff, DepthSnapshot, KlineDetail, KlineEvent, OrderEvent,
    StreamEvent, TickerEvent, TradeEvent,
};

/// Topic names as the server spells them.
pub mod topics {
    pub const MARKET_DEPTH: &str = "marketDepth";
    pub const MARKET_DIFF: &str = "marketDiff";
    pub const TRADES: &str = "trades";
    pub const TICKER: &str = "ticker";
    pub const ORDERS: &str = "orders";
    pub const ACCOUNTS: &str = "accounts";
    pub const BLOCK_HEIGHT: &str = "blockheight";
    pub const KLINE_PREFIX: &str = "kline_";
}

/// Wire codec for the exchange websocket protocol.
///
/// Stream ids take the form `topic` or `topic:TARGET`, where the target is
/// a symbol for market topics and an address for user topics. One frame
/// carries one topic, so every id in a call must share it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DexCodec;

impl DexCodec {
    fn encode_frame(
        method: &str,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<Message, ChainError> {
        let first = streams
            .first()
            .ok_or_else(|| ChainError::InvalidParameters("no streams to encode".to_string()))?;
        let (topic, _) = split_stream_id(first.as_ref());

        let mut symbols: Vec<String> = Vec::new();
        let mut address: Option<String> = None;
        for id in streams {
            let (id_topic, target) = split_stream_id(id.as_ref());
            if id_topic != topic {
                return Err(ChainError::InvalidParameters(format!(
                    "one frame carries one topic, got {topic} and {id_topic}"
                )));
            }
            if let Some(target) = target {
                if is_user_topic(topic) {
                    address = Some(target.to_string());
                } else {
                    symbols.push(target.to_string());
                }
            }
        }

        let mut frame = json!({ "method": method, "topic": topic });
        if let Some(address) = address {
            frame["address"] = json!(address);
        }
        if !symbols.is_empty() {
            frame["symbols"] = json!(symbols);
        }
        Ok(Message::Text(frame.to_string()))
    }
}

impl WsCodec for DexCodec {
    type Message = StreamEvent;

    fn encode_subscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<Message, ChainError> {
        Self::encode_frame("subscribe", streams)
    }

    fn encode_unsubscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<Message, ChainError> {
        Self::encode_frame("unsubscribe", streams)
    }

    fn decode_message(&self, message: Message) -> Result<Option<StreamEvent>, ChainError> {
        let text = match message {
            Message::Text(text) => text,
            Message::Binary(bytes) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => return Ok(None),
            },
            _ => return Ok(None),
        };

        // Non-JSON frames (the server sends none today) are dropped, not
        // surfaced as errors.
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            return Ok(None);
        };
        decode_event(value).map(Some)
    }
}

fn split_stream_id(id: &str) -> (&str, Option<&str>) {
    match id.split_once(':') {
        Some((topic, target)) => (topic, Some(target)),
        None => (id, None),
    }
}

fn is_user_topic(topic: &str) -> bool {
    topic == topics::ORDERS || topic == topics::ACCOUNTS
}

fn decode_event(value: Value) -> Result<StreamEvent, ChainError> {
    let Some(stream) = value.get("stream").and_then(Value::as_str) else {
        return Ok(StreamEvent::Raw(value));
    };
    let stream = stream.to_string();
    let data = value.get("data").cloned().unwrap_or(Value::Null);

    let event = match stream.as_str() {
        topics::MARKET_DEPTH => StreamEvent::DepthSnapshot(decode_payload(&stream, data)?),
        topics::MARKET_DIFF => StreamEvent::DepthDiff(decode_payload(&stream, data)?),
        topics::TRADES => StreamEvent::Trades(decode_payload(&stream, data)?),
        topics::TICKER => StreamEvent::Ticker(decode_payload(&stream, data)?),
        topics::ORDERS => StreamEvent::Orders(decode_payload(&stream, data)?),
        topics::ACCOUNTS => StreamEvent::Accounts(decode_payload(&stream, data)?),
        topics::BLOCK_HEIGHT => {
            let height = data.get("h").and_then(Value::as_i64).ok_or_else(|| {
                ChainError::DeserializationError("blockheight event without height".to_string())
            })?;
            StreamEvent::BlockHeight(height)
        }
        s if s.starts_with(topics::KLINE_PREFIX) => {
            StreamEvent::Kline(decode_payload(&stream, data)?)
        }
        _ => StreamEvent::Raw(value),
    };
    Ok(event)
}

fn decode_payload<T: DeserializeOwned>(stream: &str, data: Value) -> Result<T, ChainError> {
    serde_json::from_value(data)
        .map_err(|e| ChainError::DeserializationError(format!("{stream} event: {e}")))
}

fn symbol_streams(topic: &str, symbols: &[&str]) -> Vec<String> {
    if symbols.is_empty() {
        vec![topic.to_string()]
    } else {
        symbols
            .iter()
            .map(|symbol| format!("{topic}:{symbol}"))
            .collect()
    }
}

/// Stream handle with reconnect and keepalive built in.
///
/// Wraps a reconnecting session over one websocket connection. User topics
/// need the connection bound to an address via [`DexStream::with_address`].
pub struct DexStream {
    session: ReconnectWs<DexCodec, TungsteniteWs<DexCodec>>,
    keepalive: Duration,
}

impl DexStream {
    /// Market data stream for an environment.
    pub fn new(env: &ChainEnv) -> Self {
        Self::with_address(env, None)
    }

    /// Stream bound to an address, as the user topics require.
    pub fn with_address(env: &ChainEnv, address: Option<&str>) -> Self {
        Self::with_config(env, address, WsConfig::default())
    }

    pub fn with_config(env: &ChainEnv, address: Option<&str>, config: WsConfig) -> Self {
        let url = match address {
            Some(address) => format!("{}ws/{}", env.wss_url, address),
            None => format!("{}ws", env.wss_url),
        };
        let keepalive = Duration::from_millis(config.keepalive_interval_ms);
        let reconnect_delay = Duration::from_millis(config.reconnect_delay_ms);
        let max_attempts = config.max_reconnect_attempts;

        let inner =
            TungsteniteWs::new(url, "dex-stream".to_string(), DexCodec).with_config(config);
        let session = ReconnectWs::new(inner)
            .with_max_reconnect_attempts(max_attempts)
            .with_reconnect_delay(reconnect_delay);

        Self { session, keepalive }
    }

    pub async fn connect(&mut self) -> Result<(), ChainError> {
        self.session.connect().await
    }

    pub async fn close(&mut self) -> Result<(), ChainError> {
        self.session.close().await
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Next decoded event.
    ///
    /// Whenever the connection stays silent for the keepalive interval the
    /// keepalive frame goes out and the wait resumes, so callers only ever
    /// see real events, errors, or the end of the stream.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, ChainError>> {
        loop {
            match timeout(self.keepalive, self.session.next_message()).await {
                Ok(outcome) => return outcome,
                Err(_) => {
                    if let Err(e) = self.send_keepalive().await {
                        return Some(Err(e));
                    }
                }
            }
        }
    }

    /// Tell the server this side is still alive.
    pub async fn send_keepalive(&mut self) -> Result<(), ChainError> {
        let frame = json!({ "method": "keepAlive" });
        self.session
            .send_raw(Message::Text(frame.to_string()))
            .await
    }

    pub async fn subscribe_depth(&mut self, symbols: &[&str]) -> Result<(), ChainError> {
        self.subscribe_symbols(topics::MARKET_DEPTH, symbols).await
    }

    pub async fn unsubscribe_depth(&mut self, symbols: &[&str]) -> Result<(), ChainError> {
        self.unsubscribe_symbols(topics::MARKET_DEPTH, symbols)
            .await
    }

    pub async fn subscribe_depth_diff(&mut self, symbols: &[&str]) -> Result<(), ChainError> {
        self.subscribe_symbols(topics::MARKET_DIFF, symbols).await
    }

    pub async fn unsubscribe_depth_diff(&mut self, symbols: &[&str]) -> Result<(), ChainError> {
        self.unsubscribe_symbols(topics::MARKET_DIFF, symbols).await
    }

    pub async fn subscribe_trades(&mut self, symbols: &[&str]) -> Result<(), ChainError> {
        self.subscribe_symbols(topics::TRADES, symbols).await
    }

    pub async fn unsubscribe_trades(&mut self, symbols: &[&str]) -> Result<(), ChainError> {
        self.unsubscribe_symbols(topics::TRADES, symbols).await
    }

    pub async fn subscribe_ticker(&mut self, symbols: &[&str]) -> Result<(), ChainError> {
        self.subscribe_symbols(topics::TICKER, symbols).await
    }

    pub async fn unsubscribe_ticker(&mut self, symbols: &[&str]) -> Result<(), ChainError> {
        self.unsubscribe_symbols(topics::TICKER, symbols).await
    }

    /// Candlesticks at one interval for a symbol set.
    pub async fn subscribe_klines(
        &mut self,
        interval: KlineInterval,
        symbols: &[&str],
    ) -> Result<(), ChainError> {
        let topic = format!("{}{}", topics::KLINE_PREFIX, interval.as_str());
        self.subscribe_symbols(&topic, symbols).await
    }

    pub async fn unsubscribe_klines(
        &mut self,
        interval: KlineInterval,
        symbols: &[&str],
    ) -> Result<(), ChainError> {
        let topic = format!("{}{}", topics::KLINE_PREFIX, interval.as_str());
        self.unsubscribe_symbols(&topic, symbols).await
    }

    /// Order updates for an address.
    pub async fn subscribe_orders(&mut self, address: &str) -> Result<(), ChainError> {
        self.session
            .subscribe(&[format!("{}:{address}", topics::ORDERS)])
            .await
    }

    pub async fn unsubscribe_orders(&mut self, address: &str) -> Result<(), ChainError> {
        self.session
            .unsubscribe(&[format!("{}:{address}", topics::ORDERS)])
            .await
    }

    /// Balance updates for an address.
    pub async fn subscribe_accounts(&mut self, address: &str) -> Result<(), ChainError> {
        self.session
            .subscribe(&[format!("{}:{address}", topics::ACCOUNTS)])
            .await
    }

    pub async fn unsubscribe_accounts(&mut self, address: &str) -> Result<(), ChainError> {
        self.session
            .unsubscribe(&[format!("{}:{address}", topics::ACCOUNTS)])
            .await
    }

    pub async fn subscribe_block_height(&mut self) -> Result<(), ChainError> {
        self.session.subscribe(&[topics::BLOCK_HEIGHT]).await
    }

    pub async fn unsubscribe_block_height(&mut self) -> Result<(), ChainError> {
        self.session.unsubscribe(&[topics::BLOCK_HEIGHT]).await
    }

    async fn subscribe_symbols(&mut self, topic: &str, symbols: &[&str]) -> Result<(), ChainError> {
        self.session
            .subscribe(&symbol_streams(topic, symbols))
            .await
    }

    async fn unsubscribe_symbols(
        &mut self,
        topic: &str,
        symbols: &[&str],
    ) -> Result<(), ChainError> {
        self.session
            .unsubscribe(&symbol_streams(topic, symbols))
            .await
    }
}
