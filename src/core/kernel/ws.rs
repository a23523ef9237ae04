use crate::core::errors::ChainError;
use crate::core::kernel::codec::WsCodec;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::time::sleep;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{error, instrument, warn};

/// WebSocket session configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Idle time before a keep-alive frame is due, in milliseconds
    ///
    /// The server drops connections that stay silent; callers that own a
    /// session send an application-level keep-alive after this much quiet.
    pub keepalive_interval_ms: u64,
    /// Max reconnection attempts
    pub max_reconnect_attempts: u32,
    /// Initial delay between reconnection attempts in milliseconds
    pub reconnect_delay_ms: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,    // 10 seconds
            keepalive_interval_ms: 60_000, // server idle limit is 60 seconds
            max_reconnect_attempts: 5,
            reconnect_delay_ms: 100,
        }
    }
}

/// WebSocket session trait - pure transport layer
#[async_trait]
pub trait WsSession<C: WsCodec>: Send + Sync {
    /// Connect to the WebSocket
    async fn connect(&mut self) -> Result<(), ChainError>;

    /// Send a raw message
    async fn send_raw(&mut self, msg: Message) -> Result<(), ChainError>;

    /// Receive the next raw message
    async fn next_raw(&mut self) -> Option<Result<Message, ChainError>>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), ChainError>;

    /// Check if the connection is alive
    fn is_connected(&self) -> bool;

    /// Subscribe to streams using the codec
    async fn subscribe(
        &mut self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<(), ChainError>;

    /// Unsubscribe from streams using the codec
    async fn unsubscribe(
        &mut self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<(), ChainError>;

    /// Get the next decoded message
    async fn next_message(&mut self) -> Option<Result<C::Message, ChainError>>;
}

/// Tungstenite-based WebSocket implementation
pub struct TungsteniteWs<C: WsCodec> {
    url: String,
    write: Option<
        futures_util::stream::SplitSink<
            tokio_tungstenite::WebSocketStream<
                tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
            >,
            Message,
        >,
    >,
    read: Option<
        futures_util::stream::SplitStream<
            tokio_tungstenite::WebSocketStream<
                tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
            >,
        >,
    >,
    connected: bool,
    service_name: String,
    codec: C,
    config: WsConfig,
}

impl<C: WsCodec> TungsteniteWs<C> {
    /// Create a new WebSocket session with the specified codec
    ///
    /// # Arguments
    /// * `url` - The WebSocket URL to connect to
    /// * `service_name` - Name of the service for logging/tracing
    /// * `codec` - The codec to handle message encoding/decoding
    pub fn new(url: String, service_name: String, codec: C) -> Self {
        Self {
            url,
            write: None,
            read: None,
            connected: false,
            service_name,
            codec,
            config: WsConfig::default(),
        }
    }

    /// Set custom WebSocket configuration
    pub fn with_config(mut self, config: WsConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration this session was built with
    pub fn config(&self) -> &WsConfig {
        &self.config
    }
}

#[async_trait]
impl<C: WsCodec> WsSession<C> for TungsteniteWs<C> {
    #[instrument(skip(self), fields(service = %self.service_name, url = %self.url))]
    async fn connect(&mut self) -> Result<(), ChainError> {
        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);

        let connection_future = tokio::time::timeout(connect_timeout, connect_async(&self.url));

        let (ws_stream, _) = connection_future
            .await
            .map_err(|_| ChainError::ConnectionTimeout)?
            .map_err(|e| {
                ChainError::NetworkError(format!("WebSocket connection failed: {}", e))
            })?;

        let (write, read) = ws_stream.split();
        self.write = Some(write);
        self.read = Some(read);
        self.connected = true;

        Ok(())
    }

    #[instrument(skip(self, msg), fields(service = %self.service_name))]
    async fn send_raw(&mut self, msg: Message) -> Result<(), ChainError> {
        if !self.connected {
            return Err(ChainError::NetworkError(
                "WebSocket not connected".to_string(),
            ));
        }

        let write = self.write.as_mut().ok_or_else(|| {
            ChainError::NetworkError("WebSocket write stream not available".to_string())
        })?;

        write.send(msg).await.map_err(|e| {
            self.connected = false;
            ChainError::NetworkError(format!("Failed to send WebSocket message: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(service = %self.service_name))]
    async fn next_raw(&mut self) -> Option<Result<Message, ChainError>> {
        if !self.connected {
            return Some(Err(ChainError::NetworkError(
                "WebSocket not connected".to_string(),
            )));
        }

        let read = self.read.as_mut()?;

        match read.next().await {
            Some(Ok(message)) => {
                // Handle control messages at transport level only
                match &message {
                    Message::Close(_) => {
                        self.connected = false;
                        Some(Ok(message))
                    }
                    Message::Ping(data) => {
                        // Auto-respond to pings at transport level
                        let pong = Message::Pong(data.clone());
                        if let Err(e) = self.send_raw(pong).await {
                            warn!("Failed to send pong response: {}", e);
                        }
                        // Continue to next message
                        self.next_raw().await
                    }
                    Message::Pong(_) => {
                        // Ignore pong messages, continue to next
                        self.next_raw().await
                    }
                    _ => Some(Ok(message)),
                }
            }
            Some(Err(e)) => {
                self.connected = false;
                Some(Err(ChainError::NetworkError(format!(
                    "WebSocket error: {}",
                    e
                ))))
            }
            None => {
                self.connected = false;
                None
            }
        }
    }

    #[instrument(skip(self), fields(service = %self.service_name))]
    async fn close(&mut self) -> Result<(), ChainError> {
        if let Some(write) = self.write.as_mut() {
            let _ = write.send(Message::Close(None)).await;
        }
        self.connected = false;
        self.write = None;
        self.read = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    #[instrument(skip(self, streams), fields(service = %self.service_name, stream_count = streams.len()))]
    async fn subscribe(
        &mut self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<(), ChainError> {
        if streams.is_empty() {
            return Ok(());
        }

        let message = self.codec.encode_subscription(streams)?;
        self.send_raw(message).await
    }

    #[instrument(skip(self, streams), fields(service = %self.service_name, stream_count = streams.len()))]
    async fn unsubscribe(
        &mut self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<(), ChainError> {
        if streams.is_empty() {
            return Ok(());
        }

        let message = self.codec.encode_unsubscription(streams)?;
        self.send_raw(message).await
    }

    #[instrument(skip(self), fields(service = %self.service_name))]
    async fn next_message(&mut self) -> Option<Result<C::Message, ChainError>> {
        loop {
            match self.next_raw().await {
                Some(Ok(raw_msg)) => {
                    // Skip control messages - they're handled at transport level
                    if matches!(
                        raw_msg,
                        Message::Ping(_) | Message::Pong(_) | Message::Close(_)
                    ) {
                        continue;
                    }

                    // Decode the message using the codec
                    match self.codec.decode_message(raw_msg) {
                        Ok(Some(decoded)) => return Some(Ok(decoded)),
                        Ok(None) => {} // Codec chose to ignore this message
                        Err(e) => return Some(Err(e)),
                    }
                }
                Some(Err(e)) => return Some(Err(e)),
                None => return None,
            }
        }
    }
}

/// Wrapper that adds automatic reconnection capabilities
pub struct ReconnectWs<C: WsCodec, T: WsSession<C>> {
    inner: T,
    max_reconnect_attempts: u32,
    reconnect_delay: Duration,
    auto_resubscribe: bool,
    // Subscriptions are replayed in the caller's original batches, since the
    // codec decides what may share a frame
    subscriptions: Vec<Vec<String>>,
    _codec: std::marker::PhantomData<C>,
}

impl<C: WsCodec, T: WsSession<C>> ReconnectWs<C, T> {
    /// Create a new reconnecting WebSocket wrapper
    ///
    /// # Arguments
    /// * `inner` - The underlying WebSocket session to wrap
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_millis(100),
            auto_resubscribe: true,
            subscriptions: Vec::new(),
            _codec: std::marker::PhantomData,
        }
    }

    /// Set the maximum number of reconnection attempts
    pub fn with_max_reconnect_attempts(mut self, max_attempts: u32) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self
    }

    /// Set the initial delay between reconnection attempts
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Enable or disable automatic resubscription after reconnection
    pub fn with_auto_resubscribe(mut self, auto_resubscribe: bool) -> Self {
        self.auto_resubscribe = auto_resubscribe;
        self
    }

    async fn attempt_reconnect(&mut self) -> Result<(), ChainError> {
        // Jittered exponential backoff, capped at a minute
        let base = self.reconnect_delay.as_millis().max(2) as u64;
        let mut delays = ExponentialBackoff::from_millis(2)
            .factor(base / 2)
            .max_delay(Duration::from_secs(60))
            .map(jitter);

        for attempt in 1..=self.max_reconnect_attempts {
            match self.inner.connect().await {
                Ok(()) => {
                    if self.auto_resubscribe {
                        for batch in &self.subscriptions {
                            let streams: Vec<&str> =
                                batch.iter().map(String::as_str).collect();
                            if let Err(e) = self.inner.subscribe(&streams).await {
                                warn!("Failed to resubscribe after reconnection: {}", e);
                            }
                        }
                    }
                    return Ok(());
                }
                Err(e) => {
                    error!("Reconnection attempt {} failed: {}", attempt, e);
                    if attempt < self.max_reconnect_attempts {
                        if let Some(delay) = delays.next() {
                            sleep(delay).await;
                        }
                    }
                }
            }
        }

        Err(ChainError::NetworkError(format!(
            "Failed to reconnect after {} attempts",
            self.max_reconnect_attempts
        )))
    }
}

#[async_trait]
impl<C: WsCodec, T: WsSession<C>> WsSession<C> for ReconnectWs<C, T> {
    async fn connect(&mut self) -> Result<(), ChainError> {
        self.inner.connect().await
    }

    async fn send_raw(&mut self, msg: Message) -> Result<(), ChainError> {
        if !self.inner.is_connected() {
            self.attempt_reconnect().await?;
        }
        self.inner.send_raw(msg).await
    }

    async fn next_raw(&mut self) -> Option<Result<Message, ChainError>> {
        loop {
            if !self.inner.is_connected() {
                if let Err(e) = self.attempt_reconnect().await {
                    return Some(Err(e));
                }
            }

            match self.inner.next_raw().await {
                Some(Ok(msg)) => return Some(Ok(msg)),
                Some(Err(_e)) => {
                    // Connection error, try to reconnect
                    if let Err(reconnect_err) = self.attempt_reconnect().await {
                        return Some(Err(reconnect_err));
                    }
                    // Continue the loop to try receiving again
                }
                None => {
                    // Connection closed, try to reconnect
                    if let Err(reconnect_err) = self.attempt_reconnect().await {
                        return Some(Err(reconnect_err));
                    }
                    // Continue the loop to try receiving again
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChainError> {
        self.inner.close().await
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn subscribe(
        &mut self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<(), ChainError> {
        let batch: Vec<String> = streams.iter().map(|s| s.as_ref().to_string()).collect();
        if !batch.is_empty() && !self.subscriptions.contains(&batch) {
            self.subscriptions.push(batch);
        }
        self.inner.subscribe(streams).await
    }

    async fn unsubscribe(
        &mut self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<(), ChainError> {
        let removed: Vec<String> = streams.iter().map(|s| s.as_ref().to_string()).collect();
        for batch in &mut self.subscriptions {
            batch.retain(|s| !removed.contains(s));
        }
        self.subscriptions.retain(|batch| !batch.is_empty());
        self.inner.unsubscribe(streams).await
    }

    async fn next_message(&mut self) -> Option<Result<C::Message, ChainError>> {
        loop {
            if !self.inner.is_connected() {
                if let Err(e) = self.attempt_reconnect().await {
                    return Some(Err(e));
                }
            }

            match self.inner.next_message().await {
                Some(Ok(msg)) => return Some(Ok(msg)),
                Some(Err(_e)) => {
                    // Connection error, try to reconnect
                    if let Err(reconnect_err) = self.attempt_reconnect().await {
                        return Some(Err(reconnect_err));
                    }
                    // Continue the loop to try receiving again
                }
                None => {
                    // Connection closed, try to reconnect
                    if let Err(reconnect_err) = self.attempt_reconnect().await {
                        return Some(Err(reconnect_err));
                    }
                    // Continue the loop to try receiving again
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Default)]
    struct LineCodec;

    impl WsCodec for LineCodec {
        type Message = String;

        fn encode_subscription(
            &self,
            streams: &[impl AsRef<str> + Send + Sync],
        ) -> Result<Message, ChainError> {
            let joined = streams
                .iter()
                .map(|s| s.as_ref().to_string())
                .collect::<Vec<_>>()
                .join(",");
            Ok(Message::Text(joined))
        }

        fn encode_unsubscription(
            &self,
            streams: &[impl AsRef<str> + Send + Sync],
        ) -> Result<Message, ChainError> {
            self.encode_subscription(streams)
        }

        fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, ChainError> {
            match message {
                Message::Text(text) => Ok(Some(text)),
                _ => Ok(None),
            }
        }
    }

    /// In-memory session that drops the connection a scripted number of
    /// times and records every subscribe call it sees.
    struct ScriptedSession {
        connected: bool,
        drops_left: u32,
        subscribe_calls: Vec<Vec<String>>,
    }

    impl ScriptedSession {
        fn dropping_once() -> Self {
            Self {
                connected: false,
                drops_left: 1,
                subscribe_calls: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl WsSession<LineCodec> for ScriptedSession {
        async fn connect(&mut self) -> Result<(), ChainError> {
            self.connected = true;
            Ok(())
        }

        async fn send_raw(&mut self, _msg: Message) -> Result<(), ChainError> {
            Ok(())
        }

        async fn next_raw(&mut self) -> Option<Result<Message, ChainError>> {
            if self.drops_left > 0 {
                self.drops_left -= 1;
                self.connected = false;
                return None;
            }
            Some(Ok(Message::Text("tick".to_string())))
        }

        async fn close(&mut self) -> Result<(), ChainError> {
            self.connected = false;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn subscribe(
            &mut self,
            streams: &[impl AsRef<str> + Send + Sync],
        ) -> Result<(), ChainError> {
            self.subscribe_calls
                .push(streams.iter().map(|s| s.as_ref().to_string()).collect());
            Ok(())
        }

        async fn unsubscribe(
            &mut self,
            _streams: &[impl AsRef<str> + Send + Sync],
        ) -> Result<(), ChainError> {
            Ok(())
        }

        async fn next_message(&mut self) -> Option<Result<String, ChainError>> {
            match self.next_raw().await? {
                Ok(message) => LineCodec.decode_message(message).transpose(),
                Err(e) => Some(Err(e)),
            }
        }
    }

    #[tokio::test]
    async fn reconnect_replays_each_subscription_batch() {
        let mut ws = ReconnectWs::new(ScriptedSession::dropping_once())
            .with_reconnect_delay(Duration::from_millis(1));
        ws.connect().await.unwrap();
        ws.subscribe(&["trades:AAA_BNB"]).await.unwrap();
        ws.subscribe(&["kline_1h:AAA_BNB"]).await.unwrap();

        // The first receive hits the scripted drop; the wrapper reconnects
        // and replays both batches before delivering the next message.
        let message = ws.next_message().await.unwrap().unwrap();
        assert_eq!(message, "tick");

        let calls = &ws.inner.subscribe_calls;
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2], vec!["trades:AAA_BNB"]);
        assert_eq!(calls[3], vec!["kline_1h:AAA_BNB"]);
    }

    #[tokio::test]
    async fn unsubscribe_prunes_replay_batches() {
        let mut ws = ReconnectWs::new(ScriptedSession::dropping_once());
        ws.connect().await.unwrap();
        ws.subscribe(&["trades:AAA_BNB"]).await.unwrap();
        ws.subscribe(&["orders:addr1"]).await.unwrap();
        ws.unsubscribe(&["trades:AAA_BNB"]).await.unwrap();

        assert_eq!(ws.subscriptions, vec![vec!["orders:addr1".to_string()]]);
    }

    #[tokio::test]
    async fn duplicate_batches_are_kept_once() {
        let mut ws = ReconnectWs::new(ScriptedSession::dropping_once());
        ws.connect().await.unwrap();
        ws.subscribe(&["ticker:AAA_BNB"]).await.unwrap();
        ws.subscribe(&["ticker:AAA_BNB"]).await.unwrap();

        assert_eq!(ws.subscriptions.len(), 1);
    }
}
