/// Transport kernel - shared plumbing for every chain-facing client
///
/// This module provides a unified transport layer for both REST and
/// WebSocket communication with the chain's public services. The kernel
/// follows strict separation of concerns: it contains only transport logic
/// and generic interfaces, and knows nothing about the exchange API's
/// response envelopes, the node RPC protocol, or transaction encoding.
/// Those live in the `dex`, `node` and `chain` modules built on top of it.
///
/// # Architecture
///
/// The kernel is organized around three main components:
///
/// ## Transport Layer
/// - `RestClient`: Unified HTTP client interface
/// - `WsSession`: WebSocket connection management
/// - `ReconnectWs`: Automatic reconnection wrapper
///
/// ## Message Handling
/// - `WsCodec`: Stream-specific message encoding/decoding
///
/// ## Throttling
/// - `RestClientBuilder::with_rate_limit`: client-side quota against the
///   public API's per-IP limits
///
/// There is no request-signing layer: the chain's HTTP services are open,
/// and transactions authenticate themselves through their embedded
/// signatures (see `crate::chain`).
///
/// # Real-World Usage Examples
///
/// ## Basic REST access
/// ```rust,no_run
/// use bnbchain::core::kernel::{RestClient, RestClientBuilder, RestClientConfig};
/// use serde_json::Value;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest_config = RestClientConfig::new(
///     "https://dex.binance.org/api/v1".to_string(),
///     "dex".to_string(),
/// );
/// let rest = RestClientBuilder::new(rest_config).build()?;
///
/// // Use typed responses for zero-copy deserialization
/// let time: Value = rest.get_json("/time", &[]).await?;
/// # Ok(())
/// # }
/// ```
///
/// ## WebSocket Integration with Codec
/// ```rust,no_run
/// use bnbchain::core::kernel::TungsteniteWs;
/// use bnbchain::stream::DexCodec;
///
/// # async fn websocket_example() -> Result<(), Box<dyn std::error::Error>> {
/// // Create the stream codec
/// let codec = DexCodec;
/// let ws = TungsteniteWs::new(
///     "wss://dex.binance.org/api/ws".to_string(),
///     "dex-stream".to_string(),
///     codec,
/// );
///
/// // Subscribe to streams
/// let streams = ["marketDepth:BNB_BTC.B-918"];
/// // Note: In a real implementation, you'd call ws.subscribe(&streams).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Performance Notes
///
/// - **Zero-copy deserialization**: `get_json<T>()` eliminates intermediate `serde_json::Value` allocations
/// - **Connection pooling**: Automatic HTTP connection reuse via reqwest
/// - **Tracing integration**: Minimal overhead observability with structured logging
///
/// # Common Patterns
///
/// ## Error Handling
/// ```rust,no_run
/// use bnbchain::core::errors::ChainError;
/// use bnbchain::core::kernel::RestClient;
/// use serde_json::Value;
/// use tracing::instrument;
///
/// struct MarketClient<R: RestClient> {
///     rest: R,
/// }
///
/// impl<R: RestClient> MarketClient<R> {
///     #[instrument(skip(self), fields(symbol = %symbol))]
///     async fn get_depth(&self, symbol: &str) -> Result<Value, ChainError> {
///         let params = [("symbol", symbol)];
///         self.rest.get("/depth", &params).await
///     }
/// }
/// ```
pub mod codec;
pub mod rest;
pub mod ws;

// Re-export key types for convenience
pub use codec::WsCodec;
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use ws::{ReconnectWs, TungsteniteWs, WsConfig, WsSession};
