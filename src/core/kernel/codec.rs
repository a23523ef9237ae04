use crate::core::errors::ChainError;
use tokio_tungstenite::tungstenite::Message;

/// Codec trait for converting between raw WebSocket frames and typed stream
/// events
///
/// The transport (`WsSession` implementations) stays format-agnostic; a codec
/// owns the subscribe/unsubscribe frame layout and the event parsing for one
/// wire protocol.
pub trait WsCodec: Send + Sync + 'static {
    /// The type representing parsed messages from this stream
    type Message: Send + Sync;

    /// Encode a subscription request into a WebSocket message
    ///
    /// # Arguments
    /// * `streams` - The stream identifiers to subscribe to
    ///
    /// # Returns
    /// A WebSocket message ready to be sent to the server
    fn encode_subscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<Message, ChainError>;

    /// Encode an unsubscription request into a WebSocket message
    ///
    /// # Arguments
    /// * `streams` - The stream identifiers to unsubscribe from
    ///
    /// # Returns
    /// A WebSocket message ready to be sent to the server
    fn encode_unsubscription(
        &self,
        streams: &[impl AsRef<str> + Send + Sync],
    ) -> Result<Message, ChainError>;

    /// Decode a raw WebSocket message into a typed message
    ///
    /// This method should only handle data messages. Control messages (ping, pong, close)
    /// are handled at the transport level.
    ///
    /// # Arguments
    /// * `message` - The raw WebSocket message to decode
    ///
    /// # Returns
    /// - `Ok(Some(message))` - Successfully decoded message
    /// - `Ok(None)` - Message was ignored/filtered by codec
    /// - `Err(error)` - Failed to decode message
    fn decode_message(&self, message: Message) -> Result<Option<Self::Message>, ChainError>;
}
