use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API error: {code} - {message}")]
    ApiError { code: i32, message: String },

    #[error("RPC error {code}: {message}")]
    RpcError { code: i64, message: String, data: Option<String> },

    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    #[error("Wallet account state not initialized: {0}")]
    UninitializedAccount(String),

    #[error("Signing failed: {0}")]
    SigningFailure(String),

    #[error("Encoding invariant violated: {0}")]
    EncodingInvariantViolation(String),

    #[error("Environment mismatch: {0}")]
    EnvironmentMismatch(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Websocket error: {0}")]
    WebSocketError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("Other error: {0}")]
    Other(String),
}

impl ChainError {
    /// True when the failure is transient and the call can be retried as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError(_) | Self::ConnectionTimeout | Self::HttpError(_)
        )
    }
}
