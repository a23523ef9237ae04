use crate::core::errors::ChainError;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tracing::{instrument, trace};

/// REST client trait for making HTTP requests
///
/// This trait provides a unified interface for HTTP operations against the
/// chain's public HTTP services. The chain API carries no request
/// authentication; transactions authenticate themselves through their
/// embedded signatures, so there is no signer plumbing here.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Make a GET request
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `query_params` - Query parameters as key-value pairs
    ///
    /// # Returns
    /// The response body as a JSON value
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Value, ChainError>;

    /// Make a GET request with strongly-typed response
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `query_params` - Query parameters as key-value pairs
    ///
    /// # Returns
    /// The response body deserialized to the specified type
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<T, ChainError>;

    /// Make a POST request with a JSON body
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `body` - Request body as JSON value
    ///
    /// # Returns
    /// The response body as a JSON value
    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value, ChainError>;

    /// Make a POST request with a plain-text body
    ///
    /// The broadcast endpoint takes the hex transaction as `text/plain`
    /// rather than JSON.
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `query_params` - Query parameters as key-value pairs
    /// * `body` - Request body sent verbatim
    ///
    /// # Returns
    /// The response body as a JSON value
    async fn post_text(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: String,
    ) -> Result<Value, ChainError>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Service name for logging and tracing
    pub service_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum number of retries for failed idempotent requests
    pub max_retries: u32,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    /// Create a new configuration
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    /// * `service_name` - Name of the service for logging
    pub fn new(base_url: String, service_name: String) -> Self {
        Self {
            base_url,
            service_name,
            timeout_seconds: 30,
            max_retries: 3,
            user_agent: "bnbchain-rs/0.1".to_string(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl RestClientBuilder {
    /// Create a new builder with the given configuration
    ///
    /// # Arguments
    /// * `config` - Configuration for the REST client
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            limiter: None,
        }
    }

    /// Throttle outgoing requests to the given quota
    ///
    /// The public API endpoints enforce per-IP rate limits; a client-side
    /// quota keeps a busy caller below them instead of eating 429s.
    pub fn with_rate_limit(mut self, quota: Quota) -> Self {
        self.limiter = Some(Arc::new(RateLimiter::direct(quota)));
        self
    }

    /// Build the REST client
    ///
    /// # Returns
    /// A new `ReqwestRest` instance
    pub fn build(self) -> Result<ReqwestRest, ChainError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| ChainError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            limiter: self.limiter,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("rate_limited", &self.limiter.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    /// Create a new `ReqwestRest` instance with default settings
    ///
    /// # Arguments
    /// * `base_url` - Base URL for the API
    /// * `service_name` - Name of the service for logging
    ///
    /// # Returns
    /// A new `ReqwestRest` instance
    pub fn new(base_url: String, service_name: String) -> Result<Self, ChainError> {
        let config = RestClientConfig::new(base_url, service_name);
        RestClientBuilder::new(config).build()
    }

    /// Build the full URL for an endpoint
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    /// Handle the response and extract JSON
    #[instrument(skip(self, response), fields(service = %self.config.service_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<Value, ChainError> {
        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            ChainError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", response_text);

        if status.is_success() {
            serde_json::from_str(&response_text).map_err(|e| {
                ChainError::DeserializationError(format!("Failed to parse JSON response: {}", e))
            })
        } else {
            Err(ChainError::ApiError {
                code: status.as_u16() as i32,
                message: response_text,
            })
        }
    }

    /// Send a single request without retrying
    async fn send_once(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<&RequestBody>,
    ) -> Result<Value, ChainError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let url = self.build_url(endpoint);
        let mut request = self.client.request(method, &url);

        for (key, value) in query_params {
            request = request.query(&[(key, value)]);
        }

        match body {
            Some(RequestBody::Json(value)) => {
                let bytes = serde_json::to_vec(value).map_err(|e| {
                    ChainError::SerializationError(format!(
                        "Failed to serialize request body: {}",
                        e
                    ))
                })?;
                request = request
                    .header("Content-Type", "application/json")
                    .body(bytes);
            }
            Some(RequestBody::Text(text)) => {
                request = request
                    .header("Content-Type", "text/plain")
                    .body(text.clone());
            }
            None => {}
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChainError::NetworkError(format!("Request failed: {}", e)))?;

        self.handle_response(response).await
    }

    /// Make a request, retrying transient failures of idempotent methods
    ///
    /// Only GETs are retried. A broadcast POST that timed out may still have
    /// reached the chain, so replaying it is never safe here.
    #[instrument(skip(self, body), fields(service = %self.config.service_name, endpoint = %endpoint))]
    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<RequestBody>,
    ) -> Result<Value, ChainError> {
        let retries = if method == Method::GET {
            self.config.max_retries
        } else {
            0
        };
        let mut delays = ExponentialBackoff::from_millis(2)
            .factor(250)
            .map(jitter)
            .take(retries as usize);

        loop {
            match self
                .send_once(method.clone(), endpoint, query_params, body.as_ref())
                .await
            {
                Err(e) if e.is_retryable() => match delays.next() {
                    Some(delay) => {
                        trace!("Retrying after transient failure: {}", e);
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
                other => return other,
            }
        }
    }
}

enum RequestBody {
    Json(Value),
    Text(String),
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, query_params), fields(service = %self.config.service_name, endpoint = %endpoint, param_count = query_params.len()))]
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<Value, ChainError> {
        self.make_request(Method::GET, endpoint, query_params, None)
            .await
    }

    #[instrument(skip(self, query_params), fields(service = %self.config.service_name, endpoint = %endpoint, param_count = query_params.len()))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> Result<T, ChainError> {
        self.make_request(Method::GET, endpoint, query_params, None)
            .await
            .and_then(|value| {
                serde_json::from_value(value).map_err(|e| {
                    ChainError::DeserializationError(format!("Failed to deserialize JSON: {}", e))
                })
            })
    }

    #[instrument(skip(self, body), fields(service = %self.config.service_name, endpoint = %endpoint))]
    async fn post_json(&self, endpoint: &str, body: &Value) -> Result<Value, ChainError> {
        self.make_request(
            Method::POST,
            endpoint,
            &[],
            Some(RequestBody::Json(body.clone())),
        )
        .await
    }

    #[instrument(skip(self, body), fields(service = %self.config.service_name, endpoint = %endpoint))]
    async fn post_text(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: String,
    ) -> Result<Value, ChainError> {
        self.make_request(
            Method::POST,
            endpoint,
            query_params,
            Some(RequestBody::Text(body)),
        )
        .await
    }
}
