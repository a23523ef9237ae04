use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

const PROD_API_URL: &str = "https://dex.binance.org";
const PROD_WSS_URL: &str = "wss://dex.binance.org/api/";
const PROD_HRP: &str = "bnb";

const TESTNET_API_URL: &str = "https://testnet-dex.binance.org";
const TESTNET_WSS_URL: &str = "wss://testnet-dex.binance.org/api/";
const TESTNET_HRP: &str = "tbnb";

/// Network endpoints and the bech32 address prefix for one chain deployment.
///
/// Wallets remember the environment they were created for, and broadcast
/// refuses to submit a transaction through a client bound to a different one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainEnv {
    pub api_url: String,
    pub wss_url: String,
    pub hrp: String,
}

impl ChainEnv {
    /// Mainnet endpoints (`bnb` address prefix).
    #[must_use]
    pub fn production() -> Self {
        Self {
            api_url: PROD_API_URL.to_string(),
            wss_url: PROD_WSS_URL.to_string(),
            hrp: PROD_HRP.to_string(),
        }
    }

    /// Public testnet endpoints (`tbnb` address prefix).
    #[must_use]
    pub fn testnet() -> Self {
        Self {
            api_url: TESTNET_API_URL.to_string(),
            wss_url: TESTNET_WSS_URL.to_string(),
            hrp: TESTNET_HRP.to_string(),
        }
    }

    /// Custom deployment (local node, mirror, private chain).
    #[must_use]
    pub fn custom(api_url: String, wss_url: String, hrp: String) -> Self {
        Self {
            api_url,
            wss_url,
            hrp,
        }
    }

    #[must_use]
    pub fn is_testnet(&self) -> bool {
        self.hrp == TESTNET_HRP
    }
}

impl Default for ChainEnv {
    fn default() -> Self {
        Self::production()
    }
}

#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub private_key: Option<Secret<String>>,
    pub mnemonic: Option<Secret<String>>,
    pub testnet: bool,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for WalletConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("WalletConfig", 3)?;
        state.serialize_field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))?;
        state.serialize_field("mnemonic", &self.mnemonic.as_ref().map(|_| "[REDACTED]"))?;
        state.serialize_field("testnet", &self.testnet)?;
        state.end()
    }
}

// Custom Deserialize implementation
impl<'de> Deserialize<'de> for WalletConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct WalletConfigHelper {
            private_key: Option<String>,
            mnemonic: Option<String>,
            #[serde(default)]
            testnet: bool,
        }

        let helper = WalletConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            private_key: helper.private_key.map(Secret::new),
            mnemonic: helper.mnemonic.map(Secret::new),
            testnet: helper.testnet,
        })
    }
}

impl WalletConfig {
    /// Create a configuration around a hex-encoded secp256k1 private key
    #[must_use]
    pub fn from_private_key(private_key: String) -> Self {
        Self {
            private_key: Some(Secret::new(private_key)),
            mnemonic: None,
            testnet: false,
        }
    }

    /// Create a configuration around a BIP-39 mnemonic phrase
    #[must_use]
    pub fn from_mnemonic(mnemonic: String) -> Self {
        Self {
            private_key: None,
            mnemonic: Some(Secret::new(mnemonic)),
            testnet: false,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `BNBCHAIN_PRIVATE_KEY` (hex private key) or `BNBCHAIN_MNEMONIC`
    ///   (BIP-39 phrase); at least one must be set
    /// - `BNBCHAIN_TESTNET` (optional, defaults to false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let private_key = env::var("BNBCHAIN_PRIVATE_KEY").ok();
        let mnemonic = env::var("BNBCHAIN_MNEMONIC").ok();

        if private_key.is_none() && mnemonic.is_none() {
            return Err(ConfigError::MissingEnvironmentVariable(
                "BNBCHAIN_PRIVATE_KEY or BNBCHAIN_MNEMONIC".to_string(),
            ));
        }

        let testnet = env::var("BNBCHAIN_TESTNET")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        Ok(Self {
            private_key: private_key.map(Secret::new),
            mnemonic: mnemonic.map(Secret::new),
            testnet,
        })
    }

    /// Create configuration from .env file and environment variables
    ///
    /// This method first loads environment variables from a .env file (if it exists),
    /// then reads the configuration using the standard environment variable names.
    ///
    ///
    /// **Security Warning**: Never commit .env files to version control!
    /// Add .env to your .gitignore file.
    #[cfg(feature = "env-file")]
    pub fn from_env_file() -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(".env")
    }

    /// Create configuration from a specific .env file path
    ///
    /// This allows you to specify a custom path for your environment file.
    /// Useful for different environments (e.g., .env.development, .env.production)
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(env_file_path: &str) -> Result<Self, ConfigError> {
        // Load .env file if it exists
        match dotenv::from_path(env_file_path) {
            Ok(_) => {
                // .env file loaded successfully
            }
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // .env file doesn't exist, that's okay - continue with system env vars
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        // Now load from environment variables (which may include those from .env)
        Self::from_env()
    }

    /// Load configuration with automatic .env file detection
    ///
    /// This method tries multiple common .env file names in order:
    /// 1. .env.local (highest priority)
    /// 2. .env.{environment} (if ENVIRONMENT is set)
    /// 3. .env (default)
    ///
    /// Falls back to system environment variables if no .env files are found.
    #[cfg(feature = "env-file")]
    pub fn from_env_auto() -> Result<Self, ConfigError> {
        let env_files = [
            ".env.local",
            &format!(
                ".env.{}",
                env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
            ),
            ".env",
        ];

        for env_file in &env_files {
            match dotenv::from_path(env_file) {
                Ok(_) => {
                    break; // Load only the first file found
                }
                Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                    // File doesn't exist, try next
                }
                Err(e) => {
                    return Err(ConfigError::InvalidConfiguration(format!(
                        "Failed to load .env file '{}': {}",
                        env_file, e
                    )));
                }
            }
        }

        // Load from environment variables
        Self::from_env()
    }

    /// Check if this configuration carries any key material
    #[must_use]
    pub fn has_key(&self) -> bool {
        self.private_key.is_some() || self.mnemonic.is_some()
    }

    /// Set testnet mode
    #[must_use]
    pub const fn testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// The chain environment this configuration selects
    #[must_use]
    pub fn env(&self) -> ChainEnv {
        if self.testnet {
            ChainEnv::testnet()
        } else {
            ChainEnv::production()
        }
    }

    /// Get the hex private key (use carefully - exposes secret)
    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_ref().map(|s| s.expose_secret().as_str())
    }

    /// Get the mnemonic phrase (use carefully - exposes secret)
    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_ref().map(|s| s.expose_secret().as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
