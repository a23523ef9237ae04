//! Wallets: key material, the derived on-chain identity, and signing.
//!
//! A [`Wallet`] owns a secp256k1 private key plus the mutable account state
//! (account number, sequence, chain id) that every signed transaction embeds.
//! Key material never leaves the struct; `Debug` and serialization surfaces
//! only show the public identity.
//!
//! Transaction bytes depend on the wallet's current sequence, and the chain
//! requires sequences to arrive in order without gaps. A wallet must
//! therefore sign and broadcast one transaction at a time; callers running
//! concurrent submissions own the serialization (a mutex or a single-consumer
//! queue around the wallet).

use std::fmt;

use bip32::{DerivationPath, Mnemonic, XPrv};
use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, SignOnly};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::chain::address::{encode_address, public_key_hash, ADDRESS_LEN};
use crate::core::config::{ChainEnv, WalletConfig};
use crate::core::errors::ChainError;

/// BIP-44 derivation path for chain accounts (coin type 714).
pub const HD_PATH: &str = "m/44'/714'/0'/0/0";

/// Account coordinates fetched from the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub account_number: i64,
    pub sequence: i64,
}

/// A source of on-chain account state.
///
/// [`DexClient`](crate::dex::DexClient) implements this against the
/// `/account/{address}` and `/node-info` endpoints; tests substitute fixed
/// values.
#[async_trait::async_trait]
pub trait AccountSource: Send + Sync {
    /// Current account number and sequence for `address`.
    async fn account_snapshot(&self, address: &str) -> Result<AccountSnapshot, ChainError>;

    /// Network identifier of the chain the source talks to.
    async fn chain_id(&self) -> Result<String, ChainError>;
}

/// A signing identity bound to one chain environment.
#[derive(Clone)]
pub struct Wallet {
    secret: SecretKey,
    public_key: PublicKey,
    address: String,
    address_hash: [u8; ADDRESS_LEN],
    env: ChainEnv,
    account_number: Option<i64>,
    sequence: Option<i64>,
    chain_id: Option<String>,
    secp: Secp256k1<SignOnly>,
}

impl Wallet {
    /// Import a hex-encoded secp256k1 private key.
    pub fn from_private_key(private_key_hex: &str, env: ChainEnv) -> Result<Self, ChainError> {
        let mut raw = hex::decode(private_key_hex.trim()).map_err(|e| {
            ChainError::InvalidParameters(format!("private key is not valid hex: {e}"))
        })?;
        let secret = SecretKey::from_slice(&raw)
            .map_err(|e| ChainError::InvalidParameters(format!("rejected private key: {e}")));
        raw.zeroize();
        Self::from_secret_key(secret?, env)
    }

    /// Recover a wallet from a BIP-39 English mnemonic phrase.
    ///
    /// The key is derived at [`HD_PATH`] with an empty passphrase, matching
    /// the chain's reference wallets.
    pub fn from_mnemonic(phrase: &str, env: ChainEnv) -> Result<Self, ChainError> {
        let mnemonic = Mnemonic::new(phrase.trim(), Default::default())
            .map_err(|e| ChainError::InvalidParameters(format!("invalid mnemonic: {e}")))?;
        let seed = mnemonic.to_seed("");
        let path: DerivationPath = HD_PATH
            .parse()
            .map_err(|e| ChainError::SigningFailure(format!("derivation path rejected: {e}")))?;
        let xprv = XPrv::derive_from_path(&seed, &path)
            .map_err(|e| ChainError::SigningFailure(format!("key derivation failed: {e}")))?;
        let mut key_bytes: [u8; 32] = xprv.private_key().to_bytes().into();
        let secret = SecretKey::from_slice(&key_bytes)
            .map_err(|e| ChainError::SigningFailure(format!("derived key rejected: {e}")));
        key_bytes.zeroize();
        Self::from_secret_key(secret?, env)
    }

    /// Create a wallet from a freshly generated 24-word mnemonic.
    ///
    /// The phrase is returned alongside the wallet; it is the only way to
    /// recover the key, so the caller must store it.
    pub fn generate(env: ChainEnv) -> Result<(Self, String), ChainError> {
        let mnemonic = Mnemonic::random(&mut OsRng, Default::default());
        let phrase = mnemonic.phrase().to_string();
        let wallet = Self::from_mnemonic(&phrase, env)?;
        Ok((wallet, phrase))
    }

    /// Build a wallet from a [`WalletConfig`], preferring the raw key when
    /// both it and a mnemonic are present.
    pub fn from_config(config: &WalletConfig) -> Result<Self, ChainError> {
        let env = config.env();
        if let Some(key) = config.private_key() {
            Self::from_private_key(key, env)
        } else if let Some(phrase) = config.mnemonic() {
            Self::from_mnemonic(phrase, env)
        } else {
            Err(ChainError::InvalidParameters(
                "wallet configuration carries no key material".to_string(),
            ))
        }
    }

    fn from_secret_key(secret: SecretKey, env: ChainEnv) -> Result<Self, ChainError> {
        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, &secret);
        let address_hash = public_key_hash(&public_key.serialize());
        let address = encode_address(&env.hrp, &address_hash)?;
        Ok(Self {
            secret,
            public_key,
            address,
            address_hash,
            env,
            account_number: None,
            sequence: None,
            chain_id: None,
            secp,
        })
    }

    /// Bech32 address under this wallet's environment prefix.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// 20-byte hash the address encodes.
    pub const fn address_hash(&self) -> &[u8; ADDRESS_LEN] {
        &self.address_hash
    }

    pub const fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Compressed SEC1 public key (33 bytes).
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.serialize()
    }

    pub const fn env(&self) -> &ChainEnv {
        &self.env
    }

    pub const fn account_number(&self) -> Option<i64> {
        self.account_number
    }

    pub const fn sequence(&self) -> Option<i64> {
        self.sequence
    }

    pub fn chain_id(&self) -> Option<&str> {
        self.chain_id.as_deref()
    }

    pub fn set_account_number(&mut self, account_number: i64) {
        self.account_number = Some(account_number);
    }

    pub fn set_sequence(&mut self, sequence: i64) {
        self.sequence = Some(sequence);
    }

    pub fn set_chain_id(&mut self, chain_id: String) {
        self.chain_id = Some(chain_id);
    }

    /// Advance the local sequence counter after an accepted broadcast.
    pub fn increment_sequence(&mut self) {
        if let Some(sequence) = self.sequence.as_mut() {
            *sequence += 1;
        }
    }

    /// Walk the sequence counter back after a broadcast the chain rejected.
    pub fn decrement_sequence(&mut self) {
        if let Some(sequence) = self.sequence.as_mut() {
            *sequence -= 1;
        }
    }

    pub(crate) fn require_account_number(&self) -> Result<i64, ChainError> {
        self.account_number.ok_or_else(|| {
            ChainError::UninitializedAccount(
                "account number is unknown; sync the wallet first".to_string(),
            )
        })
    }

    pub(crate) fn require_sequence(&self) -> Result<i64, ChainError> {
        self.sequence.ok_or_else(|| {
            ChainError::UninitializedAccount(
                "sequence is unknown; sync the wallet first".to_string(),
            )
        })
    }

    /// Fill in any missing account fields from `source`.
    ///
    /// Known values are kept, so this is cheap to call before every signing
    /// operation.
    pub async fn sync<S>(&mut self, source: &S) -> Result<(), ChainError>
    where
        S: AccountSource + ?Sized,
    {
        if self.account_number.is_none() || self.sequence.is_none() {
            let snapshot = source.account_snapshot(&self.address).await?;
            self.account_number.get_or_insert(snapshot.account_number);
            self.sequence.get_or_insert(snapshot.sequence);
        }
        if self.chain_id.is_none() {
            self.chain_id = Some(source.chain_id().await?);
        }
        Ok(())
    }

    /// Re-fetch account state, discarding cached values.
    ///
    /// Use after a broadcast failure that may have left the local sequence
    /// counter out of step with the chain.
    pub async fn refresh<S>(&mut self, source: &S) -> Result<AccountSnapshot, ChainError>
    where
        S: AccountSource + ?Sized,
    {
        let snapshot = source.account_snapshot(&self.address).await?;
        self.account_number = Some(snapshot.account_number);
        self.sequence = Some(snapshot.sequence);
        Ok(snapshot)
    }

    /// Order id the chain will assign to this wallet's next order:
    /// upper-case hex of the address hash, a dash, then `sequence + 1`.
    pub fn generate_order_id(&self) -> Result<String, ChainError> {
        let sequence = self.require_sequence()?;
        Ok(format!(
            "{}-{}",
            hex::encode_upper(self.address_hash),
            sequence + 1
        ))
    }

    /// Sign an arbitrary payload, returning the 64-byte compact signature.
    ///
    /// The payload is hashed with SHA-256 and signed with deterministic
    /// ECDSA (RFC 6979), so signing the same bytes twice yields identical
    /// output.
    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let digest: [u8; 32] = Sha256::digest(payload).into();
        let message = Message::from_digest(digest);
        self.secp
            .sign_ecdsa(&message, &self.secret)
            .serialize_compact()
            .to_vec()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("env", &self.env)
            .field("account_number", &self.account_number)
            .field("sequence", &self.sequence)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN_KEY: &str = "3dcc267e1f7edca86e03f0963b2d0b7804552d3014caddcfc435a4d7bc240cf5";
    const KNOWN_PUBLIC_KEY: &str =
        "02cce2ee4e37dc8c65d6445c966faf31ebfe578a90695138947ee7cab8ae9a2c08";
    const KNOWN_ADDRESS: &str = "tbnb10a6kkxlf823w9lwr6l9hzw4uyphcw7qzrud5rr";
    const KNOWN_MNEMONIC: &str = "smart depend recycle toward already roof country frost field \
         dose joke zero start notable vote eight symptom suffer camp milk dream swear wrap \
         accident";

    fn known_wallet() -> Wallet {
        Wallet::from_private_key(KNOWN_KEY, ChainEnv::testnet()).unwrap()
    }

    struct FixedSource;

    #[async_trait::async_trait]
    impl AccountSource for FixedSource {
        async fn account_snapshot(&self, _address: &str) -> Result<AccountSnapshot, ChainError> {
            Ok(AccountSnapshot {
                account_number: 23_452,
                sequence: 2,
            })
        }

        async fn chain_id(&self) -> Result<String, ChainError> {
            Ok("Binance-Chain-Ganges".to_string())
        }
    }

    #[test]
    fn known_private_key_derives_published_identity() {
        let wallet = known_wallet();
        assert_eq!(hex::encode(wallet.public_key_bytes()), KNOWN_PUBLIC_KEY);
        assert_eq!(wallet.address(), KNOWN_ADDRESS);
        assert_eq!(
            hex::encode(wallet.address_hash()),
            "7f756b1be93aa2e2fdc3d7cb713abc206f877802"
        );
    }

    #[test]
    fn mnemonic_derives_same_key_as_raw_import() {
        let from_phrase = Wallet::from_mnemonic(KNOWN_MNEMONIC, ChainEnv::testnet()).unwrap();
        assert_eq!(from_phrase.address(), known_wallet().address());
        assert_eq!(
            from_phrase.public_key_bytes(),
            known_wallet().public_key_bytes()
        );
    }

    #[test]
    fn environment_prefix_selects_address_form() {
        let mainnet = Wallet::from_private_key(KNOWN_KEY, ChainEnv::production()).unwrap();
        assert!(mainnet.address().starts_with("bnb1"));
        assert_ne!(mainnet.address(), KNOWN_ADDRESS);
        assert_eq!(mainnet.address_hash(), known_wallet().address_hash());
    }

    #[test]
    fn order_id_uses_upper_hash_and_next_sequence() {
        let mut wallet = known_wallet();
        assert!(matches!(
            wallet.generate_order_id(),
            Err(ChainError::UninitializedAccount(_))
        ));

        wallet.set_sequence(2);
        assert_eq!(
            wallet.generate_order_id().unwrap(),
            "7F756B1BE93AA2E2FDC3D7CB713ABC206F877802-3"
        );

        wallet.increment_sequence();
        assert_eq!(wallet.sequence(), Some(3));

        wallet.decrement_sequence();
        assert_eq!(wallet.sequence(), Some(2));
    }

    #[test]
    fn signing_is_deterministic() {
        let wallet = known_wallet();
        let first = wallet.sign(b"payload");
        let second = wallet.sign(b"payload");
        assert_eq!(first.len(), 64);
        assert_eq!(first, second);
        assert_ne!(first, wallet.sign(b"other payload"));
    }

    #[test]
    fn generated_wallet_round_trips_through_its_phrase() {
        let (wallet, phrase) = Wallet::generate(ChainEnv::testnet()).unwrap();
        assert_eq!(phrase.split_whitespace().count(), 24);
        let recovered = Wallet::from_mnemonic(&phrase, ChainEnv::testnet()).unwrap();
        assert_eq!(recovered.address(), wallet.address());
    }

    #[test]
    fn rejects_malformed_key_material() {
        assert!(matches!(
            Wallet::from_private_key("not hex", ChainEnv::testnet()),
            Err(ChainError::InvalidParameters(_))
        ));
        assert!(matches!(
            Wallet::from_private_key("abcd", ChainEnv::testnet()),
            Err(ChainError::InvalidParameters(_))
        ));
        assert!(matches!(
            Wallet::from_mnemonic("one two three", ChainEnv::testnet()),
            Err(ChainError::InvalidParameters(_))
        ));
    }

    #[test]
    fn debug_output_hides_key_material() {
        let rendered = format!("{:?}", known_wallet());
        assert!(rendered.contains(KNOWN_ADDRESS));
        assert!(!rendered.contains("3dcc267e"));
    }

    #[tokio::test]
    async fn sync_fills_missing_fields_only() {
        let mut wallet = known_wallet();
        wallet.set_sequence(9);
        wallet.sync(&FixedSource).await.unwrap();
        assert_eq!(wallet.account_number(), Some(23_452));
        assert_eq!(wallet.sequence(), Some(9));
        assert_eq!(wallet.chain_id(), Some("Binance-Chain-Ganges"));
    }

    #[tokio::test]
    async fn refresh_overwrites_cached_state() {
        let mut wallet = known_wallet();
        wallet.set_sequence(9);
        let snapshot = wallet.refresh(&FixedSource).await.unwrap();
        assert_eq!(snapshot.sequence, 2);
        assert_eq!(wallet.sequence(), Some(2));
        assert_eq!(wallet.account_number(), Some(23_452));
    }
}
