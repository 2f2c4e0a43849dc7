//! Addresses and Ed25519 wallets.

use crate::error::{Result, TokenError};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address (base58-encoded Ed25519 public key).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address from a base58-encoded string.
    ///
    /// # Errors
    ///
    /// Returns error if the string is not valid base58 or wrong length.
    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TokenError::invalid_address(format!("invalid base58: {e}")))?;

        if bytes.len() != 32 {
            return Err(TokenError::invalid_address(format!(
                "address must be 32 bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self(s.to_string()))
    }

    /// Create an address from raw public key bytes.
    ///
    /// # Errors
    ///
    /// Returns error if bytes are not 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(TokenError::invalid_address(format!(
                "address must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bs58::encode(bytes).into_string()))
    }

    /// Get the base58-encoded address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the address into an Ed25519 verifying key.
    ///
    /// # Errors
    ///
    /// Returns error if the address is not a valid public key.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        let bytes = bs58::decode(&self.0)
            .into_vec()
            .map_err(|e| TokenError::invalid_address(format!("invalid base58: {e}")))?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TokenError::invalid_address("address must be 32 bytes"))?;
        VerifyingKey::from_bytes(&array)
            .map_err(|e| TokenError::invalid_address(format!("not a valid public key: {e}")))
    }

    /// Check that `signature` over `message` was produced by this address's key.
    #[must_use]
    pub fn verifies(&self, message: &[u8], signature: &Signature) -> bool {
        self.verifying_key()
            .is_ok_and(|key| key.verify_strict(message, signature).is_ok())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An Ed25519 keypair controlling one address.
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Generate a new random wallet from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns error if the derived address is malformed.
    pub fn generate() -> Result<Self> {
        let mut secret_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut secret_bytes);
        Self::from_signing_key(SigningKey::from_bytes(&secret_bytes))
    }

    /// Create a wallet from a secret key (32 bytes).
    ///
    /// # Errors
    ///
    /// Returns error if the key is invalid.
    pub fn from_secret_key(secret: &[u8]) -> Result<Self> {
        let secret_array: [u8; 32] = secret.try_into().map_err(|_| TokenError::WalletError {
            message: format!("secret key must be 32 bytes, got {}", secret.len()),
        })?;
        Self::from_signing_key(SigningKey::from_bytes(&secret_array))
    }

    /// Create a wallet from a base58-encoded secret key.
    ///
    /// # Errors
    ///
    /// Returns error if the key is invalid.
    pub fn from_base58_secret(secret: &str) -> Result<Self> {
        let bytes = bs58::decode(secret)
            .into_vec()
            .map_err(|e| TokenError::WalletError {
                message: format!("invalid base58: {e}"),
            })?;
        Self::from_secret_key(&bytes)
    }

    fn from_signing_key(signing_key: SigningKey) -> Result<Self> {
        let address = Address::from_bytes(signing_key.verifying_key().as_bytes())?;
        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Get the wallet address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Get the secret key as base58.
    #[must_use]
    pub fn secret_key_base58(&self) -> String {
        bs58::encode(self.signing_key.as_bytes()).into_string()
    }

    /// Sign a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_wallet() {
        let wallet = Wallet::generate().expect("should generate");
        assert!(!wallet.address().as_str().is_empty());
    }

    #[test]
    fn test_address_roundtrip() {
        let wallet = Wallet::generate().expect("should generate");
        let parsed = Address::from_base58(wallet.address().as_str()).expect("should parse");
        assert_eq!(wallet.address(), &parsed);
    }

    #[test]
    fn test_base58_secret_roundtrip() {
        let wallet1 = Wallet::generate().expect("should generate");
        let wallet2 =
            Wallet::from_base58_secret(&wallet1.secret_key_base58()).expect("should create");
        assert_eq!(wallet1.address(), wallet2.address());
    }

    #[test]
    fn test_address_verifies_own_signature() {
        let wallet = Wallet::generate().expect("should generate");
        let other = Wallet::generate().expect("should generate");
        let signature = wallet.sign(b"listing");

        assert!(wallet.address().verifies(b"listing", &signature));
        assert!(!wallet.address().verifies(b"tampered", &signature));
        assert!(!other.address().verifies(b"listing", &signature));
    }

    #[test]
    fn test_invalid_address() {
        assert!(Address::from_base58("invalid!").is_err());
        assert!(Address::from_base58("abc").is_err());
    }

    #[test]
    fn test_secret_key_wrong_length() {
        let err = Wallet::from_secret_key(&[1u8; 31]).unwrap_err();
        assert!(matches!(err, TokenError::WalletError { .. }));
    }

    #[test]
    fn test_wallet_debug_redacts_secret() {
        let wallet = Wallet::generate().expect("should generate");
        let debug = format!("{wallet:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(&wallet.secret_key_base58()));
    }
}
