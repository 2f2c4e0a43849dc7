//! Error types for token and chain operations.

use thiserror::Error;

use crate::amount::Amount;
use crate::asset::AssetId;

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors that can occur during token and chain operations.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Invalid address format.
    #[error("invalid address: {message}")]
    InvalidAddress {
        /// Description of the address error.
        message: String,
    },

    /// Insufficient currency balance for a transfer.
    #[error("insufficient balance: {address} has {have}, needs {need}")]
    InsufficientBalance {
        /// Account being debited.
        address: String,
        /// Current balance.
        have: Amount,
        /// Required balance.
        need: Amount,
    },

    /// Insufficient asset holding for a transfer.
    #[error("insufficient holding of asset {asset}: {address} has {have}, needs {need}")]
    InsufficientAssetBalance {
        /// Account being debited.
        address: String,
        /// Asset being moved.
        asset: AssetId,
        /// Units currently held.
        have: u64,
        /// Units required.
        need: u64,
    },

    /// Account is not opted in to the asset.
    #[error("account {address} is not opted in to asset {asset}")]
    NotOptedIn {
        /// Account that lacks the opt-in.
        address: String,
        /// Asset in question.
        asset: AssetId,
    },

    /// Asset does not exist on the chain.
    #[error("unknown asset: {0}")]
    UnknownAsset(AssetId),

    /// Invalid asset parameters.
    #[error("invalid asset: {message}")]
    InvalidAsset {
        /// Description of the asset error.
        message: String,
    },

    /// Signature does not match the transaction sender.
    #[error("invalid signature on transaction {id}")]
    InvalidSignature {
        /// Transaction ID.
        id: String,
    },

    /// Transaction was already applied.
    #[error("duplicate transaction: {id}")]
    DuplicateTransaction {
        /// Transaction ID.
        id: String,
    },

    /// Inner transfer issued from an account the chain does not control.
    #[error("account {address} is not a custodial account")]
    NotCustodial {
        /// Offending sender.
        address: String,
    },

    /// Invalid amount.
    #[error("invalid amount: {message}")]
    InvalidAmount {
        /// Description of the amount error.
        message: String,
    },

    /// Wallet error.
    #[error("wallet error: {message}")]
    WalletError {
        /// Description of the wallet error.
        message: String,
    },
}

impl TokenError {
    /// Create an invalid address error.
    #[must_use]
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            message: message.into(),
        }
    }

    /// Create an insufficient balance error.
    #[must_use]
    pub fn insufficient_balance(address: impl Into<String>, have: Amount, need: Amount) -> Self {
        Self::InsufficientBalance {
            address: address.into(),
            have,
            need,
        }
    }

    /// Create a not-opted-in error.
    #[must_use]
    pub fn not_opted_in(address: impl Into<String>, asset: AssetId) -> Self {
        Self::NotOptedIn {
            address: address.into(),
            asset,
        }
    }

    /// Create an invalid amount error.
    #[must_use]
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_display() {
        let err = TokenError::insufficient_balance(
            "acct",
            Amount::from_base_units(5),
            Amount::from_base_units(10),
        );
        let msg = err.to_string();
        assert!(msg.contains("acct"));
        assert!(msg.contains("0.000005"));
        assert!(msg.contains("0.000010"));
    }

    #[test]
    fn test_not_opted_in_display() {
        let err = TokenError::not_opted_in("acct", AssetId::new(7));
        assert_eq!(err.to_string(), "account acct is not opted in to asset 7");
    }

    #[test]
    fn test_duplicate_display() {
        let err = TokenError::DuplicateTransaction {
            id: "abc123".to_string(),
        };
        assert!(err.to_string().contains("abc123"));
    }
}
