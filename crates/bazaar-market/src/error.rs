//! Ledger error types.

use bazaar_token::{Address, Amount, AssetId};
use thiserror::Error;

use crate::auth::Operation;
use crate::listing::ListingKey;
use crate::verify::{Party, VerifyError};

/// Reasons a ledger operation is rejected.
///
/// A rejected operation leaves the listing store and all balances unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A listing with this key already exists.
    #[error("listing already exists: {0}")]
    ListingAlreadyExists(ListingKey),

    /// No listing with this key exists.
    #[error("listing not found: {0}")]
    ListingNotFound(ListingKey),

    /// Payment amount differs from the required amount.
    #[error("payment amount mismatch: expected {expected}, got {actual}")]
    PaymentAmountMismatch {
        /// Required amount.
        expected: Amount,
        /// Amount paid.
        actual: Amount,
    },

    /// Payment sender or receiver is wrong.
    #[error("payment {party} mismatch: expected {expected}, got {actual}")]
    PaymentPartyMismatch {
        /// Which side is wrong.
        party: Party,
        /// Expected account.
        expected: Address,
        /// Actual account.
        actual: Address,
    },

    /// Asset transfer quantity is unacceptable.
    #[error("invalid transfer amount {amount}: {reason}")]
    TransferAmountInvalid {
        /// Offending quantity.
        amount: u64,
        /// What is wrong with it.
        reason: String,
    },

    /// Asset transfer sender or receiver is wrong.
    #[error("transfer {party} mismatch: expected {expected}, got {actual}")]
    TransferPartyMismatch {
        /// Which side is wrong.
        party: Party,
        /// Expected account.
        expected: Address,
        /// Actual account.
        actual: Address,
    },

    /// The custodial account is not registered for the asset.
    #[error("asset {0} not registered with custody")]
    AssetNotRegistered(AssetId),

    /// The custodial account is already registered for the asset.
    #[error("asset {0} already registered with custody")]
    AssetAlreadyRegistered(AssetId),

    /// The asset does not exist.
    #[error("unknown asset: {0}")]
    UnknownAsset(AssetId),

    /// Purchase quantity exceeds the escrowed inventory.
    #[error("insufficient inventory: requested {requested}, available {available}")]
    InsufficientInventory {
        /// Quantity requested.
        requested: u64,
        /// Quantity escrowed.
        available: u64,
    },

    /// Custody cannot cover an outgoing payment or asset transfer.
    #[error("insufficient custody funds: {0}")]
    InsufficientCustodyFunds(String),

    /// A paying or sending account cannot cover its incoming transaction.
    #[error("insufficient funds for {address}: {detail}")]
    SenderInsufficientFunds {
        /// Account lacking funds.
        address: String,
        /// Description of the shortfall.
        detail: String,
    },

    /// The receiving account is not opted in to the asset.
    #[error("{address} is not opted in to asset {asset}")]
    ReceiverNotOptedIn {
        /// Account lacking the opt-in.
        address: String,
        /// Asset in question.
        asset: AssetId,
    },

    /// The purchase price does not fit the payment type.
    #[error("payment overflow: price {unitary_price} x quantity {quantity}")]
    PaymentOverflow {
        /// Listing price per whole unit.
        unitary_price: u64,
        /// Quantity requested.
        quantity: u64,
    },

    /// An incoming transaction has an invalid signature.
    #[error("invalid signature on transaction {0}")]
    InvalidSignature(String),

    /// An incoming transaction was already applied.
    #[error("transaction already applied: {0}")]
    DuplicateTransaction(String),

    /// Caller may not perform the operation on this listing.
    #[error("{caller} may not {operation} on listing owned by {owner}")]
    Unauthorized {
        /// Account attempting the operation.
        caller: Address,
        /// Owner of the listing.
        owner: Address,
        /// Operation attempted.
        operation: Operation,
    },

    /// Custody rejected the settlement for another reason.
    #[error("custody error: {0}")]
    Custody(String),
}

impl LedgerError {
    /// Map a failed payment check.
    #[must_use]
    pub fn from_payment_check(err: VerifyError) -> Self {
        match err {
            VerifyError::AmountMismatch { expected, actual } => {
                Self::PaymentAmountMismatch { expected, actual }
            }
            VerifyError::AmountBelowMinimum { minimum, actual } => Self::PaymentAmountMismatch {
                expected: Amount::from_base_units(minimum),
                actual: Amount::from_base_units(actual),
            },
            VerifyError::SenderMismatch { expected, actual } => Self::PaymentPartyMismatch {
                party: Party::Sender,
                expected,
                actual,
            },
            VerifyError::ReceiverMismatch { expected, actual } => Self::PaymentPartyMismatch {
                party: Party::Receiver,
                expected,
                actual,
            },
            VerifyError::InvalidSignature(id) => Self::InvalidSignature(id),
        }
    }

    /// Map a failed asset transfer check.
    #[must_use]
    pub fn from_transfer_check(err: VerifyError) -> Self {
        match err {
            VerifyError::AmountBelowMinimum { minimum, actual } => Self::TransferAmountInvalid {
                amount: actual,
                reason: format!("must be at least {minimum}"),
            },
            VerifyError::AmountMismatch { expected, actual } => Self::TransferAmountInvalid {
                amount: actual.base_units(),
                reason: format!("expected {}", expected.base_units()),
            },
            VerifyError::SenderMismatch { expected, actual } => Self::TransferPartyMismatch {
                party: Party::Sender,
                expected,
                actual,
            },
            VerifyError::ReceiverMismatch { expected, actual } => Self::TransferPartyMismatch {
                party: Party::Receiver,
                expected,
                actual,
            },
            VerifyError::InvalidSignature(id) => Self::InvalidSignature(id),
        }
    }

    /// Create a transfer amount error.
    pub fn transfer_amount(amount: u64, reason: impl Into<String>) -> Self {
        Self::TransferAmountInvalid {
            amount,
            reason: reason.into(),
        }
    }
}

/// Result alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_token::Wallet;

    fn addr() -> Address {
        Wallet::generate().expect("wallet").address().clone()
    }

    #[test]
    fn payment_checks_map_to_payment_errors() {
        let (a, b) = (addr(), addr());
        let err = LedgerError::from_payment_check(VerifyError::SenderMismatch {
            expected: a.clone(),
            actual: b.clone(),
        });
        assert_eq!(
            err,
            LedgerError::PaymentPartyMismatch {
                party: Party::Sender,
                expected: a,
                actual: b
            }
        );

        let err = LedgerError::from_payment_check(VerifyError::AmountMismatch {
            expected: Amount::from_base_units(10),
            actual: Amount::from_base_units(9),
        });
        assert!(matches!(err, LedgerError::PaymentAmountMismatch { .. }));
    }

    #[test]
    fn transfer_checks_map_to_transfer_errors() {
        let err = LedgerError::from_transfer_check(VerifyError::AmountBelowMinimum {
            minimum: 1,
            actual: 0,
        });
        assert!(matches!(err, LedgerError::TransferAmountInvalid { amount: 0, .. }));

        let (a, b) = (addr(), addr());
        let err = LedgerError::from_transfer_check(VerifyError::ReceiverMismatch {
            expected: a,
            actual: b,
        });
        assert!(matches!(
            err,
            LedgerError::TransferPartyMismatch {
                party: Party::Receiver,
                ..
            }
        ));
    }

    #[test]
    fn signature_failures_keep_transaction_id() {
        let err = LedgerError::from_transfer_check(VerifyError::InvalidSignature("t9".into()));
        assert_eq!(err, LedgerError::InvalidSignature("t9".into()));
    }

    #[test]
    fn error_display() {
        let err = LedgerError::InsufficientInventory {
            requested: 10,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "insufficient inventory: requested 10, available 3"
        );
    }
}
