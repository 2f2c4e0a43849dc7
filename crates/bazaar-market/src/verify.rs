//! Verification of incoming payments and asset transfers.
//!
//! A verifier checks a signed transaction against what the ledger expects
//! before any value moves. Checks run in a fixed order: signature, sender,
//! receiver, amount.

use bazaar_token::{Address, Amount, AssetTransferTxn, PaymentTxn, Signed};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which side of a transfer failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The paying/sending account.
    Sender,
    /// The receiving account.
    Receiver,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => write!(f, "sender"),
            Self::Receiver => write!(f, "receiver"),
        }
    }
}

/// Reasons a transaction fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// Payment amount differs from the required amount.
    #[error("amount mismatch: expected {expected}, got {actual}")]
    AmountMismatch {
        /// Required amount.
        expected: Amount,
        /// Amount carried by the transaction.
        actual: Amount,
    },

    /// Transfer quantity is below the required minimum.
    #[error("transfer amount {actual} below minimum {minimum}")]
    AmountBelowMinimum {
        /// Smallest acceptable quantity.
        minimum: u64,
        /// Quantity carried by the transaction.
        actual: u64,
    },

    /// Sender is not the expected account.
    #[error("sender mismatch: expected {expected}, got {actual}")]
    SenderMismatch {
        /// Expected sender.
        expected: Address,
        /// Actual sender.
        actual: Address,
    },

    /// Receiver is not the expected account.
    #[error("receiver mismatch: expected {expected}, got {actual}")]
    ReceiverMismatch {
        /// Expected receiver.
        expected: Address,
        /// Actual receiver.
        actual: Address,
    },

    /// Signature does not verify against the sender.
    #[error("invalid signature on transaction {0}")]
    InvalidSignature(String),
}

/// What an incoming payment must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentExpectation {
    /// Required sender, or `None` if anyone may pay.
    pub sender: Option<Address>,
    /// Required receiver.
    pub receiver: Address,
    /// Exact amount required.
    pub amount: Amount,
}

impl PaymentExpectation {
    /// Expect exactly `amount` paid to `receiver` by anyone.
    #[must_use]
    pub const fn to(receiver: Address, amount: Amount) -> Self {
        Self {
            sender: None,
            receiver,
            amount,
        }
    }

    /// Additionally require a specific sender.
    #[must_use]
    pub fn from_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }
}

/// What an incoming asset transfer must look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferExpectation {
    /// Required sender, or `None` if anyone may send.
    pub sender: Option<Address>,
    /// Required receiver.
    pub receiver: Address,
    /// Smallest acceptable quantity.
    pub min_amount: u64,
}

impl TransferExpectation {
    /// Expect at least `min_amount` units sent to `receiver` by anyone.
    #[must_use]
    pub const fn to(receiver: Address, min_amount: u64) -> Self {
        Self {
            sender: None,
            receiver,
            min_amount,
        }
    }

    /// Additionally require a specific sender.
    #[must_use]
    pub fn from_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }
}

fn check_parties(
    sender: &Address,
    receiver: &Address,
    expected_sender: Option<&Address>,
    expected_receiver: &Address,
) -> Result<(), VerifyError> {
    if let Some(expected) = expected_sender {
        if sender != expected {
            return Err(VerifyError::SenderMismatch {
                expected: expected.clone(),
                actual: sender.clone(),
            });
        }
    }
    if receiver != expected_receiver {
        return Err(VerifyError::ReceiverMismatch {
            expected: expected_receiver.clone(),
            actual: receiver.clone(),
        });
    }
    Ok(())
}

/// Check a signed payment against an expectation.
///
/// # Errors
///
/// Returns the first failed check.
pub fn check_payment(
    signed: &Signed<PaymentTxn>,
    expected: &PaymentExpectation,
) -> Result<(), VerifyError> {
    signed
        .verify_signature()
        .map_err(|_| VerifyError::InvalidSignature(signed.txn.id.to_string()))?;
    let txn = &signed.txn;
    check_parties(
        &txn.sender,
        &txn.receiver,
        expected.sender.as_ref(),
        &expected.receiver,
    )?;
    if txn.amount != expected.amount {
        return Err(VerifyError::AmountMismatch {
            expected: expected.amount,
            actual: txn.amount,
        });
    }
    Ok(())
}

/// Check a signed asset transfer against an expectation.
///
/// # Errors
///
/// Returns the first failed check.
pub fn check_asset_transfer(
    signed: &Signed<AssetTransferTxn>,
    expected: &TransferExpectation,
) -> Result<(), VerifyError> {
    signed
        .verify_signature()
        .map_err(|_| VerifyError::InvalidSignature(signed.txn.id.to_string()))?;
    let txn = &signed.txn;
    check_parties(
        &txn.sender,
        &txn.receiver,
        expected.sender.as_ref(),
        &expected.receiver,
    )?;
    if txn.amount < expected.min_amount {
        return Err(VerifyError::AmountBelowMinimum {
            minimum: expected.min_amount,
            actual: txn.amount,
        });
    }
    Ok(())
}
