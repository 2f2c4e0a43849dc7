//! Signed transactions and atomic transaction groups.
//!
//! External transactions (payments and asset transfers) are signed by their
//! sender over a SHA-256 digest of a canonical byte encoding. Inner transfers
//! are issued by custodial accounts and carry no signature; the chain
//! authorises them by checking the sender is custodial.

use crate::amount::Amount;
use crate::asset::AssetId;
use crate::error::{Result, TokenError};
use crate::wallet::{Address, Wallet};
use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Unique transaction identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create a new random transaction ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transaction that can be signed by its sender.
pub trait Signable {
    /// Transaction ID.
    fn id(&self) -> &TransactionId;

    /// Account that must sign.
    fn sender(&self) -> &Address;

    /// Canonical byte encoding covered by the signature.
    fn signing_bytes(&self) -> Vec<u8>;

    /// SHA-256 digest of [`Signable::signing_bytes`].
    fn digest(&self) -> [u8; 32] {
        Sha256::digest(self.signing_bytes()).into()
    }
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// A currency payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTxn {
    /// Transaction ID.
    pub id: TransactionId,
    /// Paying account.
    pub sender: Address,
    /// Receiving account.
    pub receiver: Address,
    /// Amount paid.
    pub amount: Amount,
}

impl PaymentTxn {
    /// Create a payment with a fresh ID.
    #[must_use]
    pub fn new(sender: Address, receiver: Address, amount: Amount) -> Self {
        Self {
            id: TransactionId::new(),
            sender,
            receiver,
            amount,
        }
    }
}

impl Signable for PaymentTxn {
    fn id(&self) -> &TransactionId {
        &self.id
    }

    fn sender(&self) -> &Address {
        &self.sender
    }

    fn signing_bytes(&self) -> Vec<u8> {
        let mut buf = b"bazaar/pay/v1".to_vec();
        put_str(&mut buf, self.id.as_str());
        put_str(&mut buf, self.sender.as_str());
        put_str(&mut buf, self.receiver.as_str());
        buf.extend_from_slice(&self.amount.base_units().to_le_bytes());
        buf
    }
}

/// A transfer of asset units.
///
/// A zero-amount transfer from an account to itself opts that account in
/// to the asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTransferTxn {
    /// Transaction ID.
    pub id: TransactionId,
    /// Sending account.
    pub sender: Address,
    /// Receiving account.
    pub receiver: Address,
    /// Asset being moved.
    pub asset: AssetId,
    /// Units moved, in the asset's smallest unit.
    pub amount: u64,
}

impl AssetTransferTxn {
    /// Create an asset transfer with a fresh ID.
    #[must_use]
    pub fn new(sender: Address, receiver: Address, asset: AssetId, amount: u64) -> Self {
        Self {
            id: TransactionId::new(),
            sender,
            receiver,
            asset,
            amount,
        }
    }

    /// Create an opt-in (zero-amount self transfer).
    #[must_use]
    pub fn opt_in(account: Address, asset: AssetId) -> Self {
        Self::new(account.clone(), account, asset, 0)
    }
}

impl Signable for AssetTransferTxn {
    fn id(&self) -> &TransactionId {
        &self.id
    }

    fn sender(&self) -> &Address {
        &self.sender
    }

    fn signing_bytes(&self) -> Vec<u8> {
        let mut buf = b"bazaar/axfer/v1".to_vec();
        put_str(&mut buf, self.id.as_str());
        put_str(&mut buf, self.sender.as_str());
        put_str(&mut buf, self.receiver.as_str());
        buf.extend_from_slice(&self.asset.get().to_le_bytes());
        buf.extend_from_slice(&self.amount.to_le_bytes());
        buf
    }
}

/// A transaction together with its sender's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signed<T> {
    /// The signed transaction.
    pub txn: T,
    /// Ed25519 signature over the transaction digest.
    pub signature: Signature,
}

impl<T: Signable> Signed<T> {
    /// Sign a transaction with the sender's wallet.
    ///
    /// # Errors
    ///
    /// Returns error if the wallet does not control the transaction sender.
    pub fn sign(txn: T, wallet: &Wallet) -> Result<Self> {
        if wallet.address() != txn.sender() {
            return Err(TokenError::WalletError {
                message: format!(
                    "wallet {} cannot sign for sender {}",
                    wallet.address(),
                    txn.sender()
                ),
            });
        }
        let signature = wallet.sign(&txn.digest());
        Ok(Self { txn, signature })
    }

    /// Verify the signature against the transaction sender.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidSignature`] if verification fails.
    pub fn verify_signature(&self) -> Result<()> {
        if self.txn.sender().verifies(&self.txn.digest(), &self.signature) {
            Ok(())
        } else {
            Err(TokenError::InvalidSignature {
                id: self.txn.id().to_string(),
            })
        }
    }
}

/// One step of a [`TransactionGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GroupStep {
    /// Signed payment from an external account.
    Payment(Signed<PaymentTxn>),
    /// Signed asset transfer from an external account.
    AssetTransfer(Signed<AssetTransferTxn>),
    /// Payment issued by a custodial account.
    InnerPayment {
        /// Custodial sender.
        sender: Address,
        /// Receiving account.
        receiver: Address,
        /// Amount paid.
        amount: Amount,
    },
    /// Asset transfer issued by a custodial account.
    InnerAssetTransfer {
        /// Custodial sender.
        sender: Address,
        /// Receiving account.
        receiver: Address,
        /// Asset being moved.
        asset: AssetId,
        /// Units moved.
        amount: u64,
    },
}

/// An ordered list of steps applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionGroup {
    steps: Vec<GroupStep>,
}

impl TransactionGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn push(&mut self, step: GroupStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Append a step, builder style.
    #[must_use]
    pub fn with(mut self, step: GroupStep) -> Self {
        self.steps.push(step);
        self
    }

    /// The steps in application order.
    #[must_use]
    pub fn steps(&self) -> &[GroupStep] {
        &self.steps
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the group has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
