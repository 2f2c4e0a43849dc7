//! Custody collaborators.
//!
//! The ledger never moves value itself. It verifies incoming transactions
//! through [`PaymentVerifier`] and [`AssetTransferVerifier`], stages every
//! movement of the operation into one [`Settlement`], and hands that to
//! [`Custody::settle`], which must apply it all-or-nothing.
//!
//! [`ChainCustody`] implements the collaborators on top of
//! [`SimulatedChain`].

use std::future::Future;

use bazaar_token::{
    Address, Amount, AssetId, AssetParams, AssetTransferTxn, GroupStep, PaymentTxn, Signed,
    SimulatedChain, TokenError, TransactionGroup,
};
use thiserror::Error;
use tracing::debug;

use crate::verify::{
    PaymentExpectation, TransferExpectation, VerifyError, check_asset_transfer, check_payment,
};

/// Verifies incoming payments.
pub trait PaymentVerifier: Send + Sync {
    /// Check a signed payment against an expectation.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    fn verify_payment(
        &self,
        txn: &Signed<PaymentTxn>,
        expected: &PaymentExpectation,
    ) -> Result<(), VerifyError> {
        check_payment(txn, expected)
    }
}

/// Verifies incoming asset transfers.
pub trait AssetTransferVerifier: Send + Sync {
    /// Check a signed asset transfer against an expectation.
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    fn verify_asset_transfer(
        &self,
        txn: &Signed<AssetTransferTxn>,
        expected: &TransferExpectation,
    ) -> Result<(), VerifyError> {
        check_asset_transfer(txn, expected)
    }
}

/// Failures while applying a [`Settlement`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    /// An account lacks the currency or asset units to cover a step.
    #[error("insufficient balance for {address}: {detail}")]
    InsufficientBalance {
        /// Account being debited.
        address: String,
        /// Description of the shortfall.
        detail: String,
    },

    /// A receiving account is not opted in to the asset.
    #[error("{address} is not opted in to asset {asset}")]
    NotOptedIn {
        /// Account lacking the opt-in.
        address: String,
        /// Asset in question.
        asset: AssetId,
    },

    /// The asset does not exist.
    #[error("unknown asset: {0}")]
    UnknownAsset(AssetId),

    /// An incoming transaction's signature does not verify.
    #[error("invalid signature on transaction {0}")]
    InvalidSignature(String),

    /// An incoming transaction was already applied.
    #[error("transaction already applied: {0}")]
    Duplicate(String),

    /// Any other rejection.
    #[error("settlement rejected: {0}")]
    Rejected(String),
}

impl From<TokenError> for CustodyError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InsufficientBalance { ref address, .. }
            | TokenError::InsufficientAssetBalance { ref address, .. } => {
                Self::InsufficientBalance {
                    address: address.clone(),
                    detail: e.to_string(),
                }
            }
            TokenError::NotOptedIn { address, asset } => Self::NotOptedIn { address, asset },
            TokenError::UnknownAsset(asset) => Self::UnknownAsset(asset),
            TokenError::InvalidSignature { id } => Self::InvalidSignature(id),
            TokenError::DuplicateTransaction { id } => Self::Duplicate(id),
            other => Self::Rejected(other.to_string()),
        }
    }
}

/// One value movement staged for settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementStep {
    /// Apply a verified incoming payment.
    ReceivePayment(Signed<PaymentTxn>),
    /// Apply a verified incoming asset transfer.
    ReceiveAsset(Signed<AssetTransferTxn>),
    /// Pay out of custody.
    SendPayment {
        /// Receiving account.
        receiver: Address,
        /// Amount paid.
        amount: Amount,
    },
    /// Send asset units out of custody.
    SendAsset {
        /// Asset being moved.
        asset: AssetId,
        /// Receiving account.
        receiver: Address,
        /// Units moved.
        amount: u64,
    },
    /// Register the custodial account to hold an asset.
    RegisterAsset(AssetId),
}

/// All value movements of one ledger operation, applied together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    steps: Vec<SettlementStep>,
}

impl Settlement {
    /// Create an empty settlement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an incoming payment.
    #[must_use]
    pub fn receive_payment(mut self, txn: Signed<PaymentTxn>) -> Self {
        self.steps.push(SettlementStep::ReceivePayment(txn));
        self
    }

    /// Stage an incoming asset transfer.
    #[must_use]
    pub fn receive_asset(mut self, txn: Signed<AssetTransferTxn>) -> Self {
        self.steps.push(SettlementStep::ReceiveAsset(txn));
        self
    }

    /// Stage a payment out of custody.
    #[must_use]
    pub fn send_payment(mut self, receiver: Address, amount: Amount) -> Self {
        self.steps.push(SettlementStep::SendPayment { receiver, amount });
        self
    }

    /// Stage an asset transfer out of custody.
    #[must_use]
    pub fn send_asset(mut self, asset: AssetId, receiver: Address, amount: u64) -> Self {
        self.steps.push(SettlementStep::SendAsset {
            asset,
            receiver,
            amount,
        });
        self
    }

    /// Stage registration of the custodial account for an asset.
    #[must_use]
    pub fn register_asset(mut self, asset: AssetId) -> Self {
        self.steps.push(SettlementStep::RegisterAsset(asset));
        self
    }

    /// The staged steps in order.
    #[must_use]
    pub fn steps(&self) -> &[SettlementStep] {
        &self.steps
    }

    /// Translate into a chain transaction group issued by `custody`.
    #[must_use]
    pub fn into_group(self, custody: &Address) -> TransactionGroup {
        let mut group = TransactionGroup::new();
        for step in self.steps {
            let step = match step {
                SettlementStep::ReceivePayment(txn) => GroupStep::Payment(txn),
                SettlementStep::ReceiveAsset(txn) => GroupStep::AssetTransfer(txn),
                SettlementStep::SendPayment { receiver, amount } => GroupStep::InnerPayment {
                    sender: custody.clone(),
                    receiver,
                    amount,
                },
                SettlementStep::SendAsset {
                    asset,
                    receiver,
                    amount,
                } => GroupStep::InnerAssetTransfer {
                    sender: custody.clone(),
                    receiver,
                    asset,
                    amount,
                },
                SettlementStep::RegisterAsset(asset) => GroupStep::InnerAssetTransfer {
                    sender: custody.clone(),
                    receiver: custody.clone(),
                    asset,
                    amount: 0,
                },
            };
            group.push(step);
        }
        group
    }
}

/// The custodial account: holds escrowed units and collected fees.
pub trait Custody: PaymentVerifier + AssetTransferVerifier {
    /// Address of the custodial account.
    fn address(&self) -> &Address;

    /// Whether the custodial account is registered to hold `asset`.
    fn is_registered_for_asset(&self, asset: AssetId) -> impl Future<Output = bool> + Send;

    /// Parameters of `asset`, if it exists.
    fn asset_params(&self, asset: AssetId)
    -> impl Future<Output = Option<AssetParams>> + Send;

    /// Apply every step of `settlement` or none of them.
    fn settle(
        &self,
        settlement: Settlement,
    ) -> impl Future<Output = Result<(), CustodyError>> + Send;
}

/// [`Custody`] backed by a [`SimulatedChain`] custodial account.
#[derive(Debug, Clone)]
pub struct ChainCustody {
    chain: SimulatedChain,
    address: Address,
}

impl ChainCustody {
    /// Create a fresh custodial account on `chain`.
    ///
    /// # Errors
    ///
    /// Returns error if the account cannot be created.
    pub async fn open(chain: SimulatedChain) -> Result<Self, CustodyError> {
        let address = chain.create_custodial_account().await?;
        Ok(Self { chain, address })
    }

    /// Attach to an existing custodial account.
    ///
    /// # Errors
    ///
    /// Returns error if the chain does not treat `address` as custodial.
    pub async fn attach(chain: SimulatedChain, address: Address) -> Result<Self, CustodyError> {
        if !chain.is_custodial(&address).await {
            return Err(CustodyError::Rejected(format!(
                "{address} is not a custodial account"
            )));
        }
        Ok(Self { chain, address })
    }

    /// The underlying chain.
    #[must_use]
    pub fn chain(&self) -> &SimulatedChain {
        &self.chain
    }
}

impl PaymentVerifier for ChainCustody {}

impl AssetTransferVerifier for ChainCustody {}

impl Custody for ChainCustody {
    fn address(&self) -> &Address {
        &self.address
    }

    async fn is_registered_for_asset(&self, asset: AssetId) -> bool {
        self.chain.is_opted_in(&self.address, asset).await
    }

    async fn asset_params(&self, asset: AssetId) -> Option<AssetParams> {
        self.chain.asset_params(asset).await
    }

    async fn settle(&self, settlement: Settlement) -> Result<(), CustodyError> {
        let steps = settlement.steps().len();
        let group = self.chain.execute(settlement.into_group(&self.address)).await?;
        debug!(group = %group, steps, "settlement applied");
        Ok(())
    }
}
