//! The listing ledger.
//!
//! [`Ledger`] performs the six listing operations over an owned
//! [`ListingStore`]. Every operation runs under one lock held across
//! verification, custody settlement and the store write:
//!
//! 1. look up the listing and check preconditions
//! 2. verify incoming transactions against what the operation requires
//! 3. stage all value movements into one [`Settlement`] and settle it
//! 4. write the new listing state
//!
//! A failure at any step returns before the store is written, and custody
//! applies a settlement all-or-nothing, so a rejected operation changes
//! nothing.

use bazaar_token::{Address, Amount, AssetId, AssetTransferTxn, PaymentTxn, Signed};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::auth::{Caller, Operation, authorize};
use crate::config::FeeSchedule;
use crate::custody::{Custody, CustodyError, Settlement};
use crate::error::{LedgerError, Result};
use crate::listing::{ListingKey, ListingState};
use crate::pricing::payment_for;
use crate::store::ListingStore;
use crate::verify::{PaymentExpectation, TransferExpectation};

/// Receipt of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Listing bought from.
    pub key: ListingKey,
    /// Units delivered to the buyer.
    pub quantity: u64,
    /// Amount paid.
    pub paid: Amount,
    /// Units still escrowed after the purchase.
    pub remaining: u64,
}

/// Receipt of a closed listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Listing closed.
    pub key: ListingKey,
    /// Units returned to the owner.
    pub quantity: u64,
    /// Listing fee refunded to the owner.
    pub refund: Amount,
}

/// Escrowed listing ledger.
pub struct Ledger<C, S> {
    custody: C,
    store: Mutex<S>,
    fees: FeeSchedule,
}

impl<C: Custody, S: ListingStore> Ledger<C, S> {
    /// Create a ledger over `store`, settling through `custody`.
    ///
    /// Withdrawals refund `fees.listing_fee()`, so a store reopened after a
    /// restart must be paired with the schedule its listings were created
    /// under.
    pub fn new(custody: C, store: S, fees: FeeSchedule) -> Self {
        Self {
            custody,
            store: Mutex::new(store),
            fees,
        }
    }

    /// The custody collaborator.
    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// The fee schedule in force.
    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Register the custodial account to hold `asset`.
    ///
    /// `payment` must pay exactly the asset opt-in fee to custody; anyone may
    /// pay it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::AssetAlreadyRegistered`] if custody already holds the asset
    /// - [`LedgerError::UnknownAsset`] if the asset does not exist
    /// - payment verification and settlement errors
    pub async fn allow_asset(
        &self,
        caller: &Caller,
        payment: Signed<PaymentTxn>,
        asset: AssetId,
    ) -> Result<()> {
        let _store = self.store.lock().await;

        let result: Result<()> = async {
            if self.custody.is_registered_for_asset(asset).await {
                return Err(LedgerError::AssetAlreadyRegistered(asset));
            }
            if self.custody.asset_params(asset).await.is_none() {
                return Err(LedgerError::UnknownAsset(asset));
            }

            let expected =
                PaymentExpectation::to(self.custody.address().clone(), self.fees.opt_in_fee());
            self.custody
                .verify_payment(&payment, &expected)
                .map_err(LedgerError::from_payment_check)?;

            self.settle(Settlement::new().receive_payment(payment).register_asset(asset))
                .await
        }
        .await;

        match &result {
            Ok(()) => info!(asset = %asset, payer = %caller.address(), "asset registered with custody"),
            Err(e) => debug!(asset = %asset, error = %e, "allow_asset rejected"),
        }
        result
    }

    /// Create a listing of the transferred asset under `nonce`.
    ///
    /// `payment` must pay exactly the listing fee from the caller to custody;
    /// `transfer` must move at least one unit from the caller to custody.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ListingAlreadyExists`] if the key is taken
    /// - [`LedgerError::AssetNotRegistered`] if custody cannot hold the asset
    /// - payment, transfer and settlement errors
    pub async fn first_deposit(
        &self,
        caller: &Caller,
        payment: Signed<PaymentTxn>,
        transfer: Signed<AssetTransferTxn>,
        nonce: u64,
        unitary_price: u64,
    ) -> Result<ListingState> {
        let key = ListingKey::new(caller.address().clone(), transfer.txn.asset, nonce);
        let mut store = self.store.lock().await;

        let result: Result<ListingState> = async {
            authorize(caller, &key, Operation::FirstDeposit)?;
            if store.contains(&key) {
                return Err(LedgerError::ListingAlreadyExists(key.clone()));
            }
            if !self.custody.is_registered_for_asset(key.asset).await {
                return Err(LedgerError::AssetNotRegistered(key.asset));
            }

            let expected_payment =
                PaymentExpectation::to(self.custody.address().clone(), self.fees.listing_fee())
                    .from_sender(caller.address().clone());
            self.custody
                .verify_payment(&payment, &expected_payment)
                .map_err(LedgerError::from_payment_check)?;

            let quantity = transfer.txn.amount;
            self.verify_incoming_units(caller, &transfer)?;

            self.settle(
                Settlement::new()
                    .receive_payment(payment)
                    .receive_asset(transfer),
            )
            .await?;

            let state = ListingState::new(quantity, unitary_price);
            store.insert(key.clone(), state);
            Ok(state)
        }
        .await;

        match &result {
            Ok(state) => info!(
                listing = %key,
                deposited = state.deposited,
                unitary_price = state.unitary_price,
                "listing created"
            ),
            Err(e) => debug!(listing = %key, error = %e, "first_deposit rejected"),
        }
        result
    }

    /// Add the transferred units to an existing listing.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ListingNotFound`] if the listing does not exist
    /// - [`LedgerError::TransferAmountInvalid`] if the quantity is zero or
    ///   the escrowed total would overflow
    /// - transfer and settlement errors
    pub async fn deposit(
        &self,
        caller: &Caller,
        transfer: Signed<AssetTransferTxn>,
        nonce: u64,
    ) -> Result<ListingState> {
        let key = ListingKey::new(caller.address().clone(), transfer.txn.asset, nonce);
        let mut store = self.store.lock().await;

        let result: Result<ListingState> = async {
            let current = store
                .get(&key)
                .ok_or_else(|| LedgerError::ListingNotFound(key.clone()))?;
            authorize(caller, &key, Operation::Deposit)?;

            self.verify_incoming_units(caller, &transfer)?;
            let quantity = transfer.txn.amount;
            let next = current
                .after_deposit(quantity)
                .ok_or_else(|| LedgerError::transfer_amount(quantity, "escrowed total overflows"))?;

            self.settle(Settlement::new().receive_asset(transfer)).await?;

            store.insert(key.clone(), next);
            Ok(next)
        }
        .await;

        match &result {
            Ok(state) => info!(listing = %key, deposited = state.deposited, "listing deposit"),
            Err(e) => debug!(listing = %key, error = %e, "deposit rejected"),
        }
        result
    }

    /// Replace the price of an existing listing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ListingNotFound`] if the listing does not exist.
    pub async fn set_unitary_price(
        &self,
        caller: &Caller,
        asset: AssetId,
        nonce: u64,
        unitary_price: u64,
    ) -> Result<ListingState> {
        let key = ListingKey::new(caller.address().clone(), asset, nonce);
        let mut store = self.store.lock().await;

        let result = store
            .get(&key)
            .ok_or_else(|| LedgerError::ListingNotFound(key.clone()))
            .and_then(|current| {
                authorize(caller, &key, Operation::SetUnitaryPrice)?;
                Ok(current.with_price(unitary_price))
            });

        match result {
            Ok(next) => {
                store.insert(key.clone(), next);
                info!(listing = %key, unitary_price, "listing price updated");
                Ok(next)
            }
            Err(e) => {
                debug!(listing = %key, error = %e, "set_unitary_price rejected");
                Err(e)
            }
        }
    }

    /// Buy `quantity` units from the listing `(owner, asset, nonce)`.
    ///
    /// `payment` must pay exactly [`quote`](Self::quote) from the caller to
    /// custody. The units are delivered to the caller, who must be opted in
    /// to the asset.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ListingNotFound`] if the listing does not exist
    /// - [`LedgerError::TransferAmountInvalid`] if `quantity` is zero
    /// - [`LedgerError::InsufficientInventory`] if `quantity` exceeds the escrow
    /// - [`LedgerError::PaymentOverflow`] if the price does not fit
    /// - payment and settlement errors
    pub async fn buy(
        &self,
        caller: &Caller,
        owner: &Address,
        asset: AssetId,
        nonce: u64,
        payment: Signed<PaymentTxn>,
        quantity: u64,
    ) -> Result<Purchase> {
        let key = ListingKey::new(owner.clone(), asset, nonce);
        let mut store = self.store.lock().await;

        let result: Result<Purchase> = async {
            let current = store
                .get(&key)
                .ok_or_else(|| LedgerError::ListingNotFound(key.clone()))?;
            authorize(caller, &key, Operation::Buy)?;

            let amount = self.price(&current, asset, quantity).await?;
            let next = current.after_sale(quantity).ok_or(LedgerError::InsufficientInventory {
                requested: quantity,
                available: current.deposited,
            })?;

            let expected = PaymentExpectation::to(self.custody.address().clone(), amount)
                .from_sender(caller.address().clone());
            self.custody
                .verify_payment(&payment, &expected)
                .map_err(LedgerError::from_payment_check)?;

            self.settle(
                Settlement::new()
                    .receive_payment(payment)
                    .send_asset(asset, caller.address().clone(), quantity),
            )
            .await?;

            store.insert(key.clone(), next);
            Ok(Purchase {
                key: key.clone(),
                quantity,
                paid: amount,
                remaining: next.deposited,
            })
        }
        .await;

        match &result {
            Ok(purchase) => info!(
                listing = %key,
                buyer = %caller.address(),
                quantity,
                paid = %purchase.paid,
                remaining = purchase.remaining,
                "listing purchase"
            ),
            Err(e) => debug!(listing = %key, quantity, error = %e, "buy rejected"),
        }
        result
    }

    /// Close a listing, returning the escrowed units and the listing fee.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ListingNotFound`] if the listing does not exist
    /// - settlement errors, e.g. [`LedgerError::InsufficientCustodyFunds`]
    pub async fn withdraw(&self, caller: &Caller, asset: AssetId, nonce: u64) -> Result<Withdrawal> {
        let key = ListingKey::new(caller.address().clone(), asset, nonce);
        let mut store = self.store.lock().await;

        let result: Result<Withdrawal> = async {
            let current = store
                .get(&key)
                .ok_or_else(|| LedgerError::ListingNotFound(key.clone()))?;
            authorize(caller, &key, Operation::Withdraw)?;

            let refund = self.fees.listing_fee();
            let owner = caller.address().clone();
            let mut settlement = Settlement::new().send_payment(owner.clone(), refund);
            if current.deposited > 0 {
                settlement = settlement.send_asset(asset, owner, current.deposited);
            }
            self.settle(settlement).await?;

            store.remove(&key);
            Ok(Withdrawal {
                key: key.clone(),
                quantity: current.deposited,
                refund,
            })
        }
        .await;

        match &result {
            Ok(w) => info!(
                listing = %key,
                returned = w.quantity,
                refund = %w.refund,
                "listing withdrawn"
            ),
            Err(e) => debug!(listing = %key, error = %e, "withdraw rejected"),
        }
        result
    }

    /// Payment [`buy`](Self::buy) would require for `quantity` units.
    ///
    /// # Errors
    ///
    /// Same precondition errors as [`buy`](Self::buy), without moving funds.
    pub async fn quote(
        &self,
        owner: &Address,
        asset: AssetId,
        nonce: u64,
        quantity: u64,
    ) -> Result<Amount> {
        let key = ListingKey::new(owner.clone(), asset, nonce);
        let store = self.store.lock().await;
        let current = store
            .get(&key)
            .ok_or_else(|| LedgerError::ListingNotFound(key.clone()))?;
        self.price(&current, asset, quantity).await
    }

    /// Current state of a listing.
    pub async fn listing(&self, key: &ListingKey) -> Option<ListingState> {
        self.store.lock().await.get(key)
    }

    /// All listings, ordered by key.
    pub async fn listings(&self) -> Vec<(ListingKey, ListingState)> {
        self.store.lock().await.entries()
    }

    /// Listings owned by `owner`, ordered by key.
    pub async fn listings_by_owner(&self, owner: &Address) -> Vec<(ListingKey, ListingState)> {
        self.store
            .lock()
            .await
            .entries()
            .into_iter()
            .filter(|(k, _)| &k.owner == owner)
            .collect()
    }

    fn verify_incoming_units(
        &self,
        caller: &Caller,
        transfer: &Signed<AssetTransferTxn>,
    ) -> Result<()> {
        let expected = TransferExpectation::to(self.custody.address().clone(), 1)
            .from_sender(caller.address().clone());
        self.custody
            .verify_asset_transfer(transfer, &expected)
            .map_err(LedgerError::from_transfer_check)
    }

    async fn price(&self, state: &ListingState, asset: AssetId, quantity: u64) -> Result<Amount> {
        if quantity == 0 {
            return Err(LedgerError::transfer_amount(0, "quantity must be positive"));
        }
        if quantity > state.deposited {
            return Err(LedgerError::InsufficientInventory {
                requested: quantity,
                available: state.deposited,
            });
        }
        let params = self
            .custody
            .asset_params(asset)
            .await
            .ok_or(LedgerError::UnknownAsset(asset))?;
        payment_for(state.unitary_price, quantity, params.decimals)
            .map(Amount::from_base_units)
            .ok_or(LedgerError::PaymentOverflow {
                unitary_price: state.unitary_price,
                quantity,
            })
    }

    async fn settle(&self, settlement: Settlement) -> Result<()> {
        self.custody
            .settle(settlement)
            .await
            .map_err(|e| self.settlement_error(e))
    }

    fn settlement_error(&self, err: CustodyError) -> LedgerError {
        let custody = self.custody.address().as_str();
        match err {
            CustodyError::InsufficientBalance { address, detail } => {
                if address == custody {
                    LedgerError::InsufficientCustodyFunds(detail)
                } else {
                    LedgerError::SenderInsufficientFunds { address, detail }
                }
            }
            CustodyError::NotOptedIn { address, asset } => {
                if address == custody {
                    LedgerError::AssetNotRegistered(asset)
                } else {
                    LedgerError::ReceiverNotOptedIn { address, asset }
                }
            }
            CustodyError::UnknownAsset(asset) => LedgerError::UnknownAsset(asset),
            CustodyError::InvalidSignature(id) => LedgerError::InvalidSignature(id),
            CustodyError::Duplicate(id) => LedgerError::DuplicateTransaction(id),
            CustodyError::Rejected(reason) => LedgerError::Custody(reason),
        }
    }
}

impl<C: std::fmt::Debug, S> std::fmt::Debug for Ledger<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("custody", &self.custody)
            .field("fees", &self.fees)
            .finish_non_exhaustive()
    }
}
