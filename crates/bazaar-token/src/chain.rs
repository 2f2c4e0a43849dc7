//! Simulated custody chain.
//!
//! An in-process ledger of currency balances and asset holdings that
//! applies [`TransactionGroup`]s atomically. A group is staged in a draft
//! holding copies of only the accounts it touches; the draft is merged
//! into the live state only when every step succeeds.

use crate::amount::Amount;
use crate::asset::{AssetId, AssetParams};
use crate::error::{Result, TokenError};
use crate::transaction::{
    AssetTransferTxn, GroupStep, PaymentTxn, Signable, Signed, TransactionGroup, TransactionId,
};
use crate::wallet::{Address, Wallet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// First identifier handed out by [`SimulatedChain::create_asset`].
const FIRST_ASSET_ID: u64 = 1_000;

/// Balance sheet of one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Account {
    balance: Amount,
    /// Opted-in assets and the units held of each.
    holdings: BTreeMap<AssetId, u64>,
}

/// Serializable chain state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    accounts: BTreeMap<Address, Account>,
    assets: BTreeMap<AssetId, AssetParams>,
    custodial: BTreeSet<Address>,
    /// IDs of applied external transactions; a signed transaction is valid once.
    applied: BTreeSet<TransactionId>,
    next_asset_id: u64,
}

impl Default for ChainSnapshot {
    fn default() -> Self {
        Self {
            accounts: BTreeMap::new(),
            assets: BTreeMap::new(),
            custodial: BTreeSet::new(),
            applied: BTreeSet::new(),
            next_asset_id: FIRST_ASSET_ID,
        }
    }
}

impl ChainSnapshot {
    fn account_mut(&mut self, address: &Address) -> &mut Account {
        self.accounts.entry(address.clone()).or_default()
    }

    fn commit(&mut self, changes: Changes) {
        self.accounts.extend(changes.accounts);
        self.applied.extend(changes.applied);
    }
}

/// Account copies and transaction IDs produced by a successful draft.
struct Changes {
    accounts: BTreeMap<Address, Account>,
    applied: BTreeSet<TransactionId>,
}

/// One group's changes, staged on top of the committed state.
struct Draft<'a> {
    base: &'a ChainSnapshot,
    accounts: BTreeMap<Address, Account>,
    applied: BTreeSet<TransactionId>,
}

impl<'a> Draft<'a> {
    fn new(base: &'a ChainSnapshot) -> Self {
        Self {
            base,
            accounts: BTreeMap::new(),
            applied: BTreeSet::new(),
        }
    }

    fn into_changes(self) -> Changes {
        Changes {
            accounts: self.accounts,
            applied: self.applied,
        }
    }

    fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts
            .get(address)
            .or_else(|| self.base.accounts.get(address))
    }

    fn account_mut(&mut self, address: &Address) -> &mut Account {
        let base = self.base;
        self.accounts
            .entry(address.clone())
            .or_insert_with(|| base.accounts.get(address).cloned().unwrap_or_default())
    }

    fn mark_applied(&mut self, id: &TransactionId) -> Result<()> {
        if self.base.applied.contains(id) || !self.applied.insert(id.clone()) {
            Err(TokenError::DuplicateTransaction { id: id.to_string() })
        } else {
            Ok(())
        }
    }

    fn ensure_custodial(&self, address: &Address) -> Result<()> {
        if self.base.custodial.contains(address) {
            Ok(())
        } else {
            Err(TokenError::NotCustodial {
                address: address.to_string(),
            })
        }
    }

    fn move_currency(&mut self, sender: &Address, receiver: &Address, amount: Amount) -> Result<()> {
        let have = self.account(sender).map_or(Amount::ZERO, |a| a.balance);
        let remaining = have
            .checked_sub(amount)
            .ok_or_else(|| TokenError::insufficient_balance(sender.as_str(), have, amount))?;
        self.account_mut(sender).balance = remaining;

        let recipient = self.account_mut(receiver);
        recipient.balance = recipient
            .balance
            .checked_add(amount)
            .ok_or_else(|| TokenError::invalid_amount("receiver balance overflow"))?;
        Ok(())
    }

    fn opt_in(&mut self, account: &Address, asset: AssetId) -> Result<()> {
        if !self.base.assets.contains_key(&asset) {
            return Err(TokenError::UnknownAsset(asset));
        }
        self.account_mut(account).holdings.entry(asset).or_insert(0);
        Ok(())
    }

    fn move_asset(
        &mut self,
        sender: &Address,
        receiver: &Address,
        asset: AssetId,
        amount: u64,
    ) -> Result<()> {
        if !self.base.assets.contains_key(&asset) {
            return Err(TokenError::UnknownAsset(asset));
        }
        if sender == receiver && amount == 0 {
            return self.opt_in(sender, asset);
        }

        let have = self
            .account(sender)
            .and_then(|a| a.holdings.get(&asset).copied())
            .ok_or_else(|| TokenError::not_opted_in(sender.as_str(), asset))?;
        if !self
            .account(receiver)
            .is_some_and(|a| a.holdings.contains_key(&asset))
        {
            return Err(TokenError::not_opted_in(receiver.as_str(), asset));
        }
        let remaining = have
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientAssetBalance {
                address: sender.to_string(),
                asset,
                have,
                need: amount,
            })?;

        self.account_mut(sender).holdings.insert(asset, remaining);
        let held = self.account_mut(receiver).holdings.entry(asset).or_insert(0);
        *held = held
            .checked_add(amount)
            .ok_or_else(|| TokenError::invalid_amount("receiver holding overflow"))?;
        Ok(())
    }

    fn apply_payment(&mut self, signed: &Signed<PaymentTxn>) -> Result<()> {
        signed.verify_signature()?;
        let txn = &signed.txn;
        self.mark_applied(txn.id())?;
        self.move_currency(&txn.sender, &txn.receiver, txn.amount)
    }

    fn apply_asset_transfer(&mut self, signed: &Signed<AssetTransferTxn>) -> Result<()> {
        signed.verify_signature()?;
        let txn = &signed.txn;
        self.mark_applied(txn.id())?;
        self.move_asset(&txn.sender, &txn.receiver, txn.asset, txn.amount)
    }

    fn apply_step(&mut self, step: &GroupStep) -> Result<()> {
        match step {
            GroupStep::Payment(signed) => self.apply_payment(signed),
            GroupStep::AssetTransfer(signed) => self.apply_asset_transfer(signed),
            GroupStep::InnerPayment {
                sender,
                receiver,
                amount,
            } => {
                self.ensure_custodial(sender)?;
                self.move_currency(sender, receiver, *amount)
            }
            GroupStep::InnerAssetTransfer {
                sender,
                receiver,
                asset,
                amount,
            } => {
                self.ensure_custodial(sender)?;
                self.move_asset(sender, receiver, *asset, *amount)
            }
        }
    }
}

/// In-process custody chain.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct SimulatedChain {
    state: Arc<Mutex<ChainSnapshot>>,
}

impl SimulatedChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::from_snapshot(ChainSnapshot::default())
    }

    /// Restore a chain from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: ChainSnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(snapshot)),
        }
    }

    /// Copy the current state.
    pub async fn snapshot(&self) -> ChainSnapshot {
        self.state.lock().await.clone()
    }

    /// Create an account whose outgoing transfers the chain authorises.
    ///
    /// # Errors
    ///
    /// Returns error if key generation fails.
    pub async fn create_custodial_account(&self) -> Result<Address> {
        let address = Wallet::generate()?.address().clone();
        let mut state = self.state.lock().await;
        state.custodial.insert(address.clone());
        state.account_mut(&address);
        info!(address = %address, "custodial account created");
        Ok(address)
    }

    /// Whether the chain authorises inner transfers from `address`.
    pub async fn is_custodial(&self, address: &Address) -> bool {
        self.state.lock().await.custodial.contains(address)
    }

    /// Credit currency to an address out of thin air.
    ///
    /// # Errors
    ///
    /// Returns error if the balance would overflow.
    pub async fn airdrop(&self, address: &Address, amount: Amount) -> Result<()> {
        let mut state = self.state.lock().await;
        let account = state.account_mut(address);
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| TokenError::invalid_amount("balance overflow"))?;

        info!(address = %address, amount = %amount, "airdrop completed");
        Ok(())
    }

    /// Create an asset, minting the whole supply to the creator.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters are invalid.
    pub async fn create_asset(&self, creator: &Wallet, params: AssetParams) -> Result<AssetId> {
        params.validate()?;
        let mut state = self.state.lock().await;
        let asset = AssetId::new(state.next_asset_id);
        state.next_asset_id += 1;
        let total = params.total;
        state.assets.insert(asset, params);
        state.account_mut(creator.address()).holdings.insert(asset, total);

        info!(asset = %asset, creator = %creator.address(), total, "asset created");
        Ok(asset)
    }

    /// Look up asset parameters.
    pub async fn asset_params(&self, asset: AssetId) -> Option<AssetParams> {
        self.state.lock().await.assets.get(&asset).cloned()
    }

    /// Currency balance of an address.
    pub async fn balance(&self, address: &Address) -> Amount {
        self.state
            .lock()
            .await
            .accounts
            .get(address)
            .map_or(Amount::ZERO, |a| a.balance)
    }

    /// Units of `asset` held by `address`, or `None` if not opted in.
    pub async fn asset_balance(&self, address: &Address, asset: AssetId) -> Option<u64> {
        self.state
            .lock()
            .await
            .accounts
            .get(address)
            .and_then(|a| a.holdings.get(&asset).copied())
    }

    /// All asset holdings of `address`, including opted-in zero balances.
    pub async fn holdings(&self, address: &Address) -> BTreeMap<AssetId, u64> {
        self.state
            .lock()
            .await
            .accounts
            .get(address)
            .map(|a| a.holdings.clone())
            .unwrap_or_default()
    }

    /// Whether `address` is opted in to `asset`.
    pub async fn is_opted_in(&self, address: &Address, asset: AssetId) -> bool {
        self.asset_balance(address, asset).await.is_some()
    }

    /// Apply a group atomically, returning the group ID.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error; no step is applied in that case.
    pub async fn execute(&self, group: TransactionGroup) -> Result<TransactionId> {
        let group_id = TransactionId::new();
        let mut state = self.state.lock().await;

        let mut draft = Draft::new(&state);
        for (index, step) in group.steps().iter().enumerate() {
            if let Err(e) = draft.apply_step(step) {
                debug!(group = %group_id, index, error = %e, "transaction group rejected");
                return Err(e);
            }
        }
        let changes = draft.into_changes();
        state.commit(changes);

        debug!(group = %group_id, steps = group.len(), "transaction group committed");
        Ok(group_id)
    }

    /// Opt a wallet in to an asset.
    ///
    /// # Errors
    ///
    /// Returns error if the asset is unknown.
    pub async fn opt_in(&self, wallet: &Wallet, asset: AssetId) -> Result<()> {
        let signed = Signed::sign(
            AssetTransferTxn::opt_in(wallet.address().clone(), asset),
            wallet,
        )?;
        self.execute(TransactionGroup::new().with(GroupStep::AssetTransfer(signed)))
            .await?;
        Ok(())
    }
}

impl Default for SimulatedChain {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for SimulatedChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedChain").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn funded_wallet(chain: &SimulatedChain, amount: Amount) -> Wallet {
        let wallet = Wallet::generate().expect("should generate");
        chain.airdrop(wallet.address(), amount).await.expect("should airdrop");
        wallet
    }

    async fn pay(
        chain: &SimulatedChain,
        from: &Wallet,
        to: &Address,
        amount: Amount,
    ) -> Result<Signed<PaymentTxn>> {
        let signed = Signed::sign(PaymentTxn::new(from.address().clone(), to.clone(), amount), from)?;
        chain
            .execute(TransactionGroup::new().with(GroupStep::Payment(signed.clone())))
            .await?;
        Ok(signed)
    }

    async fn send_asset(
        chain: &SimulatedChain,
        from: &Wallet,
        to: &Address,
        asset: AssetId,
        amount: u64,
    ) -> Result<()> {
        let signed = Signed::sign(
            AssetTransferTxn::new(from.address().clone(), to.clone(), asset, amount),
            from,
        )?;
        chain
            .execute(TransactionGroup::new().with(GroupStep::AssetTransfer(signed)))
            .await?;
        Ok(())
    }

    async fn widget(chain: &SimulatedChain, creator: &Wallet) -> AssetId {
        chain
            .create_asset(creator, AssetParams::new("Widget", "WDG", 2, 10_000).expect("params"))
            .await
            .expect("should create asset")
    }

    #[tokio::test]
    async fn test_balance_zero() {
        let chain = SimulatedChain::new();
        let wallet = Wallet::generate().expect("should generate");
        assert!(chain.balance(wallet.address()).await.is_zero());
    }

    #[tokio::test]
    async fn test_transfer() {
        let chain = SimulatedChain::new();
        let sender = funded_wallet(&chain, Amount::coins(100)).await;
        let recipient = Wallet::generate().expect("should generate");

        pay(&chain, &sender, recipient.address(), Amount::coins(30))
            .await
            .expect("should transfer");

        assert_eq!(chain.balance(sender.address()).await, Amount::coins(70));
        assert_eq!(chain.balance(recipient.address()).await, Amount::coins(30));
    }

    #[tokio::test]
    async fn test_transfer_insufficient_funds() {
        let chain = SimulatedChain::new();
        let sender = funded_wallet(&chain, Amount::coins(10)).await;
        let recipient = Wallet::generate().expect("should generate");

        let result = pay(&chain, &sender, recipient.address(), Amount::coins(20)).await;

        assert!(matches!(result.unwrap_err(), TokenError::InsufficientBalance { .. }));
        assert_eq!(chain.balance(sender.address()).await, Amount::coins(10));
    }

    #[tokio::test]
    async fn test_create_asset_mints_to_creator() {
        let chain = SimulatedChain::new();
        let creator = Wallet::generate().expect("should generate");
        let asset = widget(&chain, &creator).await;

        assert_eq!(asset, AssetId::new(FIRST_ASSET_ID));
        assert_eq!(chain.asset_balance(creator.address(), asset).await, Some(10_000));
        assert_eq!(chain.asset_params(asset).await.map(|p| p.decimals), Some(2));
    }

    #[tokio::test]
    async fn test_asset_transfer_requires_opt_in() {
        let chain = SimulatedChain::new();
        let creator = Wallet::generate().expect("should generate");
        let holder = Wallet::generate().expect("should generate");
        let asset = widget(&chain, &creator).await;

        let err = send_asset(&chain, &creator, holder.address(), asset, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::NotOptedIn { .. }));

        chain.opt_in(&holder, asset).await.expect("should opt in");
        send_asset(&chain, &creator, holder.address(), asset, 10)
            .await
            .expect("should transfer");
        assert_eq!(chain.asset_balance(holder.address(), asset).await, Some(10));
        assert_eq!(chain.asset_balance(creator.address(), asset).await, Some(9_990));
    }

    #[tokio::test]
    async fn test_opt_in_unknown_asset_fails() {
        let chain = SimulatedChain::new();
        let wallet = Wallet::generate().expect("should generate");
        let err = chain.opt_in(&wallet, AssetId::new(9)).await.unwrap_err();
        assert!(matches!(err, TokenError::UnknownAsset(_)));
    }

    #[tokio::test]
    async fn test_group_is_all_or_nothing() {
        let chain = SimulatedChain::new();
        let payer = funded_wallet(&chain, Amount::coins(5)).await;
        let payee = Wallet::generate().expect("should generate");

        let ok = Signed::sign(
            PaymentTxn::new(payer.address().clone(), payee.address().clone(), Amount::coins(2)),
            &payer,
        )
        .expect("sign");
        let too_much = Signed::sign(
            PaymentTxn::new(payer.address().clone(), payee.address().clone(), Amount::coins(4)),
            &payer,
        )
        .expect("sign");

        let group = TransactionGroup::new()
            .with(GroupStep::Payment(ok.clone()))
            .with(GroupStep::Payment(too_much));
        assert!(chain.execute(group).await.is_err());

        assert_eq!(chain.balance(payer.address()).await, Amount::coins(5));
        assert!(chain.balance(payee.address()).await.is_zero());

        // The rejected group left no replay mark behind.
        chain
            .execute(TransactionGroup::new().with(GroupStep::Payment(ok)))
            .await
            .expect("first step alone still applies");
        assert_eq!(chain.balance(payee.address()).await, Amount::coins(2));
    }

    #[tokio::test]
    async fn test_replay_rejected() {
        let chain = SimulatedChain::new();
        let payer = funded_wallet(&chain, Amount::coins(5)).await;
        let payee = Wallet::generate().expect("should generate");

        let signed = pay(&chain, &payer, payee.address(), Amount::coins(1))
            .await
            .expect("should transfer");
        let err = chain
            .execute(TransactionGroup::new().with(GroupStep::Payment(signed)))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::DuplicateTransaction { .. }));
        assert_eq!(chain.balance(payer.address()).await, Amount::coins(4));
    }

    #[tokio::test]
    async fn test_forged_signature_rejected() {
        let chain = SimulatedChain::new();
        let victim = funded_wallet(&chain, Amount::coins(5)).await;
        let thief = Wallet::generate().expect("should generate");

        let mut signed = Signed::sign(
            PaymentTxn::new(thief.address().clone(), thief.address().clone(), Amount::coins(5)),
            &thief,
        )
        .expect("sign");
        signed.txn.sender = victim.address().clone();

        let err = chain
            .execute(TransactionGroup::new().with(GroupStep::Payment(signed)))
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::InvalidSignature { .. }));
        assert_eq!(chain.balance(victim.address()).await, Amount::coins(5));
    }

    #[tokio::test]
    async fn test_inner_transfer_requires_custodial_sender() {
        let chain = SimulatedChain::new();
        let outsider = funded_wallet(&chain, Amount::coins(5)).await;
        let custody = chain.create_custodial_account().await.expect("custody");
        chain.airdrop(&custody, Amount::coins(5)).await.expect("airdrop");

        let steal = TransactionGroup::new().with(GroupStep::InnerPayment {
            sender: outsider.address().clone(),
            receiver: custody.clone(),
            amount: Amount::coins(1),
        });
        assert!(matches!(
            chain.execute(steal).await.unwrap_err(),
            TokenError::NotCustodial { .. }
        ));

        let refund = TransactionGroup::new().with(GroupStep::InnerPayment {
            sender: custody.clone(),
            receiver: outsider.address().clone(),
            amount: Amount::coins(1),
        });
        chain.execute(refund).await.expect("custodial payment");
        assert_eq!(chain.balance(outsider.address()).await, Amount::coins(6));
    }

    #[tokio::test]
    async fn test_inner_opt_in() {
        let chain = SimulatedChain::new();
        let creator = Wallet::generate().expect("should generate");
        let asset = widget(&chain, &creator).await;
        let custody = chain.create_custodial_account().await.expect("custody");

        assert!(!chain.is_opted_in(&custody, asset).await);
        chain
            .execute(TransactionGroup::new().with(GroupStep::InnerAssetTransfer {
                sender: custody.clone(),
                receiver: custody.clone(),
                asset,
                amount: 0,
            }))
            .await
            .expect("opt in");
        assert_eq!(chain.asset_balance(&custody, asset).await, Some(0));
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let chain = SimulatedChain::new();
        let creator = funded_wallet(&chain, Amount::coins(3)).await;
        let asset = widget(&chain, &creator).await;
        chain.create_custodial_account().await.expect("custody");

        let snapshot = chain.snapshot().await;
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let parsed: ChainSnapshot = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(snapshot, parsed);

        let restored = SimulatedChain::from_snapshot(parsed);
        assert_eq!(restored.balance(creator.address()).await, Amount::coins(3));
        assert_eq!(restored.asset_balance(creator.address(), asset).await, Some(10_000));
    }

    #[tokio::test]
    async fn test_same_transaction_twice_in_one_group_rejected() {
        let chain = SimulatedChain::new();
        let payer = funded_wallet(&chain, Amount::coins(5)).await;
        let payee = Wallet::generate().expect("should generate");
        let signed = Signed::sign(
            PaymentTxn::new(payer.address().clone(), payee.address().clone(), Amount::coins(1)),
            &payer,
        )
        .expect("sign");

        let err = chain
            .execute(
                TransactionGroup::new()
                    .with(GroupStep::Payment(signed.clone()))
                    .with(GroupStep::Payment(signed)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::DuplicateTransaction { .. }));
        assert_eq!(chain.balance(payer.address()).await, Amount::coins(5));
    }

    #[tokio::test]
    async fn test_group_only_changes_touched_accounts() {
        let chain = SimulatedChain::new();
        let payer = funded_wallet(&chain, Amount::coins(5)).await;
        let bystander = funded_wallet(&chain, Amount::coins(7)).await;
        let payee = Wallet::generate().expect("should generate");
        let before = chain.snapshot().await;

        pay(&chain, &payer, payee.address(), Amount::coins(2))
            .await
            .expect("pay");

        let after = chain.snapshot().await;
        assert_eq!(
            after.accounts.get(bystander.address()),
            before.accounts.get(bystander.address())
        );
        assert_eq!(after.accounts.len(), before.accounts.len() + 1);
        assert_eq!(after.applied.len(), before.applied.len() + 1);
        assert_eq!(chain.balance(payer.address()).await, Amount::coins(3));
    }
}
