//! Listing ledger commands.
//!
//! Each command signs the transactions an operation needs with the named
//! sandbox wallet and submits them to the ledger.

use std::io::Write;

use bazaar_market::{Caller, ListingKey};
use bazaar_token::{Amount, AssetId, AssetTransferTxn, PaymentTxn, Signed, Wallet};

use crate::cli::MarketCommands;
use crate::error::CliError;
use crate::output::{ListingList, ListingView, Message, OutputFormat, QuoteView};
use crate::sandbox::Sandbox;

/// Listing command executor.
pub struct MarketCommand<'a> {
    sandbox: &'a Sandbox,
}

impl<'a> MarketCommand<'a> {
    /// Create a new market command over `sandbox`.
    pub fn new(sandbox: &'a Sandbox) -> Self {
        Self { sandbox }
    }

    /// Execute a listing subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails or the ledger rejects the operation.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &MarketCommands,
    ) -> Result<(), CliError> {
        let ledger = self.sandbox.ledger();

        match command {
            MarketCommands::OptIn { account, asset } => {
                let wallet = self.sandbox.wallet(account)?;
                self.sandbox.chain().opt_in(wallet, AssetId::new(*asset)).await?;
                let msg = Message::new(format!("{account} opted in to asset {asset}"));
                format.write(writer, &msg)?;
            }
            MarketCommands::AllowAsset { payer, asset } => {
                let wallet = self.sandbox.wallet(payer)?;
                let fee = self.pay(wallet, ledger.fees().opt_in_fee())?;
                ledger
                    .allow_asset(&Caller::from_wallet(wallet), fee, AssetId::new(*asset))
                    .await?;
                let msg = Message::new(format!("custody now accepts asset {asset}"));
                format.write(writer, &msg)?;
            }
            MarketCommands::List {
                seller,
                asset,
                quantity,
                price,
                nonce,
            } => {
                let wallet = self.sandbox.wallet(seller)?;
                let asset = AssetId::new(*asset);
                let fee = self.pay(wallet, ledger.fees().listing_fee())?;
                let units = self.send_units(wallet, asset, *quantity)?;
                let state = ledger
                    .first_deposit(&Caller::from_wallet(wallet), fee, units, *nonce, *price)
                    .await?;
                let key = ListingKey::new(wallet.address().clone(), asset, *nonce);
                format.write(writer, &ListingView::from((key, state)))?;
            }
            MarketCommands::Deposit {
                seller,
                asset,
                quantity,
                nonce,
            } => {
                let wallet = self.sandbox.wallet(seller)?;
                let asset = AssetId::new(*asset);
                let units = self.send_units(wallet, asset, *quantity)?;
                let state = ledger
                    .deposit(&Caller::from_wallet(wallet), units, *nonce)
                    .await?;
                let key = ListingKey::new(wallet.address().clone(), asset, *nonce);
                format.write(writer, &ListingView::from((key, state)))?;
            }
            MarketCommands::SetPrice {
                seller,
                asset,
                price,
                nonce,
            } => {
                let wallet = self.sandbox.wallet(seller)?;
                let asset = AssetId::new(*asset);
                let state = ledger
                    .set_unitary_price(&Caller::from_wallet(wallet), asset, *nonce, *price)
                    .await?;
                let key = ListingKey::new(wallet.address().clone(), asset, *nonce);
                format.write(writer, &ListingView::from((key, state)))?;
            }
            MarketCommands::Quote {
                owner,
                asset,
                quantity,
                nonce,
            } => {
                let owner = self.sandbox.wallet(owner)?.address();
                let payment = ledger
                    .quote(owner, AssetId::new(*asset), *nonce, *quantity)
                    .await?;
                let quote = QuoteView {
                    quantity: *quantity,
                    payment,
                };
                format.write(writer, &quote)?;
            }
            MarketCommands::Buy {
                buyer,
                owner,
                asset,
                quantity,
                nonce,
            } => {
                let wallet = self.sandbox.wallet(buyer)?;
                let owner = self.sandbox.wallet(owner)?.address();
                let asset = AssetId::new(*asset);
                let amount = ledger.quote(owner, asset, *nonce, *quantity).await?;
                let payment = self.pay(wallet, amount)?;
                let purchase = ledger
                    .buy(&Caller::from_wallet(wallet), owner, asset, *nonce, payment, *quantity)
                    .await?;
                format.write(writer, &purchase)?;
            }
            MarketCommands::Withdraw {
                seller,
                asset,
                nonce,
            } => {
                let wallet = self.sandbox.wallet(seller)?;
                let withdrawal = ledger
                    .withdraw(&Caller::from_wallet(wallet), AssetId::new(*asset), *nonce)
                    .await?;
                format.write(writer, &withdrawal)?;
            }
            MarketCommands::Listings { owner } => {
                let entries = match owner {
                    Some(name) => {
                        let address = self.sandbox.wallet(name)?.address();
                        ledger.listings_by_owner(address).await
                    }
                    None => ledger.listings().await,
                };
                let list = ListingList {
                    listings: entries.into_iter().map(ListingView::from).collect(),
                };
                format.write(writer, &list)?;
            }
        }
        Ok(())
    }

    fn pay(&self, from: &Wallet, amount: Amount) -> Result<Signed<PaymentTxn>, CliError> {
        let txn = PaymentTxn::new(
            from.address().clone(),
            self.sandbox.custody_address().clone(),
            amount,
        );
        Ok(Signed::sign(txn, from)?)
    }

    fn send_units(
        &self,
        from: &Wallet,
        asset: AssetId,
        quantity: u64,
    ) -> Result<Signed<AssetTransferTxn>, CliError> {
        let txn = AssetTransferTxn::new(
            from.address().clone(),
            self.sandbox.custody_address().clone(),
            asset,
            quantity,
        );
        Ok(Signed::sign(txn, from)?)
    }
}
