//! # bazaar-market
//!
//! Escrowed listing ledger for fungible assets.
//!
//! Sellers deposit asset units into per-listing escrow entries and set a
//! unit price; buyers purchase quantities by paying the computed price;
//! sellers withdraw unsold inventory and reclaim the listing fee.
//!
//! This crate provides:
//!
//! - [`Ledger`], the six state transitions over an injected [`ListingStore`]
//! - Collaborator traits for payment verification and custody settlement
//! - Integer pricing with widened intermediates
//! - Fee schedule and TOML configuration
//! - Explicit authorization of owner-only operations

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod custody;
pub mod error;
pub mod ledger;
pub mod listing;
pub mod pricing;
pub mod store;
pub mod verify;

pub use auth::{Caller, Operation, authorize};
pub use config::{ConfigError, FeeSchedule, MarketConfig};
pub use custody::{
    AssetTransferVerifier, ChainCustody, Custody, CustodyError, PaymentVerifier, Settlement,
    SettlementStep,
};
pub use error::LedgerError;
pub use ledger::{Ledger, Purchase, Withdrawal};
pub use listing::{LISTING_ENTRY_BYTES, ListingKey, ListingState};
pub use pricing::payment_for;
pub use store::{ListingStore, MemoryStore};
pub use verify::{Party, PaymentExpectation, TransferExpectation, VerifyError};
