//! # bazaar-token
//!
//! Value-transfer primitives for the Bazaar listing marketplace.
//!
//! This crate provides:
//! - Payment currency amounts (base units, 6 decimals)
//! - Addresses and Ed25519 wallets
//! - Fungible asset metadata
//! - Signed payment and asset transfer transactions
//! - A simulated custody chain that applies transaction groups atomically
//!
//! ## Example
//!
//! ```rust,no_run
//! use bazaar_token::{Amount, AssetParams, SimulatedChain, Wallet};
//!
//! # async fn example() -> bazaar_token::Result<()> {
//! let chain = SimulatedChain::new();
//! let seller = Wallet::generate()?;
//! chain.airdrop(seller.address(), Amount::coins(10)).await?;
//!
//! let asset = chain
//!     .create_asset(&seller, AssetParams::new("Widget", "WDG", 2, 1_000_000)?)
//!     .await?;
//! println!("created asset {asset}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod asset;
pub mod chain;
pub mod error;
pub mod transaction;
pub mod wallet;

pub use amount::Amount;
pub use asset::{AssetId, AssetParams};
pub use chain::{ChainSnapshot, SimulatedChain};
pub use error::{Result, TokenError};
pub use transaction::{
    AssetTransferTxn, GroupStep, PaymentTxn, Signed, TransactionGroup, TransactionId,
};
pub use wallet::{Address, Wallet};

/// Payment currency ticker.
pub const CURRENCY_TICKER: &str = "BZR";

/// Payment currency decimals.
pub const CURRENCY_DECIMALS: u8 = 6;

/// One coin in base units.
pub const BASE_UNITS_PER_COIN: u64 = 1_000_000;

/// Largest decimals value an asset may declare (`10^19` is the largest power of ten in a `u64`).
pub const MAX_ASSET_DECIMALS: u8 = 19;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(CURRENCY_DECIMALS, 6);
        assert_eq!(BASE_UNITS_PER_COIN, 10u64.pow(u32::from(CURRENCY_DECIMALS)));
        assert!(10u64.checked_pow(u32::from(MAX_ASSET_DECIMALS)).is_some());
        assert!(10u64.checked_pow(u32::from(MAX_ASSET_DECIMALS) + 1).is_none());
    }
}
