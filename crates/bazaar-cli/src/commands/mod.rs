//! CLI command implementations.
//!
//! - [`account`] - Named accounts and assets in the sandbox
//! - [`market`] - Listing ledger operations

pub mod account;
pub mod market;

pub use account::AccountCommand;
pub use market::MarketCommand;
