//! # bazaar-cli
//!
//! Command-line driver for a local Bazaar sandbox.
//!
//! Each invocation opens the sandbox in the state directory, runs one
//! command against its simulated chain and listing ledger, and saves the
//! result:
//!
//! ```text
//! bazaar init
//! bazaar account create alice
//! bazaar account fund alice 10
//! bazaar asset create alice Spice --decimals 2 --total 1000000
//! bazaar allow-asset alice 1000
//! bazaar list alice 1000 500 --price 10
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod sandbox;

pub use cli::{AccountCommands, AssetCommands, Cli, Commands, Format, MarketCommands};
pub use error::CliError;
pub use output::OutputFormat;
pub use sandbox::Sandbox;
