//! CLI error types.

use std::fmt;

use bazaar_market::{ConfigError, CustodyError, LedgerError};
use bazaar_token::TokenError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration.
    Config(String),
    /// Sandbox state is missing or unreadable.
    State(String),
    /// No account with this name.
    AccountNotFound(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// Ledger rejected the operation.
    Ledger(LedgerError),
    /// Chain rejected the operation.
    Chain(TokenError),
    /// Output formatting error.
    Format(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::State(msg) => write!(f, "sandbox error: {msg}"),
            Self::AccountNotFound(name) => write!(f, "account not found: {name}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Ledger(e) => write!(f, "ledger error: {e}"),
            Self::Chain(e) => write!(f, "chain error: {e}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

// Display includes the inner error, so `source()` stays `None`.
impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<LedgerError> for CliError {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

impl From<TokenError> for CliError {
    fn from(err: TokenError) -> Self {
        Self::Chain(err)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<CustodyError> for CliError {
    fn from(err: CustodyError) -> Self {
        Self::State(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::State(format!("invalid sandbox state: {err}"))
    }
}
