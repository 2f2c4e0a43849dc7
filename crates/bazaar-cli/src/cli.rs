//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Bazaar CLI - escrowed listings for fungible assets.
#[derive(Parser, Debug, Clone)]
#[command(name = "bazaar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the sandbox chain and listings.
    #[arg(short, long, env = "BAZAAR_STATE_DIR", default_value = ".bazaar")]
    pub state_dir: PathBuf,

    /// Market configuration file (TOML).
    #[arg(short, long, env = "BAZAAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a new sandbox with an empty chain and custody account.
    Init,

    /// Account management.
    Account {
        /// Account subcommand to execute.
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Asset management.
    Asset {
        /// Asset subcommand to execute.
        #[command(subcommand)]
        command: AssetCommands,
    },

    /// Listing operations.
    #[command(flatten)]
    Market(MarketCommands),
}

/// Account subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum AccountCommands {
    /// Generate a named account.
    Create {
        /// Local name for the account.
        name: String,
    },

    /// Credit an account with currency.
    Fund {
        /// Account name.
        name: String,
        /// Whole coins to credit.
        coins: u64,
    },

    /// Show balances of an account.
    Show {
        /// Account name.
        name: String,
    },
}

/// Asset subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum AssetCommands {
    /// Create an asset, minting the supply to the creator.
    Create {
        /// Creating account.
        creator: String,
        /// Asset name.
        name: String,
        /// Short unit name.
        #[arg(short, long, default_value = "UNIT")]
        unit_name: String,
        /// Decimals of one whole unit.
        #[arg(short, long, default_value_t = 0)]
        decimals: u8,
        /// Total supply in smallest units.
        #[arg(short, long)]
        total: u64,
    },
}

/// Listing subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum MarketCommands {
    /// Opt an account in to receive an asset.
    OptIn {
        /// Account name.
        account: String,
        /// Asset ID.
        asset: u64,
    },

    /// Pay the opt-in fee to let custody hold an asset.
    AllowAsset {
        /// Paying account.
        payer: String,
        /// Asset ID.
        asset: u64,
    },

    /// Create a listing: pay the listing fee and escrow units.
    List {
        /// Selling account.
        seller: String,
        /// Asset ID.
        asset: u64,
        /// Units to escrow.
        quantity: u64,
        /// Price per whole unit, in base units.
        #[arg(short, long)]
        price: u64,
        /// Listing nonce.
        #[arg(short, long, default_value_t = 0)]
        nonce: u64,
    },

    /// Escrow more units into an existing listing.
    Deposit {
        /// Selling account.
        seller: String,
        /// Asset ID.
        asset: u64,
        /// Units to escrow.
        quantity: u64,
        /// Listing nonce.
        #[arg(short, long, default_value_t = 0)]
        nonce: u64,
    },

    /// Change the price of a listing.
    SetPrice {
        /// Selling account.
        seller: String,
        /// Asset ID.
        asset: u64,
        /// New price per whole unit, in base units.
        price: u64,
        /// Listing nonce.
        #[arg(short, long, default_value_t = 0)]
        nonce: u64,
    },

    /// Show the payment a purchase would require.
    Quote {
        /// Listing owner.
        owner: String,
        /// Asset ID.
        asset: u64,
        /// Units to buy.
        quantity: u64,
        /// Listing nonce.
        #[arg(short, long, default_value_t = 0)]
        nonce: u64,
    },

    /// Buy units from a listing.
    Buy {
        /// Buying account.
        buyer: String,
        /// Listing owner.
        owner: String,
        /// Asset ID.
        asset: u64,
        /// Units to buy.
        quantity: u64,
        /// Listing nonce.
        #[arg(short, long, default_value_t = 0)]
        nonce: u64,
    },

    /// Close a listing and reclaim units and fee.
    Withdraw {
        /// Selling account.
        seller: String,
        /// Asset ID.
        asset: u64,
        /// Listing nonce.
        #[arg(short, long, default_value_t = 0)]
        nonce: u64,
    },

    /// Show listings.
    Listings {
        /// Only listings owned by this account.
        #[arg(short, long)]
        owner: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_init() {
        let cli = Cli::parse_from(["bazaar", "init"]);
        assert!(matches!(cli.command, Commands::Init));
        assert_eq!(cli.format, Format::Table);
    }

    #[test]
    fn parses_state_dir_and_format() {
        let cli = Cli::parse_from(["bazaar", "-s", "/tmp/x", "--format", "json", "listings"]);
        assert_eq!(cli.state_dir, PathBuf::from("/tmp/x"));
        assert_eq!(cli.format, Format::Json);
        assert!(matches!(
            cli.command,
            Commands::Market(MarketCommands::Listings { owner: None })
        ));
    }

    #[test]
    fn parses_list() {
        let cli = Cli::parse_from([
            "bazaar", "list", "alice", "1000", "500", "--price", "10", "--nonce", "2",
        ]);
        match cli.command {
            Commands::Market(MarketCommands::List {
                seller,
                asset,
                quantity,
                price,
                nonce,
            }) => {
                assert_eq!(seller, "alice");
                assert_eq!((asset, quantity, price, nonce), (1000, 500, 10, 2));
            }
            other => unreachable!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_account_fund() {
        let cli = Cli::parse_from(["bazaar", "account", "fund", "bob", "5"]);
        assert!(matches!(
            cli.command,
            Commands::Account {
                command: AccountCommands::Fund { coins: 5, .. }
            }
        ));
    }

    #[test]
    fn list_requires_price() {
        assert!(Cli::try_parse_from(["bazaar", "list", "alice", "1000", "500"]).is_err());
    }
}
