//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use bazaar_market::{ListingKey, ListingState, Purchase, Withdrawal};
use bazaar_token::{Address, Amount, AssetId, AssetParams};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Get the current format.
    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Write a value in the selected format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }

    /// Write a value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Simple status message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Message text.
    pub message: String,
}

impl Message {
    /// Create a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "✓ {}", self.message)?;
        Ok(())
    }
}

/// Account balances.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    /// Local account name.
    pub name: String,
    /// On-chain address.
    pub address: Address,
    /// Currency balance.
    pub balance: Amount,
    /// Asset holdings the account is opted in to.
    pub holdings: Vec<Holding>,
}

/// One asset holding.
#[derive(Debug, Clone, Serialize)]
pub struct Holding {
    /// Asset ID.
    pub asset: AssetId,
    /// Units held.
    pub amount: u64,
}

impl TableDisplay for AccountView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Account: {}", self.name)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Address:  {}", self.address)?;
        writeln!(writer, "Balance:  {}", self.balance)?;
        if self.holdings.is_empty() {
            writeln!(writer, "Assets:   none")?;
        } else {
            writeln!(writer, "Assets:")?;
            for holding in &self.holdings {
                writeln!(writer, "  {:>10}  {}", holding.asset, holding.amount)?;
            }
        }
        Ok(())
    }
}

/// A created asset.
#[derive(Debug, Clone, Serialize)]
pub struct AssetView {
    /// Asset ID.
    pub id: AssetId,
    /// Asset parameters.
    #[serde(flatten)]
    pub params: AssetParams,
}

impl TableDisplay for AssetView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Asset {}", self.id)?;
        writeln!(writer, "  Name:      {} ({})", self.params.name, self.params.unit_name)?;
        writeln!(writer, "  Decimals:  {}", self.params.decimals)?;
        writeln!(writer, "  Supply:    {}", self.params.total)?;
        Ok(())
    }
}

/// One listing row.
#[derive(Debug, Clone, Serialize)]
pub struct ListingView {
    /// Listing owner.
    pub owner: Address,
    /// Escrowed asset.
    pub asset: AssetId,
    /// Listing nonce.
    pub nonce: u64,
    /// Escrowed units.
    pub deposited: u64,
    /// Price per whole unit.
    pub unitary_price: u64,
}

impl From<(ListingKey, ListingState)> for ListingView {
    fn from((key, state): (ListingKey, ListingState)) -> Self {
        Self {
            owner: key.owner,
            asset: key.asset,
            nonce: key.nonce,
            deposited: state.deposited,
            unitary_price: state.unitary_price,
        }
    }
}

impl TableDisplay for ListingView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Listing {}/{}/{}", self.owner, self.asset, self.nonce)?;
        writeln!(writer, "  Deposited:  {}", self.deposited)?;
        writeln!(writer, "  Price:      {}", self.unitary_price)?;
        Ok(())
    }
}

/// Listings for display.
#[derive(Debug, Clone, Serialize)]
pub struct ListingList {
    /// Listings, ordered by key.
    pub listings: Vec<ListingView>,
}

impl TableDisplay for ListingList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.listings.is_empty() {
            writeln!(writer, "No listings")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:<20}  {:>10}  {:>6}  {:>14}  {:>14}",
            "OWNER", "ASSET", "NONCE", "DEPOSITED", "PRICE"
        )?;
        writeln!(writer, "{}", "─".repeat(72))?;
        for listing in &self.listings {
            writeln!(
                writer,
                "{:<20}  {:>10}  {:>6}  {:>14}  {:>14}",
                truncate(listing.owner.as_str(), 20),
                listing.asset,
                listing.nonce,
                listing.deposited,
                listing.unitary_price
            )?;
        }
        writeln!(writer)?;
        writeln!(writer, "Total: {} listing(s)", self.listings.len())?;
        Ok(())
    }
}

/// Price quote.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteView {
    /// Units quoted.
    pub quantity: u64,
    /// Required payment.
    pub payment: Amount,
}

impl TableDisplay for QuoteView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{} unit(s) cost {}", self.quantity, self.payment)?;
        Ok(())
    }
}

impl TableDisplay for Purchase {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "✓ Bought {} unit(s) from {}", self.quantity, self.key)?;
        writeln!(writer, "  Paid:       {}", self.paid)?;
        writeln!(writer, "  Remaining:  {}", self.remaining)?;
        Ok(())
    }
}

impl TableDisplay for Withdrawal {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "✓ Closed listing {}", self.key)?;
        writeln!(writer, "  Returned:   {} unit(s)", self.quantity)?;
        writeln!(writer, "  Refund:     {}", self.refund)?;
        Ok(())
    }
}

/// Truncate a string to a maximum length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        format!("{}...", &s[..max_len - 3])
    } else {
        s[..max_len].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_token::Wallet;

    fn listing(nonce: u64) -> ListingView {
        let owner = Wallet::generate().expect("wallet").address().clone();
        ListingView::from((
            ListingKey::new(owner, AssetId::new(1_000), nonce),
            ListingState::new(1_500, 10),
        ))
    }

    #[test]
    fn default_format_is_table() {
        assert_eq!(OutputFormat::default().format(), Format::Table);
    }

    #[test]
    fn listing_list_table() {
        let list = ListingList {
            listings: vec![listing(1), listing(2)],
        };
        let output = OutputFormat::new(Format::Table)
            .to_string(&list)
            .expect("format");
        assert!(output.contains("OWNER"));
        assert!(output.contains("1500"));
        assert!(output.contains("Total: 2 listing(s)"));
    }

    #[test]
    fn empty_listing_list() {
        let list = ListingList { listings: vec![] };
        let output = OutputFormat::default().to_string(&list).expect("format");
        assert_eq!(output, "No listings\n");
    }

    #[test]
    fn listing_json() {
        let output = OutputFormat::new(Format::Json)
            .to_string(&listing(3))
            .expect("format");
        assert!(output.contains("\"deposited\": 1500"));
        assert!(output.contains("\"nonce\": 3"));
    }

    #[test]
    fn quote_table() {
        let quote = QuoteView {
            quantity: 100,
            payment: Amount::from_base_units(1_500_000),
        };
        let output = OutputFormat::default().to_string(&quote).expect("format");
        assert_eq!(output, "100 unit(s) cost 1.500000 BZR\n");
    }

    #[test]
    fn truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 10), "hello");
    }
}
