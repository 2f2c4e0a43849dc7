//! Account and asset commands.

use std::io::Write;

use bazaar_token::{Amount, AssetParams};

use crate::cli::{AccountCommands, AssetCommands};
use crate::error::CliError;
use crate::output::{AccountView, AssetView, Holding, OutputFormat};
use crate::sandbox::Sandbox;

/// Account and asset command executor.
pub struct AccountCommand<'a> {
    sandbox: &'a mut Sandbox,
}

impl<'a> AccountCommand<'a> {
    /// Create a new account command over `sandbox`.
    pub fn new(sandbox: &'a mut Sandbox) -> Self {
        Self { sandbox }
    }

    /// Execute an account subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    pub async fn execute<W: Write>(
        &mut self,
        writer: &mut W,
        format: &OutputFormat,
        command: &AccountCommands,
    ) -> Result<(), CliError> {
        match command {
            AccountCommands::Create { name } => {
                self.sandbox.create_account(name)?;
                format.write(writer, &self.view(name).await?)?;
            }
            AccountCommands::Fund { name, coins } => {
                let address = self.sandbox.wallet(name)?.address().clone();
                self.sandbox
                    .chain()
                    .airdrop(&address, Amount::coins(*coins))
                    .await?;
                format.write(writer, &self.view(name).await?)?;
            }
            AccountCommands::Show { name } => {
                format.write(writer, &self.view(name).await?)?;
            }
        }
        Ok(())
    }

    /// Execute an asset subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    pub async fn execute_asset<W: Write>(
        &mut self,
        writer: &mut W,
        format: &OutputFormat,
        command: &AssetCommands,
    ) -> Result<(), CliError> {
        match command {
            AssetCommands::Create {
                creator,
                name,
                unit_name,
                decimals,
                total,
            } => {
                let params = AssetParams::new(name.as_str(), unit_name.as_str(), *decimals, *total)
                    .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
                let wallet = self.sandbox.wallet(creator)?;
                let id = self
                    .sandbox
                    .chain()
                    .create_asset(wallet, params.clone())
                    .await?;
                format.write(writer, &AssetView { id, params })?;
            }
        }
        Ok(())
    }

    async fn view(&self, name: &str) -> Result<AccountView, CliError> {
        let address = self.sandbox.wallet(name)?.address().clone();
        let chain = self.sandbox.chain();
        let holdings = chain
            .holdings(&address)
            .await
            .into_iter()
            .map(|(asset, amount)| Holding { asset, amount })
            .collect();
        Ok(AccountView {
            name: name.to_string(),
            balance: chain.balance(&address).await,
            address,
            holdings,
        })
    }
}
