//! Local sandbox: a simulated chain, named wallets and a listing ledger
//! persisted under one state directory.
//!
//! Everything lives in a single `sandbox.json` (chain snapshot, custody
//! address, fee schedule, wallet secrets and listings), replaced atomically
//! by [`Sandbox::save`]. The fee schedule is fixed at `init`: every listing
//! is refunded the fee it was created under.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bazaar_market::{
    ChainCustody, Custody, FeeSchedule, Ledger, ListingKey, ListingState, ListingStore, MarketConfig,
    MemoryStore,
};
use bazaar_token::{Address, ChainSnapshot, SimulatedChain, Wallet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CliError;

const STATE_FILE: &str = "sandbox.json";

#[derive(Serialize, Deserialize)]
struct SandboxState {
    chain: ChainSnapshot,
    custody: Address,
    fees: FeeSchedule,
    #[serde(default)]
    wallets: BTreeMap<String, String>,
    #[serde(default)]
    listings: Vec<ListingRecord>,
}

#[derive(Serialize, Deserialize)]
struct ListingRecord {
    key: ListingKey,
    state: ListingState,
}

/// An opened sandbox.
pub struct Sandbox {
    dir: PathBuf,
    chain: SimulatedChain,
    wallets: BTreeMap<String, Wallet>,
    ledger: Ledger<ChainCustody, MemoryStore>,
}

impl Sandbox {
    /// Create a new sandbox in `dir` charging the fees in `config`.
    ///
    /// # Errors
    ///
    /// Returns error if a sandbox already exists there or it cannot be written.
    pub async fn init(dir: impl AsRef<Path>, config: &MarketConfig) -> Result<Self, CliError> {
        let dir = dir.as_ref().to_path_buf();
        if dir.join(STATE_FILE).exists() {
            return Err(CliError::State(format!(
                "sandbox already initialised at {}",
                dir.display()
            )));
        }
        fs::create_dir_all(&dir)?;

        let chain = SimulatedChain::new();
        let custody = ChainCustody::open(chain.clone()).await?;
        let sandbox = Self {
            dir,
            chain,
            wallets: BTreeMap::new(),
            ledger: Ledger::new(custody, MemoryStore::new(), config.fees),
        };
        sandbox.save().await?;

        info!(
            dir = %sandbox.dir.display(),
            custody = %sandbox.custody_address(),
            listing_fee = %config.fees.listing_fee(),
            "sandbox initialised"
        );
        Ok(sandbox)
    }

    /// Open an existing sandbox in `dir`.
    ///
    /// The fee schedule stored at `init` is used. A `config` whose fees
    /// differ from it is rejected.
    ///
    /// # Errors
    ///
    /// Returns error if the sandbox is missing, its state is corrupt, or
    /// `config` disagrees with the stored fee schedule.
    pub async fn open(
        dir: impl AsRef<Path>,
        config: Option<&MarketConfig>,
    ) -> Result<Self, CliError> {
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(STATE_FILE);
        let bytes = fs::read(&path).map_err(|e| {
            CliError::State(format!(
                "no sandbox at {} ({e}); run `bazaar init` first",
                dir.display()
            ))
        })?;
        let state: SandboxState = serde_json::from_slice(&bytes)?;

        if let Some(config) = config.filter(|c| c.fees != state.fees) {
            return Err(CliError::Config(format!(
                "fee schedule differs from the one fixed at init \
                 (listing fee {} vs {}, opt-in fee {} vs {})",
                config.fees.listing_fee(),
                state.fees.listing_fee(),
                config.fees.opt_in_fee(),
                state.fees.opt_in_fee(),
            )));
        }

        let wallets = state
            .wallets
            .iter()
            .map(|(name, secret)| Ok((name.clone(), Wallet::from_base58_secret(secret)?)))
            .collect::<Result<BTreeMap<_, _>, CliError>>()?;

        let chain = SimulatedChain::from_snapshot(state.chain);
        let custody = ChainCustody::attach(chain.clone(), state.custody).await?;
        let store: MemoryStore = state
            .listings
            .into_iter()
            .map(|r| (r.key, r.state))
            .collect();
        debug!(
            dir = %dir.display(),
            accounts = wallets.len(),
            listings = store.len(),
            "sandbox opened"
        );

        Ok(Self {
            dir,
            chain,
            wallets,
            ledger: Ledger::new(custody, store, state.fees),
        })
    }

    /// Persist chain, wallets and listings as one snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if the state file cannot be written; the previous
    /// snapshot is then left in place.
    pub async fn save(&self) -> Result<(), CliError> {
        let state = SandboxState {
            chain: self.chain.snapshot().await,
            custody: self.custody_address().clone(),
            fees: *self.ledger.fees(),
            wallets: self
                .wallets
                .iter()
                .map(|(name, wallet)| (name.clone(), wallet.secret_key_base58()))
                .collect(),
            listings: self
                .ledger
                .listings()
                .await
                .into_iter()
                .map(|(key, state)| ListingRecord { key, state })
                .collect(),
        };
        let path = self.dir.join(STATE_FILE);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&state)?)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), listings = state.listings.len(), "sandbox saved");
        Ok(())
    }

    /// The simulated chain.
    #[must_use]
    pub fn chain(&self) -> &SimulatedChain {
        &self.chain
    }

    /// The listing ledger.
    #[must_use]
    pub fn ledger(&self) -> &Ledger<ChainCustody, MemoryStore> {
        &self.ledger
    }

    /// Address of the custodial account.
    #[must_use]
    pub fn custody_address(&self) -> &Address {
        self.ledger.custody().address()
    }

    /// Generate and remember a named wallet.
    ///
    /// # Errors
    ///
    /// Returns error if the name is taken or key generation fails.
    pub fn create_account(&mut self, name: &str) -> Result<&Wallet, CliError> {
        if self.wallets.contains_key(name) {
            return Err(CliError::InvalidArgument(format!(
                "account '{name}' already exists"
            )));
        }
        let wallet = Wallet::generate()?;
        Ok(self.wallets.entry(name.to_string()).or_insert(wallet))
    }

    /// Wallet by name.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::AccountNotFound`] for unknown names.
    pub fn wallet(&self, name: &str) -> Result<&Wallet, CliError> {
        self.wallets
            .get(name)
            .ok_or_else(|| CliError::AccountNotFound(name.to_string()))
    }
}
