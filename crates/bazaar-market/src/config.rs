//! Fee schedule and market configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! [fees]
//! box_flat_fee = 2500
//! box_byte_fee = 400
//! asset_opt_in_fee = 100000
//! ```

use std::path::{Path, PathBuf};

use bazaar_token::Amount;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::listing::LISTING_ENTRY_BYTES;

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Config is not valid TOML for this schema.
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but holds unusable values.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Storage and opt-in fees, in payment base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Flat fee per storage entry.
    pub box_flat_fee: u64,
    /// Fee per byte of storage entry.
    pub box_byte_fee: u64,
    /// Fee for registering custody to hold a new asset.
    pub asset_opt_in_fee: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            box_flat_fee: 2_500,
            box_byte_fee: 400,
            asset_opt_in_fee: 100_000,
        }
    }
}

impl FeeSchedule {
    fn checked_listing_fee(&self) -> Option<u64> {
        self.box_byte_fee
            .checked_mul(LISTING_ENTRY_BYTES)?
            .checked_add(self.box_flat_fee)
    }

    /// Fee paid to create a listing and refunded on withdrawal.
    ///
    /// Saturates if the schedule overflows; [`MarketConfig::validate`]
    /// rejects such schedules.
    ///
    /// # Examples
    /// ```
    /// use bazaar_market::FeeSchedule;
    ///
    /// assert_eq!(FeeSchedule::default().listing_fee().base_units(), 28_100);
    /// ```
    #[must_use]
    pub fn listing_fee(&self) -> Amount {
        Amount::from_base_units(self.checked_listing_fee().unwrap_or(u64::MAX))
    }

    /// Fee paid to register custody for an asset.
    #[must_use]
    pub const fn opt_in_fee(&self) -> Amount {
        Amount::from_base_units(self.asset_opt_in_fee)
    }
}

/// Market configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Fee schedule.
    #[serde(default)]
    pub fees: FeeSchedule,
}

impl MarketConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fee is zero or overflows.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.fees.checked_listing_fee() {
            None => Err(ConfigError::Invalid(
                "listing fee overflows u64".to_string(),
            )),
            Some(0) => Err(ConfigError::Invalid(
                "listing fee must be greater than zero".to_string(),
            )),
            Some(_) => Ok(()),
        }
    }
}
