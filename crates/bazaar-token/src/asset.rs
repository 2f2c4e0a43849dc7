//! Fungible asset identifiers and metadata.

use crate::MAX_ASSET_DECIMALS;
use crate::error::{Result, TokenError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a fungible asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(u64);

impl AssetId {
    /// Wrap a raw asset identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for AssetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Immutable parameters of a fungible asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    /// Human-readable asset name.
    pub name: String,
    /// Short unit name.
    pub unit_name: String,
    /// Number of decimals; one whole unit is `10^decimals` smallest units.
    pub decimals: u8,
    /// Total supply in smallest units.
    pub total: u64,
}

impl AssetParams {
    /// Create validated asset parameters.
    ///
    /// # Errors
    ///
    /// Returns error if decimals exceed [`MAX_ASSET_DECIMALS`] or the supply is zero.
    pub fn new(
        name: impl Into<String>,
        unit_name: impl Into<String>,
        decimals: u8,
        total: u64,
    ) -> Result<Self> {
        let params = Self {
            name: name.into(),
            unit_name: unit_name.into(),
            decimals,
            total,
        };
        params.validate()?;
        Ok(params)
    }

    /// Validate the parameters.
    ///
    /// # Errors
    ///
    /// Returns error if decimals exceed [`MAX_ASSET_DECIMALS`] or the supply is zero.
    pub fn validate(&self) -> Result<()> {
        if self.decimals > MAX_ASSET_DECIMALS {
            return Err(TokenError::InvalidAsset {
                message: format!(
                    "decimals must be at most {MAX_ASSET_DECIMALS}, got {}",
                    self.decimals
                ),
            });
        }
        if self.total == 0 {
            return Err(TokenError::InvalidAsset {
                message: "total supply must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Smallest units per whole unit (`10^decimals`).
    #[must_use]
    pub fn scale(&self) -> u128 {
        10u128.pow(u32::from(self.decimals))
    }
}
