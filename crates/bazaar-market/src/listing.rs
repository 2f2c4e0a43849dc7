//! Listing identity and state.

use bazaar_token::{Address, AssetId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoded size of one listing entry: key (32 + 8 + 8) plus value (8 + 8).
pub const LISTING_ENTRY_BYTES: u64 = 64;

/// Identity of a listing: one owner's escrow of one asset under one nonce.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListingKey {
    /// Seller that owns the escrow.
    pub owner: Address,
    /// Asset held in escrow.
    pub asset: AssetId,
    /// Disambiguates concurrent listings of the same asset by the same owner.
    pub nonce: u64,
}

impl ListingKey {
    /// Create a listing key.
    #[must_use]
    pub const fn new(owner: Address, asset: AssetId, nonce: u64) -> Self {
        Self {
            owner,
            asset,
            nonce,
        }
    }
}

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.owner, self.asset, self.nonce)
    }
}

/// Escrowed quantity and asking price of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingState {
    /// Escrowed but unsold units, in the asset's smallest unit.
    pub deposited: u64,
    /// Price of one whole asset unit in payment base units.
    pub unitary_price: u64,
}

impl ListingState {
    /// Create a listing state.
    #[must_use]
    pub const fn new(deposited: u64, unitary_price: u64) -> Self {
        Self {
            deposited,
            unitary_price,
        }
    }

    /// Same quantity at a new price.
    #[must_use]
    pub const fn with_price(self, unitary_price: u64) -> Self {
        Self {
            deposited: self.deposited,
            unitary_price,
        }
    }

    /// State after depositing `quantity` more units, or `None` on overflow.
    #[must_use]
    pub const fn after_deposit(self, quantity: u64) -> Option<Self> {
        match self.deposited.checked_add(quantity) {
            Some(deposited) => Some(Self {
                deposited,
                unitary_price: self.unitary_price,
            }),
            None => None,
        }
    }

    /// State after selling `quantity` units, or `None` if inventory is short.
    #[must_use]
    pub const fn after_sale(self, quantity: u64) -> Option<Self> {
        match self.deposited.checked_sub(quantity) {
            Some(deposited) => Some(Self {
                deposited,
                unitary_price: self.unitary_price,
            }),
            None => None,
        }
    }
}
