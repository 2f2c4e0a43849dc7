//! Caller identity and authorization of ledger operations.

use std::fmt;

use bazaar_token::{Address, Wallet};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::listing::ListingKey;

/// Authenticated account invoking a ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Caller {
    address: Address,
}

impl Caller {
    /// Caller holding `wallet`'s signing key.
    #[must_use]
    pub fn from_wallet(wallet: &Wallet) -> Self {
        Self {
            address: wallet.address().clone(),
        }
    }

    /// The caller's account.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

/// Ledger operations subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Register custody for an asset.
    AllowAsset,
    /// Create a listing.
    FirstDeposit,
    /// Add units to a listing.
    Deposit,
    /// Change a listing's price.
    SetUnitaryPrice,
    /// Purchase from a listing.
    Buy,
    /// Close a listing.
    Withdraw,
}

impl Operation {
    /// Whether only the listing owner may perform the operation.
    #[must_use]
    pub const fn owner_only(self) -> bool {
        matches!(
            self,
            Self::FirstDeposit | Self::Deposit | Self::SetUnitaryPrice | Self::Withdraw
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AllowAsset => "allow_asset",
            Self::FirstDeposit => "first_deposit",
            Self::Deposit => "deposit",
            Self::SetUnitaryPrice => "set_unitary_price",
            Self::Buy => "buy",
            Self::Withdraw => "withdraw",
        };
        f.write_str(name)
    }
}

/// Check that `caller` may perform `operation` on the listing at `key`.
///
/// # Errors
///
/// Returns [`LedgerError::Unauthorized`] when an owner-only operation is
/// attempted by someone other than the key's owner.
pub fn authorize(caller: &Caller, key: &ListingKey, operation: Operation) -> Result<(), LedgerError> {
    if operation.owner_only() && caller.address() != &key.owner {
        return Err(LedgerError::Unauthorized {
            caller: caller.address().clone(),
            owner: key.owner.clone(),
            operation,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_token::AssetId;
    use test_case::test_case;

    #[test_case(Operation::FirstDeposit => true)]
    #[test_case(Operation::Deposit => true)]
    #[test_case(Operation::SetUnitaryPrice => true)]
    #[test_case(Operation::Withdraw => true)]
    #[test_case(Operation::Buy => false)]
    #[test_case(Operation::AllowAsset => false)]
    fn owner_only(op: Operation) -> bool {
        op.owner_only()
    }

    #[test]
    fn owner_is_authorized() {
        let owner = Wallet::generate().expect("wallet");
        let key = ListingKey::new(owner.address().clone(), AssetId::new(1), 0);
        assert!(authorize(&Caller::from_wallet(&owner), &key, Operation::Withdraw).is_ok());
    }

    #[test]
    fn stranger_cannot_withdraw_but_can_buy() {
        let owner = Wallet::generate().expect("wallet");
        let stranger = Caller::from_wallet(&Wallet::generate().expect("wallet"));
        let key = ListingKey::new(owner.address().clone(), AssetId::new(1), 0);

        assert!(matches!(
            authorize(&stranger, &key, Operation::Withdraw),
            Err(LedgerError::Unauthorized {
                operation: Operation::Withdraw,
                ..
            })
        ));
        assert!(authorize(&stranger, &key, Operation::Buy).is_ok());
    }

    #[test]
    fn operation_display() {
        assert_eq!(Operation::SetUnitaryPrice.to_string(), "set_unitary_price");
    }
}
