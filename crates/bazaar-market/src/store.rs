//! Listing storage.
//!
//! The ledger owns a [`ListingStore`] and never shares it. Stores are
//! infallible in-process maps; persisting them is the embedder's job and
//! happens once per operation, together with the custody chain, from
//! [`ListingStore::entries`].

use std::collections::HashMap;

use crate::listing::{ListingKey, ListingState};

/// Keyed map from listing identity to listing state.
pub trait ListingStore: Send {
    /// State of a listing, if present.
    fn get(&self, key: &ListingKey) -> Option<ListingState>;

    /// Insert or replace a listing.
    fn insert(&mut self, key: ListingKey, state: ListingState);

    /// Remove a listing, returning its last state.
    fn remove(&mut self, key: &ListingKey) -> Option<ListingState>;

    /// All listings, ordered by key.
    fn entries(&self) -> Vec<(ListingKey, ListingState)>;

    /// Whether a listing is present.
    fn contains(&self, key: &ListingKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of listings.
    fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the store holds no listings.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory listing store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    listings: HashMap<ListingKey, ListingState>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FromIterator<(ListingKey, ListingState)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (ListingKey, ListingState)>>(iter: I) -> Self {
        Self {
            listings: iter.into_iter().collect(),
        }
    }
}

impl ListingStore for MemoryStore {
    fn get(&self, key: &ListingKey) -> Option<ListingState> {
        self.listings.get(key).copied()
    }

    fn insert(&mut self, key: ListingKey, state: ListingState) {
        self.listings.insert(key, state);
    }

    fn remove(&mut self, key: &ListingKey) -> Option<ListingState> {
        self.listings.remove(key)
    }

    fn entries(&self) -> Vec<(ListingKey, ListingState)> {
        let mut entries: Vec<_> = self
            .listings
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    fn contains(&self, key: &ListingKey) -> bool {
        self.listings.contains_key(key)
    }

    fn len(&self) -> usize {
        self.listings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_token::{AssetId, Wallet};

    fn key(nonce: u64) -> ListingKey {
        let owner = Wallet::generate().expect("wallet").address().clone();
        ListingKey::new(owner, AssetId::new(1_000), nonce)
    }

    #[test]
    fn memory_store_crud() {
        let mut store = MemoryStore::new();
        let k = key(1);
        assert!(store.is_empty());

        store.insert(k.clone(), ListingState::new(10, 5));
        assert!(store.contains(&k));
        assert_eq!(store.get(&k), Some(ListingState::new(10, 5)));

        store.insert(k.clone(), ListingState::new(7, 5));
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove(&k), Some(ListingState::new(7, 5)));
        assert_eq!(store.remove(&k), None);
    }

    #[test]
    fn entries_are_sorted() {
        let owner = Wallet::generate().expect("wallet").address().clone();
        let store: MemoryStore = [3, 1, 2]
            .into_iter()
            .map(|n| {
                (
                    ListingKey::new(owner.clone(), AssetId::new(1), n),
                    ListingState::new(n, 0),
                )
            })
            .collect();
        let nonces: Vec<u64> = store.entries().iter().map(|(k, _)| k.nonce).collect();
        assert_eq!(nonces, vec![1, 2, 3]);
    }
}
