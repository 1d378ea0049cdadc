//! Weighted multi-key authorities

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strata_primitives::{Address, KeyId};

/// A set of weighted keys and the weight needed to act
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Authority {
    /// Sum of weights required
    pub weight_threshold: u32,
    /// Key weights
    pub keys: BTreeMap<KeyId, u16>,
}

impl Authority {
    /// Empty authority with a threshold
    pub fn new(weight_threshold: u32) -> Self {
        Self {
            weight_threshold,
            keys: BTreeMap::new(),
        }
    }

    /// Authority satisfied by one key alone
    pub fn single_key(key: KeyId) -> Self {
        let mut authority = Self::new(1);
        authority.add_key(key, 1);
        authority
    }

    /// Add (or reweight) a key
    pub fn add_key(&mut self, key: KeyId, weight: u16) {
        self.keys.insert(key, weight);
    }

    /// Total weight of all keys
    pub fn total_weight(&self) -> u64 {
        self.keys.values().map(|w| *w as u64).sum()
    }

    /// No combination of signers can reach the threshold
    pub fn is_impossible(&self) -> bool {
        self.weight_threshold == 0 || self.total_weight() < self.weight_threshold as u64
    }

    /// Whether the signing addresses carry enough weight.
    ///
    /// `resolve` maps a key id to the address it represents; unknown keys
    /// contribute nothing.
    pub fn is_satisfied_by<F>(&self, signers: &BTreeSet<Address>, resolve: F) -> bool
    where
        F: Fn(KeyId) -> Option<Address>,
    {
        let mut weight: u64 = 0;
        for (key, key_weight) in &self.keys {
            if let Some(address) = resolve(*key) {
                if signers.contains(&address) {
                    weight += *key_weight as u64;
                    if weight >= self.weight_threshold as u64 {
                        return true;
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    fn resolve(key: KeyId) -> Option<Address> {
        if key.0 < 10 {
            Some(addr(key.0 as u8 + 1))
        } else {
            None
        }
    }

    #[test]
    fn test_single_key_authority() {
        let auth = Authority::single_key(KeyId::new(0));
        let signers: BTreeSet<_> = [addr(1)].into_iter().collect();
        assert!(auth.is_satisfied_by(&signers, resolve));
        assert!(!auth.is_satisfied_by(&BTreeSet::new(), resolve));
    }

    #[test]
    fn test_weighted_threshold() {
        let mut auth = Authority::new(3);
        auth.add_key(KeyId::new(0), 1);
        auth.add_key(KeyId::new(1), 2);
        auth.add_key(KeyId::new(2), 1);

        let one: BTreeSet<_> = [addr(2)].into_iter().collect();
        assert!(!auth.is_satisfied_by(&one, resolve));

        let two: BTreeSet<_> = [addr(1), addr(2)].into_iter().collect();
        assert!(auth.is_satisfied_by(&two, resolve));
    }

    #[test]
    fn test_unknown_key_contributes_nothing() {
        let auth = Authority::single_key(KeyId::new(42));
        let signers: BTreeSet<_> = [addr(43)].into_iter().collect();
        assert!(!auth.is_satisfied_by(&signers, resolve));
    }

    #[test]
    fn test_impossible_authority() {
        assert!(Authority::new(0).is_impossible());
        let mut auth = Authority::new(5);
        auth.add_key(KeyId::new(0), 4);
        assert!(auth.is_impossible());
        auth.add_key(KeyId::new(1), 1);
        assert!(!auth.is_impossible());
    }
}
