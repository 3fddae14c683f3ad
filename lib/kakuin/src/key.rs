//!
//! Key resolution
//!

use crate::BoxError;
use std::collections::HashMap;

/// Capability to look up a key by its key ID
///
/// Returning `Ok(None)` means the key ID is unknown. Errors are reserved for the lookup itself failing.
pub trait KeyResolver {
    /// Type of key this resolver hands out
    type Key;

    /// Resolve the key belonging to the key ID
    fn resolve(&self, key_id: &str) -> Result<Option<Self::Key>, BoxError>;
}

impl<K, F> KeyResolver for F
where
    F: Fn(&str) -> Result<Option<K>, BoxError>,
{
    type Key = K;

    #[inline]
    fn resolve(&self, key_id: &str) -> Result<Option<K>, BoxError> {
        (self)(key_id)
    }
}

/// In-memory key store
#[derive(Clone, Debug)]
pub struct KeyStore<K> {
    keys: HashMap<String, K>,
}

impl<K> KeyStore<K> {
    /// Create an empty key store
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Insert a key, returning the key previously stored under the same ID
    pub fn insert(&mut self, key_id: impl Into<String>, key: K) -> Option<K> {
        self.keys.insert(key_id.into(), key)
    }

    /// Builder-style variant of [`KeyStore::insert`]
    #[must_use]
    pub fn with(mut self, key_id: impl Into<String>, key: K) -> Self {
        self.insert(key_id, key);
        self
    }

    /// Whether the store holds no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K> Default for KeyStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> FromIterator<(String, K)> for KeyStore<K> {
    fn from_iter<T: IntoIterator<Item = (String, K)>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<K> KeyResolver for KeyStore<K>
where
    K: Clone,
{
    type Key = K;

    #[inline]
    fn resolve(&self, key_id: &str) -> Result<Option<K>, BoxError> {
        Ok(self.keys.get(key_id).cloned())
    }
}
