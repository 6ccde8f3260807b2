//! Ordered multimap used for headers and cookies.

use indexmap::IndexMap;

/// Keys in first-seen order, each with its values in insertion order.
///
/// Keys are compared exactly; no case folding is applied. Two maps are equal
/// only if their keys also appear in the same order.
#[derive(Debug, Clone)]
pub struct MultiMap<V> {
    entries: IndexMap<String, Vec<V>>,
}

impl<V> MultiMap<V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add a value under `key`, after any existing values.
    pub fn append(&mut self, key: impl Into<String>, value: V) {
        self.entries.entry(key.into()).or_default().push(value);
    }

    /// All values for `key`.
    pub fn get_all(&self, key: &str) -> Option<&[V]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// The first value for `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.get_all(key).and_then(|values| values.first())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate keys with their value lists.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[V])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

// `IndexMap` equality ignores key order; header order is significant here.
impl<V: PartialEq> PartialEq for MultiMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<V: Eq> Eq for MultiMap<V> {}

impl<V> Default for MultiMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for MultiMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.append(key, value);
        }
        map
    }
}
