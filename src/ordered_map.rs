//! Insertion-ordered map with unique keys.
//!
//! [`OrderedMap`] is the storage substrate for every component collection and every keyed
//! collection inside the document model. Lookup, insertion and removal go through an
//! [`IndexMap`] (a hash index from key to slot), while iteration and equality follow insertion
//! order. Unlike `IndexMap`, two `OrderedMap`s are only equal when their entries appear in the
//! same order, which keeps serialized output and round-trip comparisons deterministic.

use std::{borrow::Borrow, fmt, hash::Hash, ops::Index};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
#[serde(
    transparent,
    bound(
        serialize = "K: Serialize, V: Serialize",
        deserialize = "K: Deserialize<'de> + Hash + Eq, V: Deserialize<'de>"
    )
)]
pub struct OrderedMap<K, V>(IndexMap<K, V>);

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        OrderedMap(IndexMap::default())
    }
}

impl<K, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, K, V> {
        self.0.iter_mut()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, K, V> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, K, V> {
        self.0.values()
    }

    pub fn values_mut(&mut self) -> indexmap::map::ValuesMut<'_, K, V> {
        self.0.values_mut()
    }

    /// Entry at a given insertion position.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.0.get_index(index)
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.0.first()
    }
}

impl<K: Hash + Eq, V> OrderedMap<K, V> {
    /// Insert `value` under `key`.
    ///
    /// A new key is appended. An existing key keeps its position and has its value replaced; the
    /// previous value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.0.insert(key, value)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.contains_key(key)
    }

    /// Remove `key`, shifting later entries down so the remaining order is unchanged.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.shift_remove(key)
    }

    /// Position of `key` in insertion order.
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.0.get_index_of(key)
    }

    /// First key of `other` (in `other`'s order) that is also present in `self`.
    pub fn first_shared_key<'a>(&self, other: &'a OrderedMap<K, V>) -> Option<&'a K> {
        other.keys().find(|key| self.contains_key(*key))
    }

    /// Merge `other` into `self`.
    ///
    /// Entries of `other` whose key is absent from `self` are appended in `other`'s order. For a
    /// key present in both, `on_collision(key, local, incoming)` decides the value to keep, or
    /// aborts the merge by returning an error. Entries visited before the error stay merged;
    /// callers needing all-or-nothing behavior check [`OrderedMap::first_shared_key`] first.
    pub fn merge<E, F>(&mut self, other: OrderedMap<K, V>, mut on_collision: F) -> Result<(), E>
    where
        F: FnMut(&K, &V, V) -> Result<V, E>,
    {
        for (key, incoming) in other.0 {
            match self.0.get_mut(&key) {
                Some(local) => {
                    let kept = on_collision(&key, &*local, incoming)?;
                    *local = kept;
                }
                None => {
                    self.0.insert(key, incoming);
                }
            }
        }
        Ok(())
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for OrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for OrderedMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, Q> Index<&Q> for OrderedMap<K, V>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        &self.0[key]
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        OrderedMap(IndexMap::from_iter(iter))
    }
}

impl<K: Hash + Eq, V> Extend<(K, V)> for OrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<K: Hash + Eq, V, const N: usize> From<[(K, V); N]> for OrderedMap<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
