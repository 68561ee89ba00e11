//! Sparse keys mapped onto a densely packed value array.

use std::collections::HashMap;
use std::hash::Hash;
use std::slice;

/// One packed entry of a `SparseSet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
}

/// `SparseSet` maps sparse integer-like keys to values stored in one
/// contiguous array, giving O(1) amortized insert, remove and lookup plus
/// cache-friendly iteration over present values only.
///
/// Removal swaps the last dense entry into the freed position, so the
/// iteration order is unspecified and changes across removals.
#[derive(Debug, Clone)]
pub struct SparseSet<K, V>
where
    K: Copy + Eq + Hash,
{
    dense: Vec<Entry<K, V>>,
    sparse: HashMap<K, usize>,
}

impl<K, V> Default for SparseSet<K, V>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        SparseSet::new()
    }
}

impl<K, V> SparseSet<K, V>
where
    K: Copy + Eq + Hash,
{
    /// Constructs a new, empty `SparseSet`.
    pub fn new() -> Self {
        SparseSet {
            dense: Vec::new(),
            sparse: HashMap::new(),
        }
    }

    /// Constructs a new `SparseSet` with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        SparseSet {
            dense: Vec::with_capacity(capacity),
            sparse: HashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of present entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Returns true if there is a value under `key`.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.find(key).is_some()
    }

    /// Inserts `value` under `key`. If the key was present, the value is
    /// replaced in place and the old one returned; otherwise the entry is
    /// appended and `None` returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(index) = self.find(key) {
            return Some(::std::mem::replace(&mut self.dense[index].value, value));
        }

        self.sparse.insert(key, self.dense.len());
        self.dense.push(Entry { key, value });
        None
    }

    /// Returns a reference to the value under `key`.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.find(key).map(|index| &self.dense[index].value)
    }

    /// Returns a mutable reference to the value under `key`.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        match self.find(key) {
            Some(index) => Some(&mut self.dense[index].value),
            None => None,
        }
    }

    /// Removes and returns the value under `key` in O(1). The last packed
    /// entry takes over the freed position.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let index = self.sparse.remove(&key)?;
        let removed = self.dense.swap_remove(index);

        if index < self.dense.len() {
            let moved = self.dense[index].key;
            self.sparse.insert(moved, index);
        }

        Some(removed.value)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.dense.clear();
        self.sparse.clear();
    }

    /// Returns the first packed value, if any.
    #[inline]
    pub fn first(&self) -> Option<&V> {
        self.dense.first().map(|v| &v.value)
    }

    /// Returns the key of the first packed entry, if any.
    #[inline]
    pub fn first_key(&self) -> Option<K> {
        self.dense.first().map(|v| v.key)
    }

    /// Returns an iterator over the present keys.
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            iter: self.dense.iter(),
        }
    }

    /// Returns an iterator over the present values.
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.dense.iter().map(|v| &v.value)
    }

    /// Returns an iterator over the present `(key, value)` pairs.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.dense.iter().map(|v| (v.key, &v.value))
    }

    /// Returns an iterator over the present `(key, value)` pairs with
    /// mutable access to the values.
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> {
        self.dense.iter_mut().map(|v| (v.key, &mut v.value))
    }

    #[inline]
    fn find(&self, key: K) -> Option<usize> {
        let index = *self.sparse.get(&key)?;
        debug_assert!(index < self.dense.len() && self.dense[index].key == key);
        Some(index)
    }
}

/// Iterator over the keys of a `SparseSet`, in packed order.
#[derive(Clone)]
pub struct Keys<'a, K, V> {
    iter: slice::Iter<'a, Entry<K, V>>,
}

impl<'a, K: Copy, V> Iterator for Keys<'a, K, V> {
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<K> {
        self.iter.next().map(|v| v.key)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a, K: Copy, V> ExactSizeIterator for Keys<'a, K, V> {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic() {
        let mut set = SparseSet::new();
        assert!(set.is_empty());

        assert_eq!(set.insert(3u32, "a"), None);
        assert_eq!(set.insert(9u32, "b"), None);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(3), Some(&"a"));
        assert_eq!(set.get(9), Some(&"b"));
        assert_eq!(set.get(4), None);

        assert_eq!(set.insert(3, "c"), Some("a"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(3), Some(&"c"));

        *set.get_mut(9).unwrap() = "d";
        assert_eq!(set.get(9), Some(&"d"));
    }

    #[test]
    fn swap_remove_reindexes() {
        let mut set = SparseSet::new();
        set.insert(5u32, 50);
        set.insert(2u32, 20);

        assert_eq!(set.remove(5), Some(50));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(5), None);
        assert_eq!(set.get(2), Some(&20));
        assert_eq!(set.remove(5), None);
    }

    #[test]
    fn remove_every_position() {
        for victim in 0..8u32 {
            let mut set = SparseSet::new();
            for key in 0..8u32 {
                set.insert(key * 3, key);
            }

            assert_eq!(set.remove(victim * 3), Some(victim));
            assert_eq!(set.len(), 7);

            for key in 0..8u32 {
                if key == victim {
                    assert!(!set.contains(key * 3));
                } else {
                    assert_eq!(set.get(key * 3), Some(&key));
                }
            }
        }
    }

    #[test]
    fn iterate() {
        let mut set = SparseSet::new();
        for key in 0..10u32 {
            set.insert(key, key * 2);
        }

        set.remove(0);
        set.remove(7);

        let mut keys: Vec<_> = set.keys().collect();
        keys.sort();
        assert_eq!(keys, vec![1, 2, 3, 4, 5, 6, 8, 9]);

        for (key, value) in set.iter() {
            assert_eq!(*value, key * 2);
        }

        for (_, value) in set.iter_mut() {
            *value += 1;
        }

        assert_eq!(set.values().sum::<u32>(), keys.iter().map(|v| v * 2 + 1).sum());

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.first(), None);
        assert_eq!(set.get(1), None);
    }
}
