//! Growable bit-set used for entity signatures and query masks.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::component::ComponentTypeId;

/// Words kept inline before spilling to the heap. Two words cover the
/// first 128 component types.
const INLINE_WORDS: usize = 2;
const WORD_BITS: usize = 64;

/// Bit-set over component type ids. Trailing zero words are dropped on
/// removal, so equal sets always compare and hash equal.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitSet {
    bits: SmallVec<[u64; INLINE_WORDS]>,
}

/// The set of component types currently attached to an entity.
pub type Signature = BitSet;

impl BitSet {
    /// Creates a new, empty `BitSet`.
    pub fn new() -> Self {
        BitSet {
            bits: SmallVec::new(),
        }
    }

    /// Creates a `BitSet` from a list of component types.
    pub fn from_types<T>(types: T) -> Self
    where
        T: IntoIterator<Item = ComponentTypeId>,
    {
        let mut bs = BitSet::new();
        for v in types {
            bs.insert(v);
        }
        bs
    }

    /// Adds a value to the set. Returns true if it was not present.
    #[inline]
    pub fn insert(&mut self, id: ComponentTypeId) -> bool {
        let (index, bit_index) = Self::split(id);
        if self.bits.len() <= index {
            self.bits.resize(index + 1, 0);
        }

        let absent = self.bits[index] & (1u64 << bit_index) == 0;
        self.bits[index] |= 1u64 << bit_index;
        absent
    }

    /// Removes a value from the set. Returns true if it was present.
    #[inline]
    pub fn remove(&mut self, id: ComponentTypeId) -> bool {
        let (index, bit_index) = Self::split(id);
        if self.bits.len() <= index {
            return false;
        }

        let present = self.bits[index] & (1u64 << bit_index) != 0;
        self.bits[index] &= !(1u64 << bit_index);
        self.normalize();
        present
    }

    /// Returns `true` if this set contains the specified component type.
    #[inline]
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        let (index, bit_index) = Self::split(id);
        self.bits
            .get(index)
            .map(|v| v & (1u64 << bit_index) != 0)
            .unwrap_or(false)
    }

    /// Clears all bits in this set.
    #[inline]
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Returns whether there are no bits set in this set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|v| *v == 0)
    }

    /// Returns the number of bits set.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.iter().map(|v| v.count_ones() as usize).sum()
    }

    /// Returns true if every bit of `self` is also set in `rhs`.
    #[inline]
    pub fn is_subset(&self, rhs: &BitSet) -> bool {
        self.bits.iter().enumerate().all(|(i, v)| {
            let r = rhs.bits.get(i).cloned().unwrap_or(0);
            v & !r == 0
        })
    }

    /// Returns true if `self` and `rhs` share no bits.
    #[inline]
    pub fn is_disjoint(&self, rhs: &BitSet) -> bool {
        self.bits
            .iter()
            .zip(rhs.bits.iter())
            .all(|(lhs, rhs)| lhs & rhs == 0)
    }

    /// Returns an iterator over the component types in this set, in
    /// ascending order.
    #[inline]
    pub fn iter(&self) -> BitSetIter<'_> {
        BitSetIter {
            bitset: self,
            cursor: 0,
        }
    }

    fn normalize(&mut self) {
        while self.bits.last() == Some(&0) {
            self.bits.pop();
        }
    }

    #[inline]
    fn split(id: ComponentTypeId) -> (usize, usize) {
        let v = id.slot();
        (v / WORD_BITS, v % WORD_BITS)
    }
}

pub struct BitSetIter<'a> {
    bitset: &'a BitSet,
    cursor: usize,
}

impl<'a> Iterator for BitSetIter<'a> {
    type Item = ComponentTypeId;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.bitset.bits.len() * WORD_BITS;

        while self.cursor < len {
            let (index, bit_index) = (self.cursor / WORD_BITS, self.cursor % WORD_BITS);
            self.cursor += 1;

            if self.bitset.bits[index] & (1u64 << bit_index) != 0 {
                return Some(ComponentTypeId::new((self.cursor - 1) as u32));
            }
        }

        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn id(v: u32) -> ComponentTypeId {
        ComponentTypeId::new(v)
    }

    #[test]
    fn basic() {
        let mut bits = BitSet::new();

        assert!(!bits.contains(id(5)));
        assert!(bits.insert(id(5)));
        assert!(bits.contains(id(5)));

        assert!(bits.insert(id(9)));
        assert!(!bits.contains(id(12)));

        assert!(bits.insert(id(130)));
        assert!(bits.contains(id(130)));
        assert!(!bits.insert(id(5)));
        assert_eq!(bits.len(), 3);

        assert!(bits.remove(id(5)));
        assert!(!bits.remove(id(5)));
        assert!(!bits.contains(id(5)));
        assert!(bits.contains(id(9)));

        assert!(bits.remove(id(130)));
        assert!(!bits.remove(id(500)));
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![id(9)]);

        bits.clear();
        assert!(bits.is_empty());
        assert_eq!(bits, BitSet::new());
    }

    #[test]
    fn equality_ignores_growth() {
        let mut lhs = BitSet::new();
        lhs.insert(id(1));
        lhs.insert(id(200));
        lhs.remove(id(200));

        assert_eq!(lhs, BitSet::from_types(vec![id(1)]));
    }

    #[test]
    fn subset_and_disjoint() {
        let required = BitSet::from_types(vec![id(1), id(3)]);
        let excluded = BitSet::from_types(vec![id(70)]);

        let signature = BitSet::from_types(vec![id(1), id(2), id(3)]);
        assert!(required.is_subset(&signature));
        assert!(excluded.is_disjoint(&signature));

        let signature = BitSet::from_types(vec![id(1), id(70)]);
        assert!(!required.is_subset(&signature));
        assert!(!excluded.is_disjoint(&signature));

        assert!(BitSet::new().is_subset(&signature));
        assert!(BitSet::new().is_disjoint(&signature));
    }
}
