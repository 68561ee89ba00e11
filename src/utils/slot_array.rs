//! Directly indexed storage that grows in fixed chunks.

/// The default number of slots added every time a `SlotArray` grows.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// `SlotArray` addresses values directly by index without any hashing,
/// which makes it the cheapest storage when indices are dense and reused,
/// like entity ids.
///
/// Capacity grows in multiples of the chunk size, and the whole backing
/// storage is released once the last value has been removed.
#[derive(Debug, Clone)]
pub struct SlotArray<V> {
    slots: Vec<Option<V>>,
    chunk: usize,
    len: usize,
}

impl<V> Default for SlotArray<V> {
    fn default() -> Self {
        SlotArray::new()
    }
}

impl<V> SlotArray<V> {
    /// Constructs a new, empty `SlotArray` with the default chunk size.
    pub fn new() -> Self {
        SlotArray::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Constructs a new, empty `SlotArray` that grows `chunk` slots at a time.
    ///
    /// # Panics
    ///
    /// Panics if `chunk` is zero.
    pub fn with_chunk_size(chunk: usize) -> Self {
        assert!(chunk > 0, "SlotArray chunk size must be greater than zero.");

        SlotArray {
            slots: Vec::new(),
            chunk,
            len: 0,
        }
    }

    /// Returns the number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of addressable slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the chunk size this array grows by.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk
    }

    /// Returns true if the slot at `index` is occupied.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Returns a reference to the value at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&V> {
        self.slots.get(index).and_then(|v| v.as_ref())
    }

    /// Returns a mutable reference to the value at `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut V> {
        self.slots.get_mut(index).and_then(|v| v.as_mut())
    }

    /// Returns a reference to the value at `index`, for call sites that
    /// already know the slot is occupied.
    ///
    /// # Panics
    ///
    /// Panics if the slot is empty.
    #[inline]
    pub fn get_unchecked(&self, index: usize) -> &V {
        match self.get(index) {
            Some(v) => v,
            None => panic!("SlotArray slot {} is empty.", index),
        }
    }

    /// Mutable counterpart of `get_unchecked`.
    ///
    /// # Panics
    ///
    /// Panics if the slot is empty.
    #[inline]
    pub fn get_unchecked_mut(&mut self, index: usize) -> &mut V {
        match self.get_mut(index) {
            Some(v) => v,
            None => panic!("SlotArray slot {} is empty.", index),
        }
    }

    /// Stores `value` at `index`, growing the array if needed. Returns the
    /// value previously stored there.
    pub fn insert(&mut self, index: usize, value: V) -> Option<V> {
        if index >= self.slots.len() {
            self.grow(index);
        }

        let prev = self.slots[index].replace(value);
        if prev.is_none() {
            self.len += 1;
        }

        prev
    }

    /// Empties the slot at `index` and returns its value.
    pub fn remove(&mut self, index: usize) -> Option<V> {
        let prev = self.slots.get_mut(index).and_then(|v| v.take());

        if prev.is_some() {
            self.len -= 1;
            if self.len == 0 {
                self.clear();
            }
        }

        prev
    }

    /// Drops every value and releases the backing storage.
    pub fn clear(&mut self) {
        self.slots = Vec::new();
        self.len = 0;
    }

    /// Returns an iterator over the occupied `(index, value)` pairs in
    /// ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &V)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (i, v)))
    }

    fn grow(&mut self, index: usize) {
        // Smallest multiple of the chunk size which is strictly greater than `index`.
        let capacity = (index / self.chunk + 1) * self.chunk;
        self.slots.resize_with(capacity, || None);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic() {
        let mut array = SlotArray::with_chunk_size(4);
        assert!(array.is_empty());
        assert_eq!(array.capacity(), 0);

        assert_eq!(array.insert(1, "a"), None);
        assert_eq!(array.capacity(), 4);
        assert_eq!(array.len(), 1);
        assert_eq!(array.get(1), Some(&"a"));
        assert_eq!(array.get(0), None);
        assert_eq!(array.get(100), None);

        assert_eq!(array.insert(1, "b"), Some("a"));
        assert_eq!(array.len(), 1);
        assert_eq!(*array.get_unchecked(1), "b");

        *array.get_unchecked_mut(1) = "c";
        assert_eq!(array.get(1), Some(&"c"));
    }

    #[test]
    fn grow_by_chunks() {
        let mut array = SlotArray::with_chunk_size(4);

        array.insert(3, 3);
        assert_eq!(array.capacity(), 4);

        array.insert(4, 4);
        assert_eq!(array.capacity(), 8);

        array.insert(17, 17);
        assert_eq!(array.capacity(), 20);
        assert_eq!(array.len(), 3);

        let occupied: Vec<_> = array.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(occupied, vec![(3, 3), (4, 4), (17, 17)]);
    }

    #[test]
    fn reset_when_empty() {
        let mut array = SlotArray::with_chunk_size(8);
        array.insert(2, 2);
        array.insert(5, 5);

        assert_eq!(array.remove(2), Some(2));
        assert_eq!(array.remove(2), None);
        assert_eq!(array.capacity(), 8);

        assert_eq!(array.remove(5), Some(5));
        assert!(array.is_empty());
        assert_eq!(array.capacity(), 0);
        assert_eq!(array.remove(5), None);
    }

    #[test]
    #[should_panic]
    fn unchecked_missing() {
        let array: SlotArray<u32> = SlotArray::new();
        array.get_unchecked(0);
    }

    #[test]
    #[should_panic]
    fn zero_chunk() {
        let _: SlotArray<u32> = SlotArray::with_chunk_size(0);
    }
}
