//! Dense bidirectional index maps.
//!
//! A pass works in three coordinate spaces: native node indices, compacted
//! solver-local indices and register/color indices. [`BiMap`] maps a sparse
//! set of native indices onto a dense `0..len()` range and back in O(1).

/// Vector backed bijection between native indices and `0..len()`.
#[derive(Debug, Clone, Default)]
pub struct BiMap {
    /// Native index to local index.
    to_local: Vec<Option<usize>>,
    /// Local index to native index.
    to_native: Vec<usize>,
}

impl BiMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map numbering `natives` in iteration order.
    pub fn from_natives(natives: impl IntoIterator<Item = usize>) -> Self {
        let mut map = Self::new();
        for native in natives {
            map.insert(native);
        }
        map
    }

    /// Add `native` to the map, returning its local index. Inserting a
    /// native index twice returns the existing local index.
    pub fn insert(&mut self, native: usize) -> usize {
        if native >= self.to_local.len() {
            self.to_local.resize(native + 1, None);
        }
        if let Some(local) = self.to_local[native] {
            return local;
        }

        let local = self.to_native.len();
        self.to_local[native] = Some(local);
        self.to_native.push(native);
        local
    }

    /// Local index of `native`, if it is mapped.
    pub fn local(&self, native: usize) -> Option<usize> {
        self.to_local.get(native).copied().flatten()
    }

    /// Native index of `local`.
    pub fn native(&self, local: usize) -> Option<usize> {
        self.to_native.get(local).copied()
    }

    pub fn contains(&self, native: usize) -> bool {
        self.local(native).is_some()
    }

    pub fn len(&self) -> usize {
        self.to_native.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_native.is_empty()
    }

    /// Mapped native indices in local order.
    pub fn natives(&self) -> &[usize] {
        &self.to_native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_numbering() {
        let map = BiMap::from_natives([7, 2, 40]);

        assert_eq!(map.len(), 3);
        assert_eq!(map.local(7), Some(0));
        assert_eq!(map.local(2), Some(1));
        assert_eq!(map.local(40), Some(2));
        assert_eq!(map.local(3), None);
        assert_eq!(map.local(1000), None);
        assert_eq!(map.natives(), &[7, 2, 40]);
    }

    #[test]
    fn test_inverse_is_exact() {
        let map = BiMap::from_natives([5, 0, 9, 3, 11]);

        for local in 0..map.len() {
            let native = map.native(local).unwrap();
            assert_eq!(map.local(native), Some(local));
        }
        assert_eq!(map.native(map.len()), None);
    }

    #[test]
    fn test_duplicate_insert() {
        let mut map = BiMap::new();
        assert!(map.is_empty());
        assert_eq!(map.insert(4), 0);
        assert_eq!(map.insert(4), 0);
        assert_eq!(map.insert(1), 1);
        assert_eq!(map.len(), 2);
        assert!(map.contains(1));
    }
}
