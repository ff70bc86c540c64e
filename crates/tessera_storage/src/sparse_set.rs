//! # Sparse Set
//!
//! Dense, swap-remove storage keyed by entity index.
//!
//! The set uses two arrays:
//! - `sparse`: entity index -> position in the dense arrays
//! - `dense`/`data`: packed ids and values, iterated contiguously
//!
//! Insert, remove and lookup are O(1). Removal moves the last element into
//! the freed position, so iteration order is not insertion order.

use crate::entity::EntityId;

/// Marker for an empty sparse slot.
const EMPTY: u32 = u32::MAX;

/// Packed storage for values of one type, keyed by [`EntityId`].
///
/// Lookups compare the full id (index and generation), so a stale id never
/// resolves to the value of the entity that reused its index.
#[derive(Debug)]
pub struct SparseSet<T> {
    /// Entity index -> dense position.
    sparse: Vec<u32>,
    /// Dense ids, parallel to `data`.
    dense: Vec<EntityId>,
    /// Dense values.
    data: Vec<T>,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Creates an empty set with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: Vec::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
            data: Vec::with_capacity(capacity),
        }
    }

    /// Number of stored values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the set holds no values.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    #[inline]
    fn position(&self, id: EntityId) -> Option<usize> {
        let slot = *self.sparse.get(id.index() as usize)?;
        if slot == EMPTY {
            return None;
        }
        let pos = slot as usize;
        (self.dense.get(pos) == Some(&id)).then_some(pos)
    }

    /// Checks whether `id` has a value in this set.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.position(id).is_some()
    }

    /// Inserts a value for `id`.
    ///
    /// # Returns
    ///
    /// The previous value if `id` was already present (it is replaced in place).
    pub fn insert(&mut self, id: EntityId, value: T) -> Option<T> {
        if let Some(pos) = self.position(id) {
            return Some(std::mem::replace(&mut self.data[pos], value));
        }

        let idx = id.index() as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, EMPTY);
        }
        // Dense positions are bounded by the number of live indices (< u32::MAX).
        #[allow(clippy::cast_possible_truncation)]
        let pos = self.dense.len() as u32;
        self.sparse[idx] = pos;
        self.dense.push(id);
        self.data.push(value);
        None
    }

    /// Removes the value for `id`, moving the last element into its place.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let pos = self.position(id)?;
        let last = self.dense.len() - 1;

        self.dense.swap(pos, last);
        self.data.swap(pos, last);
        let moved = self.dense[pos];
        self.sparse[moved.index() as usize] = pos as u32;
        self.sparse[id.index() as usize] = EMPTY;

        self.dense.pop();
        self.data.pop()
    }

    /// Gets the value stored for `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.position(id).map(|pos| &self.data[pos])
    }

    /// Gets the value stored for `id` mutably.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.position(id).map(|pos| &mut self.data[pos])
    }

    /// Packed ids, in dense order.
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        &self.dense
    }

    /// Iterates over `(id, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.dense.iter().copied().zip(self.data.iter())
    }
}
