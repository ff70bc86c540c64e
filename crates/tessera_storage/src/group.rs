//! # Persistent Groups
//!
//! A group is the set of entities that currently hold every component of a
//! fixed type set. The registry keeps it up to date on each matching insert
//! and removal, so iterating a group costs O(matches) instead of scanning
//! the largest pool.

use std::any::TypeId;

use crate::sparse_set::SparseSet;

/// Handle to a registered group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

/// Incrementally maintained intersection over a component type set.
#[derive(Debug)]
pub(crate) struct Group {
    /// Sorted, deduplicated component types.
    pub(crate) types: Box<[TypeId]>,
    pub(crate) members: SparseSet<()>,
}

impl Group {
    pub(crate) fn new(types: Box<[TypeId]>) -> Self {
        Self {
            types,
            members: SparseSet::new(),
        }
    }

    #[inline]
    pub(crate) fn involves(&self, type_id: TypeId) -> bool {
        self.types.binary_search(&type_id).is_ok()
    }
}

/// Sorts and deduplicates a type list so equal sets compare equal.
pub(crate) fn normalize(types: &[TypeId]) -> Box<[TypeId]> {
    let mut types = types.to_vec();
    types.sort_unstable();
    types.dedup();
    types.into_boxed_slice()
}
