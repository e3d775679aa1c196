//! The free list of unused nodes, threaded through the node arrays.
//!
//! An unused node keeps its backward link as `BASE = -prev` and its forward
//! link as `CHECK = -next`. The head is `NodeStorage::first_unused`. Past the
//! physical end every cell reads as linked to its two neighbours, so the list
//! continues without bound into unallocated space.

use crate::storage::ROOT;
use crate::{Cell, NodeStorage};

impl<C: Cell> NodeStorage<C> {
    /// Returns true if `id` is not the root and its CHECK is negative.
    #[inline]
    pub(crate) fn is_unused(&self, id: i64) -> bool {
        id != ROOT && self.check.get(id) < 0
    }

    /// Forward link of an unused node.
    #[inline]
    pub(crate) fn next_unused(&self, id: i64) -> i64 {
        -self.check.get(id)
    }

    /// Backward link of an unused node.
    #[inline]
    pub(crate) fn prev_unused(&self, id: i64) -> i64 {
        -self.base.get(id)
    }

    /// Removes an unused node from the free list, advancing the head if the
    /// node was the head.
    ///
    /// The node is made physical before its links are read, so growth has
    /// already repaired its backward link.
    pub(crate) fn unsplice(&mut self, id: usize) {
        debug_assert!(self.is_unused(id as i64), "node {id} is already in use");
        self.reserve(id);

        let prev = self.prev_unused(id as i64);
        let next = self.next_unused(id as i64);
        if id as i64 == self.first_unused {
            self.first_unused = next;
        } else {
            self.set_check(prev as usize, -next);
        }
        if next <= C::MAX {
            self.set_base(next as usize, -prev);
        }
    }

    /// Takes an unused node out of the free list and attaches it to `parent`.
    pub(crate) fn allocate(&mut self, id: usize, parent: usize) {
        self.unsplice(id);
        self.set_check(id, parent as i64);
    }

    /// Walks the free list forward from the head, up to `C::MAX`, the last id
    /// the cell width can address.
    pub(crate) fn free_nodes(&self) -> FreeNodes<'_, C> {
        FreeNodes {
            storage: self,
            next: self.first_unused,
            limit: C::MAX,
        }
    }
}

pub(crate) struct FreeNodes<'a, C: Cell> {
    storage: &'a NodeStorage<C>,
    next: i64,
    limit: i64,
}

impl<C: Cell> Iterator for FreeNodes<'_, C> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.next <= ROOT || self.next > self.limit {
            return None;
        }
        let id = self.next;
        self.next = self.storage.next_unused(id);
        Some(id as usize)
    }
}
