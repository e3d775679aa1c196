use std::borrow::Cow;
use std::iter;

use crate::search::CommonPrefixIter;
use crate::storage::{default_base, default_check};
use crate::{Cell, ROOT_ID, TERM_CODE};

/// A borrowed view over BASE and CHECK. All read operations are implemented
/// here and shared between `Trie` and `TrieRef`.
///
/// Cells past the end of a slice read as unallocated, so arrays of different
/// lengths or malformed links never index out of bounds.
#[derive(Clone, Copy)]
pub(crate) struct TrieView<'a, C: Cell> {
    pub(crate) base: &'a [C],
    pub(crate) check: &'a [C],
}

impl<'a, C: Cell> TrieView<'a, C> {
    #[inline]
    pub(crate) fn base_at(&self, id: usize) -> i64 {
        match self.base.get(id) {
            Some(c) => c.to_i64(),
            None => default_base(id as i64),
        }
    }

    #[inline]
    pub(crate) fn check_at(&self, id: usize) -> i64 {
        match self.check.get(id) {
            Some(c) => c.to_i64(),
            None => default_check(id as i64),
        }
    }

    /// Follows the edge labelled `code` out of `parent`.
    #[inline]
    pub(crate) fn traverse(&self, parent: usize, code: u8) -> Option<usize> {
        let child = self.base_at(parent).checked_add(i64::from(code))?;
        let child = usize::try_from(child).ok()?;
        if self.check_at(child) == parent as i64 {
            Some(child)
        } else {
            None
        }
    }

    /// Decodes the record of a leaf node. Non-leaf nodes have a positive BASE.
    #[inline]
    pub(crate) fn leaf_record(&self, id: usize) -> Option<u32> {
        let base = self.base_at(id);
        if base <= 0 {
            u32::try_from(-1 - base).ok()
        } else {
            None
        }
    }

    /// Walks `key` plus the terminal code, succeeding as soon as a leaf is reached.
    pub(crate) fn contains(&self, key: &[u8]) -> bool {
        let mut parent = ROOT_ID;
        for &code in key.iter().chain(iter::once(&TERM_CODE)) {
            let Some(child) = self.traverse(parent, code) else {
                return false;
            };
            if self.base_at(child) <= 0 {
                return true;
            }
            parent = child;
        }
        false
    }

    /// Walks `key` plus the terminal code and decodes the final node.
    pub(crate) fn lookup(&self, key: &[u8]) -> Option<u32> {
        let mut node = ROOT_ID;
        for &code in key.iter().chain(iter::once(&TERM_CODE)) {
            node = self.traverse(node, code)?;
        }
        self.leaf_record(node)
    }

    pub(crate) fn common_prefix_search(self, query: Cow<'a, [u8]>) -> CommonPrefixIter<'a, C> {
        CommonPrefixIter::new(self, query)
    }
}
