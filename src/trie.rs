use std::borrow::Cow;

use crate::search::CommonPrefixIter;
use crate::view::TrieView;
use crate::{Cell, EncodeKey, NodeStorage, PrefixMatch, Utilization};

/// A finished double-array trie.
///
/// Produced by [`Builder`](crate::Builder) or loaded from raw arrays with
/// [`Trie::load`]. A trie is never mutated after construction and can be
/// shared between threads for concurrent reads.
#[derive(Clone, Debug)]
pub struct Trie<C: Cell = i32> {
    storage: NodeStorage<C>,
}

impl<C: Cell> Trie<C> {
    pub(crate) fn from_storage(storage: NodeStorage<C>) -> Self {
        Self { storage }
    }

    /// Wraps BASE and CHECK arrays previously taken from a trie of the same
    /// cell width.
    ///
    /// The arrays are not validated. Malformed input gives meaningless answers
    /// but never panics.
    pub fn load(base: Vec<C>, check: Vec<C>) -> Self {
        Self::from_storage(NodeStorage::from_raw(base, check))
    }

    #[inline]
    fn view(&self) -> TrieView<'_, C> {
        TrieView {
            base: self.storage.base_slice(),
            check: self.storage.check_slice(),
        }
    }

    /// Follows the edge labelled `code` out of `parent`.
    #[inline]
    pub fn traverse(&self, parent: usize, code: u8) -> Option<usize> {
        self.view().traverse(parent, code)
    }

    /// Returns true if `key` is stored. Malformed keys are never stored.
    pub fn contains<K: EncodeKey + ?Sized>(&self, key: &K) -> bool {
        key.encode_key()
            .is_ok_and(|bytes| self.view().contains(&bytes))
    }

    /// Returns true if the pre-encoded `key` is stored.
    #[inline]
    pub fn contains_bytes(&self, key: &[u8]) -> bool {
        self.view().contains(key)
    }

    /// Returns the record stored for `key`.
    pub fn lookup<K: EncodeKey + ?Sized>(&self, key: &K) -> Option<u32> {
        let bytes = key.encode_key().ok()?;
        self.view().lookup(&bytes)
    }

    /// Returns the record stored for the pre-encoded `key`.
    #[inline]
    pub fn lookup_bytes(&self, key: &[u8]) -> Option<u32> {
        self.view().lookup(key)
    }

    /// Common prefix search. Returns an iterator over every stored key that is
    /// a prefix of `key`, shortest first.
    pub fn common_prefix_search<K: EncodeKey + ?Sized>(
        &self,
        key: &K,
    ) -> impl Iterator<Item = PrefixMatch> + '_ {
        match key.encode_key() {
            Ok(bytes) => self.view().common_prefix_search(Cow::Owned(bytes)),
            Err(err) => {
                tracing::debug!(%err, "common prefix search on malformed key");
                CommonPrefixIter::empty(self.view())
            }
        }
    }

    /// Common prefix search over a pre-encoded key.
    pub fn common_prefix_search_bytes<'a>(
        &'a self,
        key: &'a [u8],
    ) -> impl Iterator<Item = PrefixMatch> + 'a {
        self.view().common_prefix_search(Cow::Borrowed(key))
    }

    /// Physical capacity of the node arrays.
    pub fn size(&self) -> usize {
        self.storage.size()
    }

    /// Space usage of the node arrays.
    pub fn utilization(&self) -> Utilization {
        self.storage.utilization()
    }

    /// Renders BASE and CHECK as text.
    pub fn dump(&self) -> String {
        self.storage.dump()
    }

    /// The BASE array, for serialization.
    pub fn base_buffer(&self) -> &[C] {
        self.storage.base_slice()
    }

    /// The CHECK array, for serialization.
    pub fn check_buffer(&self) -> &[C] {
        self.storage.check_slice()
    }

    /// Consumes the trie and returns its BASE and CHECK arrays.
    pub fn into_buffers(self) -> (Vec<C>, Vec<C>) {
        self.storage.into_raw()
    }

    /// Borrows the trie as a [`TrieRef`].
    pub fn as_trie_ref(&self) -> TrieRef<'_, C> {
        TrieRef::new(self.base_buffer(), self.check_buffer())
    }
}

/// A zero-copy trie over borrowed BASE and CHECK arrays, e.g. cells cast out
/// of a memory-mapped file.
#[derive(Clone, Copy, Debug)]
pub struct TrieRef<'a, C: Cell = i32> {
    base: &'a [C],
    check: &'a [C],
}

impl<'a, C: Cell> TrieRef<'a, C> {
    /// Wraps borrowed arrays. Like [`Trie::load`], the arrays are not validated.
    pub fn new(base: &'a [C], check: &'a [C]) -> Self {
        Self { base, check }
    }

    #[inline]
    fn view(&self) -> TrieView<'a, C> {
        TrieView {
            base: self.base,
            check: self.check,
        }
    }

    /// Follows the edge labelled `code` out of `parent`.
    #[inline]
    pub fn traverse(&self, parent: usize, code: u8) -> Option<usize> {
        self.view().traverse(parent, code)
    }

    /// Returns true if `key` is stored.
    pub fn contains<K: EncodeKey + ?Sized>(&self, key: &K) -> bool {
        key.encode_key()
            .is_ok_and(|bytes| self.view().contains(&bytes))
    }

    /// Returns the record stored for `key`.
    pub fn lookup<K: EncodeKey + ?Sized>(&self, key: &K) -> Option<u32> {
        let bytes = key.encode_key().ok()?;
        self.view().lookup(&bytes)
    }

    /// Common prefix search. Returns an iterator over every stored key that is
    /// a prefix of `key`, shortest first.
    pub fn common_prefix_search<K: EncodeKey + ?Sized>(
        &self,
        key: &K,
    ) -> impl Iterator<Item = PrefixMatch> + 'a {
        match key.encode_key() {
            Ok(bytes) => self.view().common_prefix_search(Cow::Owned(bytes)),
            Err(err) => {
                tracing::debug!(%err, "common prefix search on malformed key");
                CommonPrefixIter::empty(self.view())
            }
        }
    }

    /// Physical capacity of the node arrays.
    pub fn size(&self) -> usize {
        self.base.len().max(self.check.len())
    }

    /// Space usage of the node arrays.
    pub fn utilization(&self) -> Utilization {
        Utilization::of(self.check)
    }

    /// Copies the arrays into an owned [`Trie`].
    pub fn to_owned(&self) -> Trie<C> {
        Trie::load(self.base.to_vec(), self.check.to_vec())
    }
}
