use std::borrow::Cow;

use crate::view::TrieView;
use crate::{codec, Cell, ROOT_ID, TERM_CODE};

/// Result of a common prefix search match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixMatch {
    /// The matched prefix, decoded back to text.
    pub key: String,
    /// Length of the matched prefix in encoded bytes.
    pub len: usize,
    /// The record stored for the prefix, if its terminal node is a leaf.
    pub record: Option<u32>,
}

/// Space usage of a node array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Utilization {
    /// Number of physical cells.
    pub all: usize,
    /// Number of cells with a negative CHECK.
    pub unused: usize,
    /// Ratio of used cells to all cells.
    pub efficiency: f64,
}

impl Utilization {
    pub(crate) fn new(all: usize, unused: usize) -> Self {
        let efficiency = if all == 0 {
            0.0
        } else {
            (all - unused) as f64 / all as f64
        };
        Self {
            all,
            unused,
            efficiency,
        }
    }

    pub(crate) fn of<C: Cell>(check: &[C]) -> Self {
        let unused = check.iter().filter(|c| c.to_i64() < 0).count();
        Self::new(check.len(), unused)
    }
}

/// Iterator over the stored keys that prefix a query, shortest first.
pub(crate) struct CommonPrefixIter<'a, C: Cell> {
    view: TrieView<'a, C>,
    query: Cow<'a, [u8]>,
    pos: usize,
    node_id: usize,
    done: bool,
}

impl<'a, C: Cell> CommonPrefixIter<'a, C> {
    pub(crate) fn new(view: TrieView<'a, C>, query: Cow<'a, [u8]>) -> Self {
        Self {
            view,
            query,
            pos: 0,
            node_id: ROOT_ID,
            done: false,
        }
    }

    pub(crate) fn empty(view: TrieView<'a, C>) -> Self {
        Self {
            done: true,
            ..Self::new(view, Cow::Borrowed(&[]))
        }
    }

    #[inline]
    fn try_advance(&mut self) -> bool {
        let Some(&code) = self.query.get(self.pos) else {
            return false;
        };
        match self.view.traverse(self.node_id, code) {
            Some(child) => {
                self.node_id = child;
                self.pos += 1;
                true
            }
            None => false,
        }
    }

    /// Probes the terminal edge of the current node.
    #[inline]
    fn check_terminal(&self) -> Option<PrefixMatch> {
        let terminal = self.view.traverse(self.node_id, TERM_CODE)?;
        let bytes = &self.query[..self.pos];
        Some(PrefixMatch {
            key: codec::decode(bytes),
            len: self.pos,
            record: self.view.leaf_record(terminal),
        })
    }
}

impl<C: Cell> Iterator for CommonPrefixIter<'_, C> {
    type Item = PrefixMatch;

    fn next(&mut self) -> Option<PrefixMatch> {
        while !self.done {
            if !self.try_advance() {
                self.done = true;
                break;
            }
            if let Some(m) = self.check_terminal() {
                return Some(m);
            }
        }
        None
    }
}
