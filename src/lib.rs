//! A byte-wise Double-Array Trie built once from a sorted key set.
//!
//! This crate provides [`Builder`], which lays out a set of `(key, record)`
//! pairs into the classic BASE/CHECK double array, and [`Trie`], which answers
//! membership, exact lookup and common prefix search over the finished arrays.
//! Keys are encoded to bytes with the codec in [`codec`]; every stored key ends
//! with the terminal code `0`.
//!
//! # Quick start
//!
//! ```
//! use doublearray::Builder;
//!
//! let mut builder = Builder::<i32>::new();
//! builder.append("a", 1).append("ab", 2).append("abc", 3);
//! let trie = builder.build().unwrap();
//!
//! assert_eq!(trie.lookup("ab"), Some(2));
//! assert!(!trie.contains("ac"));
//!
//! let prefixes: Vec<_> = trie.common_prefix_search("abcd").map(|m| m.key).collect();
//! assert_eq!(prefixes, ["a", "ab", "abc"]);
//! ```
//!
//! The raw arrays can be handed to any persistence layer and loaded back:
//!
//! ```
//! use doublearray::{Builder, Trie};
//!
//! let mut builder = Builder::<i32>::new();
//! builder.append("key", 7);
//! let (base, check) = builder.build().unwrap().into_buffers();
//!
//! let loaded = Trie::load(base, check);
//! assert_eq!(loaded.lookup("key"), Some(7));
//! ```

#![warn(missing_docs)]

mod build;
mod cell;
pub mod codec;
mod free_list;
mod key;
mod search;
mod storage;
mod trie;
mod view;

#[cfg(test)]
mod proptests;

pub use build::Builder;
pub use cell::Cell;
pub use key::EncodeKey;
pub use search::{PrefixMatch, Utilization};
pub use storage::NodeStorage;
pub use trie::{Trie, TrieRef};

/// Terminal code appended to every stored key.
pub const TERM_CODE: u8 = 0;

/// Index of the root node.
pub const ROOT_ID: usize = 0;

/// Sentinel used by callers that bridge [`Option`] results to a signed id.
pub const NOT_FOUND: i64 = -1;

/// Physical size of a builder's storage when no capacity is given.
pub const DEFAULT_INITIAL_SIZE: usize = 1024;

/// Factor applied to the requested index when node storage grows.
pub const MEMORY_EXPAND_RATIO: usize = 2;

/// Errors that can occur while encoding keys or building a trie.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TrieError {
    /// A UTF-16 key holds an unpaired surrogate at the given unit index.
    #[error("malformed surrogate pair at code unit {index}")]
    MalformedSurrogate {
        /// Index of the offending code unit.
        index: usize,
    },
    /// A record does not fit the leaf encoding of the chosen cell width.
    #[error("record {record} exceeds the maximum {max} for this cell width")]
    RecordOutOfRange {
        /// The rejected record.
        record: u32,
        /// Largest record the cell width can store.
        max: i64,
    },
    /// Keys declared as sorted are not in byte order.
    #[error("keys are not sorted by byte order at entry {index}")]
    UnsortedKeys {
        /// Index of the first entry found out of order.
        index: usize,
    },
    /// The trie needs a node id the chosen cell width cannot address.
    #[error("node id {id} exceeds the maximum {max} for this cell width")]
    CapacityExceeded {
        /// The first id that did not fit.
        id: i64,
        /// Largest node id the cell width can address.
        max: i64,
    },
}
