use crate::{
    codec, Cell, EncodeKey, NodeStorage, Trie, TrieError, DEFAULT_INITIAL_SIZE, ROOT_ID,
    TERM_CODE,
};

/// An encoded key, terminal code included, and its record.
#[derive(Clone, Debug)]
struct Entry {
    key: Vec<u8>,
    record: u32,
}

impl Entry {
    fn new(mut key: Vec<u8>, record: u32) -> Self {
        key.push(TERM_CODE);
        Self { key, record }
    }
}

/// A run of entries sharing the same byte at the current depth.
#[derive(Clone, Copy, Debug)]
struct Run {
    code: u8,
    start: usize,
    len: usize,
}

/// Collects `(key, record)` pairs and lays them out into a double array.
///
/// A builder is consumed by building; the resulting [`Trie`] takes over its
/// node storage.
///
/// ```
/// use doublearray::Builder;
///
/// let mut builder = Builder::<i32>::with_capacity(16);
/// builder.append("tokyo", 1).append("kyoto", 2).append_key("osaka");
/// let trie = builder.build().unwrap();
/// assert_eq!(trie.lookup("osaka"), Some(0));
/// ```
#[derive(Clone, Debug)]
pub struct Builder<C: Cell = i32> {
    storage: NodeStorage<C>,
    entries: Vec<Entry>,
}

impl<C: Cell> Builder<C> {
    /// Creates a builder whose storage starts at [`DEFAULT_INITIAL_SIZE`] cells.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_SIZE)
    }

    /// Creates a builder whose storage starts at `initial_size` cells
    /// (0 selects the default).
    pub fn with_capacity(initial_size: usize) -> Self {
        Self {
            storage: NodeStorage::new(initial_size),
            entries: Vec::new(),
        }
    }

    /// Stages a key with its record.
    pub fn append(&mut self, key: &str, record: u32) -> &mut Self {
        self.entries.push(Entry::new(codec::encode(key), record));
        self
    }

    /// Stages a key with record 0.
    pub fn append_key(&mut self, key: &str) -> &mut Self {
        self.append(key, 0)
    }

    /// Stages a UTF-16 key with its record.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::MalformedSurrogate`] and stages nothing if the key
    /// holds an unpaired surrogate.
    pub fn append_utf16(&mut self, key: &[u16], record: u32) -> Result<&mut Self, TrieError> {
        let bytes = codec::encode_utf16(key)?;
        self.entries.push(Entry::new(bytes, record));
        Ok(self)
    }

    /// Number of staged keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no key is staged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorts the staged keys by byte order and builds the trie.
    ///
    /// # Errors
    ///
    /// Returns [`TrieError::RecordOutOfRange`] or [`TrieError::CapacityExceeded`]
    /// if the key set does not fit the cell width.
    pub fn build(self) -> Result<Trie<C>, TrieError> {
        self.finish(false)
    }

    /// Builds the trie from staged keys the caller has already sorted by byte
    /// order.
    ///
    /// # Errors
    ///
    /// As [`build`](Self::build), plus [`TrieError::UnsortedKeys`] when the
    /// order turns out to be wrong.
    pub fn build_sorted(self) -> Result<Trie<C>, TrieError> {
        self.finish(true)
    }

    /// Builds the trie from `entries`, ignoring any staged keys.
    ///
    /// # Errors
    ///
    /// As [`build_sorted`](Self::build_sorted), plus the encoding error of the
    /// first malformed key.
    pub fn build_from<K, I>(mut self, entries: I, already_sorted: bool) -> Result<Trie<C>, TrieError>
    where
        K: EncodeKey,
        I: IntoIterator<Item = (K, u32)>,
    {
        self.entries = entries
            .into_iter()
            .map(|(key, record)| -> Result<Entry, TrieError> {
                Ok(Entry::new(key.encode_key()?, record))
            })
            .collect::<Result<_, _>>()?;
        self.finish(already_sorted)
    }

    fn finish(self, sorted: bool) -> Result<Trie<C>, TrieError> {
        let Self {
            mut storage,
            mut entries,
        } = self;

        if let Some(e) = entries.iter().find(|e| i64::from(e.record) > C::MAX) {
            return Err(TrieError::RecordOutOfRange {
                record: e.record,
                max: C::MAX,
            });
        }

        if !sorted {
            // Stable, so equal keys keep their insertion order.
            entries.sort_by(|a, b| a.key.cmp(&b.key));
        }

        tracing::debug!(keys = entries.len(), sorted, "building double array");
        if !entries.is_empty() {
            construct(&mut storage, &entries)?;
        }
        storage.shrink();

        let utilization = storage.utilization();
        tracing::debug!(
            size = storage.size(),
            unused = utilization.unused,
            efficiency = utilization.efficiency,
            "double array built"
        );
        Ok(Trie::from_storage(storage))
    }
}

impl<C: Cell> Default for Builder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lays out every entry, depth first, in code order.
///
/// Each stack item `(parent, depth, start, len)` names a group of entries
/// sharing their first `depth` bytes, all hanging below `parent`.
fn construct<C: Cell>(storage: &mut NodeStorage<C>, entries: &[Entry]) -> Result<(), TrieError> {
    let mut stack = vec![(ROOT_ID, 0usize, 0usize, entries.len())];
    let mut runs = Vec::new();

    while let Some((parent, depth, start, len)) = stack.pop() {
        collect_runs(entries, depth, start, len, &mut runs)?;
        let base = find_base(storage, &runs)?;

        storage.set_base(parent, base);
        for run in &runs {
            let child = (base + i64::from(run.code)) as usize;
            storage.allocate(child, parent);
            if run.code == TERM_CODE {
                if run.len > 1 {
                    tracing::warn!(
                        count = run.len,
                        "duplicate keys; keeping the record of the last one"
                    );
                }
                let record = entries[run.start + run.len - 1].record;
                storage.set_base(child, -i64::from(record) - 1);
            }
        }

        for run in runs.iter().rev().filter(|r| r.code != TERM_CODE) {
            let child = (base + i64::from(run.code)) as usize;
            stack.push((child, depth + 1, run.start, run.len));
        }
    }
    Ok(())
}

/// Splits `entries[start..start + len]` into runs by the byte at `depth`.
fn collect_runs(
    entries: &[Entry],
    depth: usize,
    start: usize,
    len: usize,
    runs: &mut Vec<Run>,
) -> Result<(), TrieError> {
    runs.clear();
    for (i, entry) in entries[start..start + len].iter().enumerate() {
        let code = entry.key[depth];
        match runs.last_mut() {
            Some(run) if run.code == code => run.len += 1,
            Some(run) if run.code > code => {
                return Err(TrieError::UnsortedKeys { index: start + i });
            }
            _ => runs.push(Run {
                code,
                start: start + i,
                len: 1,
            }),
        }
    }
    Ok(())
}

/// First-fit placement: walks the free list for an offset at which every
/// child code lands on an unused node.
fn find_base<C: Cell>(storage: &NodeStorage<C>, runs: &[Run]) -> Result<i64, TrieError> {
    let first = i64::from(runs[0].code);
    let last = i64::from(runs[runs.len() - 1].code);

    for free in storage.free_nodes() {
        let base = free as i64 - first;
        if base < 1 {
            continue;
        }
        if base > C::MAX - last {
            return Err(TrieError::CapacityExceeded {
                id: base.saturating_add(last),
                max: C::MAX,
            });
        }
        if runs
            .iter()
            .all(|run| storage.is_unused(base + i64::from(run.code)))
        {
            return Ok(base);
        }
    }
    Err(TrieError::CapacityExceeded {
        id: C::MAX.saturating_add(1),
        max: C::MAX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(keys: &[(&str, u32)]) -> Trie<i32> {
        let mut b = Builder::<i32>::new();
        for &(k, v) in keys {
            b.append(k, v);
        }
        b.build().unwrap()
    }

    /// Every used node except the root hangs below a used parent, and leaves
    /// hang off terminal edges.
    fn assert_well_formed(trie: &Trie<i32>) {
        let base = trie.base_buffer();
        let check = trie.check_buffer();
        assert_eq!(check[0], 0);
        for id in 1..check.len() {
            let parent = check[id];
            if parent < 0 {
                continue;
            }
            let parent = parent as usize;
            assert!(check[parent] >= 0, "parent {parent} of {id} is unused");
            assert!(base[parent] > 0, "parent {parent} of {id} is a leaf");
            let code = id as i64 - base[parent] as i64;
            assert!((0..256).contains(&code), "edge {parent}->{id} code {code}");
        }
    }

    #[test]
    fn prefix_chain_scenario() {
        let trie = build(&[("a", 1), ("ab", 2), ("abc", 3)]);
        assert_eq!(trie.lookup("a"), Some(1));
        assert_eq!(trie.lookup("ab"), Some(2));
        assert_eq!(trie.lookup("abc"), Some(3));
        assert_eq!(trie.lookup("ac"), None);
        let hits: Vec<(String, Option<u32>)> = trie
            .common_prefix_search("abcd")
            .map(|m| (m.key, m.record))
            .collect();
        assert_eq!(
            hits,
            vec![
                ("a".to_string(), Some(1)),
                ("ab".to_string(), Some(2)),
                ("abc".to_string(), Some(3)),
            ]
        );
        assert_well_formed(&trie);
    }

    #[test]
    fn empty_key_set() {
        let trie = Builder::<i32>::new().build().unwrap();
        assert_eq!(trie.size(), 2);
        assert_eq!(trie.lookup("anything"), None);
        assert!(!trie.contains(""));
    }

    #[test]
    fn single_key_default_record() {
        let mut b = Builder::<i32>::new();
        b.append_key("x");
        let trie = b.build().unwrap();
        assert_eq!(trie.lookup("x"), Some(0));
        assert!(trie.contains("x"));
        assert!(!trie.contains(""));
    }

    #[test]
    fn empty_string_key() {
        let trie = build(&[("", 7), ("a", 8)]);
        assert_eq!(trie.lookup(""), Some(7));
        assert_eq!(trie.lookup("a"), Some(8));
        // the empty key is not reported as a prefix: the walk needs one byte
        assert_eq!(trie.common_prefix_search("a").count(), 1);
    }

    #[test]
    fn nul_inside_key() {
        let trie = build(&[("a\0b", 1), ("a", 2)]);
        assert_eq!(trie.lookup("a\0b"), Some(1));
        assert_eq!(trie.lookup("a"), Some(2));
        assert_eq!(trie.lookup("a\0"), None);
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let trie = build(&[("b", 2), ("abc", 3), ("a", 1), ("ab", 4)]);
        assert_eq!(trie.lookup("a"), Some(1));
        assert_eq!(trie.lookup("ab"), Some(4));
        assert_eq!(trie.lookup("abc"), Some(3));
        assert_eq!(trie.lookup("b"), Some(2));
        assert_well_formed(&trie);
    }

    #[test]
    fn build_sorted_trusts_order() {
        let mut b = Builder::<i32>::new();
        b.append("a", 1).append("ab", 2).append("b", 3);
        let trie = b.build_sorted().unwrap();
        assert_eq!(trie.lookup("ab"), Some(2));
        assert_eq!(trie.lookup("b"), Some(3));
    }

    #[test]
    fn build_sorted_rejects_unsorted() {
        let mut b = Builder::<i32>::new();
        b.append("b", 1).append("a", 2);
        assert_eq!(
            b.build_sorted().unwrap_err(),
            TrieError::UnsortedKeys { index: 1 }
        );
    }

    #[test]
    fn build_from_replaces_staged_keys() {
        let mut b = Builder::<i32>::new();
        b.append("staged", 1);
        let trie = b.build_from([("x", 10), ("y", 11)], false).unwrap();
        assert_eq!(trie.lookup("staged"), None);
        assert_eq!(trie.lookup("x"), Some(10));
        assert_eq!(trie.lookup("y"), Some(11));
    }

    #[test]
    fn build_from_utf16_reports_malformed_key() {
        let entries = vec![(vec![0x61u16], 0), (vec![0xDC00u16], 1)];
        let err = Builder::<i32>::new().build_from(entries, false).unwrap_err();
        assert_eq!(err, TrieError::MalformedSurrogate { index: 0 });
    }

    #[test]
    fn append_utf16_keeps_builder_usable() {
        let mut b = Builder::<i32>::new();
        assert!(b.append_utf16(&[0xD800], 1).is_err());
        let pair: Vec<u16> = "😀".encode_utf16().collect();
        b.append_utf16(&pair, 2).unwrap().append("a", 3);
        assert_eq!(b.len(), 2);
        let trie = b.build().unwrap();
        assert_eq!(trie.lookup("😀"), Some(2));
        assert_eq!(trie.lookup("a"), Some(3));
    }

    #[test]
    fn duplicate_keys_keep_last_record() {
        let trie = build(&[("k", 1), ("k", 2), ("j", 0)]);
        assert_eq!(trie.lookup("k"), Some(2));
        assert_eq!(trie.lookup("j"), Some(0));
    }

    #[test]
    fn growth_matches_large_capacity() {
        let keys: Vec<String> = (0..2000).map(|i| format!("key{}", i * 7919 % 10007)).collect();
        let mut small = Builder::<i32>::with_capacity(2);
        let mut large = Builder::<i32>::with_capacity(1 << 16);
        for (i, k) in keys.iter().enumerate() {
            small.append(k, i as u32);
            large.append(k, i as u32);
        }
        let small = small.build().unwrap();
        let large = large.build().unwrap();
        assert_eq!(small.size(), large.size());
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(small.lookup(k), Some(i as u32), "{k}");
            assert_eq!(large.lookup(k), Some(i as u32), "{k}");
        }
        assert_well_formed(&small);
    }

    #[test]
    fn shrink_leaves_one_sentinel() {
        let trie = build(&[("hello", 1), ("help", 2), ("world", 3)]);
        let check = trie.check_buffer();
        let n = check.len();
        assert!(check[n - 1] < 0);
        assert!(check[n - 2] >= 0);
    }

    #[test]
    fn utilization_after_build() {
        let trie = build(&[("a", 1), ("b", 2)]);
        let u = trie.utilization();
        assert_eq!(u.all, trie.size());
        assert!(u.unused >= 1);
        assert!(u.efficiency > 0.0 && u.efficiency < 1.0);
    }

    #[test]
    fn dump_has_both_arrays() {
        let trie = build(&[("a", 0)]);
        let dump = trie.dump();
        assert!(dump.starts_with("base: "));
        assert!(dump.contains(" chck: 0 "));
    }

    #[test]
    fn record_out_of_range_for_narrow_cells() {
        let mut b = Builder::<i8>::new();
        b.append("a", 200);
        assert_eq!(
            b.build().unwrap_err(),
            TrieError::RecordOutOfRange {
                record: 200,
                max: 127
            }
        );
    }

    #[test]
    fn capacity_exceeded_for_narrow_cells() {
        let mut b = Builder::<i8>::new();
        b.append("~~", 0);
        assert!(matches!(
            b.build(),
            Err(TrieError::CapacityExceeded { max: 127, .. })
        ));
    }

    #[test]
    fn narrow_cells_small_key_set() {
        let mut b = Builder::<i16>::new();
        b.append("ab", 1).append("ac", 2).append("b", 3);
        let trie = b.build().unwrap();
        assert_eq!(trie.lookup("ac"), Some(2));
        assert_eq!(trie.lookup("b"), Some(3));
        assert_eq!(trie.lookup("a"), None);
    }

    #[test]
    fn placement_past_narrow_width_is_reported() {
        // head near the top of the i16 id space
        let mut storage = NodeStorage::<i16>::new(4);
        storage.set_first_unused_node(32_760);
        let runs = [
            Run {
                code: TERM_CODE,
                start: 0,
                len: 1,
            },
            Run {
                code: 255,
                start: 1,
                len: 1,
            },
        ];
        assert_eq!(
            find_base(&storage, &runs),
            Err(TrieError::CapacityExceeded {
                id: 32_760 + 255,
                max: 32_767
            })
        );
    }

    #[test]
    fn free_list_exhausted_at_narrow_width() {
        // every free id sits below the smallest code, so no offset is >= 1
        let mut storage = NodeStorage::<i16>::new(4);
        storage.set_check(1, -(i16::MAX as i64) - 1);
        let runs = [Run {
            code: 200,
            start: 0,
            len: 1,
        }];
        assert_eq!(
            find_base(&storage, &runs),
            Err(TrieError::CapacityExceeded {
                id: 32_768,
                max: 32_767
            })
        );
    }

    #[test]
    fn wide_cells_many_keys() {
        let mut b = Builder::<i64>::with_capacity(2);
        for i in 0..300u32 {
            b.append(&format!("w{i}"), i);
        }
        let trie = b.build().unwrap();
        for i in 0..300u32 {
            assert_eq!(trie.lookup(&format!("w{i}")), Some(i));
        }
        assert_eq!(trie.lookup("w300"), None);
    }

    #[test]
    fn wide_cells() {
        let mut b = Builder::<i64>::with_capacity(4);
        b.append("wide", u32::MAX);
        let trie = b.build().unwrap();
        assert_eq!(trie.lookup("wide"), Some(u32::MAX));
    }

    #[test]
    fn loaded_arrays_answer_like_built() {
        let keys = [("東京", 1), ("東京都", 2), ("京都", 3), ("😀", 4)];
        let trie = build(&keys);
        let loaded = Trie::load(trie.base_buffer().to_vec(), trie.check_buffer().to_vec());
        for (k, v) in keys {
            assert_eq!(loaded.lookup(k), Some(v));
        }
        assert_eq!(loaded.common_prefix_search("東京都庁").count(), 2);
    }
}
