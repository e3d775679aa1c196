use crate::{Cell, Utilization, DEFAULT_INITIAL_SIZE, MEMORY_EXPAND_RATIO, ROOT_ID};

pub(crate) const ROOT: i64 = ROOT_ID as i64;

/// BASE of an unallocated cell: backward free-list link to `id - 1`.
#[inline]
pub(crate) fn default_base(id: i64) -> i64 {
    -id + 1
}

/// CHECK of an unallocated cell: forward free-list link to `id + 1`.
#[inline]
pub(crate) fn default_check(id: i64) -> i64 {
    -id - 1
}

/// A growable cell buffer readable at any non-negative index.
///
/// Reads past the physical end fall back to `fallback(index)` and never grow
/// the buffer.
#[derive(Clone, Debug)]
pub(crate) struct LogicalArray<C: Cell> {
    cells: Vec<C>,
    fallback: fn(i64) -> i64,
}

impl<C: Cell> LogicalArray<C> {
    pub(crate) fn new(cells: Vec<C>, fallback: fn(i64) -> i64) -> Self {
        Self { cells, fallback }
    }

    #[inline]
    pub(crate) fn get(&self, id: i64) -> i64 {
        debug_assert!(id >= 0, "negative node id {id}");
        match self.cells.get(id as usize) {
            Some(c) => c.to_i64(),
            None => (self.fallback)(id),
        }
    }

    /// Writes a cell that is already physically allocated.
    #[inline]
    pub(crate) fn set(&mut self, id: i64, value: i64) {
        self.cells[id as usize] = C::from_i64(value);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    /// Extends the buffer to `new_len`, filling the new range with fallback values.
    pub(crate) fn extend_to(&mut self, new_len: usize) {
        let old_len = self.cells.len();
        if new_len <= old_len {
            return;
        }
        self.cells.reserve_exact(new_len - old_len);
        let fallback = self.fallback;
        self.cells
            .extend((old_len..new_len).map(|i| C::from_i64(fallback(i as i64))));
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.cells.truncate(len);
        self.cells.shrink_to_fit();
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[C] {
        &self.cells
    }

    pub(crate) fn into_vec(self) -> Vec<C> {
        self.cells
    }
}

/// The BASE/CHECK arrays together with the free-list cursor.
///
/// Index 0 is the root and is always used. Every other cell with a negative
/// CHECK is unused and sits in the free list (see `free_list.rs`).
#[derive(Clone, Debug)]
pub struct NodeStorage<C: Cell> {
    pub(crate) base: LogicalArray<C>,
    pub(crate) check: LogicalArray<C>,
    pub(crate) first_unused: i64,
}

impl<C: Cell> NodeStorage<C> {
    /// Creates storage with `initial_size` physical cells, the root initialised
    /// and every other cell linked into one free-list run.
    ///
    /// An `initial_size` of 0 selects [`DEFAULT_INITIAL_SIZE`]. The size is
    /// clamped to what the cell width can address.
    pub fn new(initial_size: usize) -> Self {
        let size = if initial_size == 0 {
            DEFAULT_INITIAL_SIZE
        } else {
            initial_size
        };
        let size = size.clamp(2, Self::max_len());

        let mut base = LogicalArray::new(Vec::new(), default_base);
        let mut check = LogicalArray::new(Vec::new(), default_check);
        base.extend_to(size);
        check.extend_to(size);

        base.set(ROOT, 1);
        check.set(ROOT, ROOT);

        Self {
            base,
            check,
            first_unused: ROOT + 1,
        }
    }

    /// Wraps externally supplied arrays. The free list of such storage is not
    /// maintained and it must only be read.
    pub fn from_raw(base: Vec<C>, check: Vec<C>) -> Self {
        Self {
            base: LogicalArray::new(base, default_base),
            check: LogicalArray::new(check, default_check),
            first_unused: ROOT + 1,
        }
    }

    /// Number of cells a storage of this width can hold.
    #[inline]
    pub(crate) fn max_len() -> usize {
        usize::try_from(C::MAX).map_or(usize::MAX, |m| m.saturating_add(1))
    }

    /// Returns BASE at `id`, or the unallocated default past the physical end.
    #[inline]
    pub fn base(&self, id: usize) -> i64 {
        self.base.get(id as i64)
    }

    /// Returns CHECK at `id`, or the unallocated default past the physical end.
    #[inline]
    pub fn check(&self, id: usize) -> i64 {
        self.check.get(id as i64)
    }

    /// Writes BASE at `id`, growing the arrays first if needed.
    pub fn set_base(&mut self, id: usize, value: i64) {
        self.reserve(id);
        self.base.set(id as i64, value);
    }

    /// Writes CHECK at `id`, growing the arrays first if needed.
    pub fn set_check(&mut self, id: usize, value: i64) {
        self.reserve(id);
        self.check.set(id as i64, value);
    }

    /// Physical capacity: the longer of the two arrays.
    #[inline]
    pub fn size(&self) -> usize {
        self.base.len().max(self.check.len())
    }

    /// Head of the free list.
    #[inline]
    pub fn first_unused_node(&self) -> usize {
        self.first_unused as usize
    }

    /// Moves the head of the free list.
    #[inline]
    pub fn set_first_unused_node(&mut self, id: usize) {
        self.first_unused = id as i64;
    }

    /// Ensures `id` is physically allocated in both arrays.
    pub(crate) fn reserve(&mut self, id: usize) {
        if id < self.base.len() && id < self.check.len() {
            return;
        }
        let new_len = id
            .saturating_mul(MEMORY_EXPAND_RATIO)
            .max(id + 1)
            .min(Self::max_len());
        self.grow(new_len);
    }

    /// Grows both arrays to `new_len`, keeping the free list valid across the
    /// boundary between the old and the new region.
    fn grow(&mut self, new_len: usize) {
        let old_len = self.size();
        tracing::trace!(old_len, new_len, "growing node storage");

        // Backward link of the first new cell must name the last unused cell of
        // the old region, which is not `old_len - 1` when that cell is in use.
        let last_unused = if old_len > 0 && self.check.get(old_len as i64 - 1) >= 0 {
            let mut id = old_len as i64 - 1;
            while id > ROOT && self.check.get(id) >= 0 {
                id -= 1;
            }
            Some(id)
        } else {
            None
        };

        self.base.extend_to(new_len);
        self.check.extend_to(new_len);

        if let Some(prev) = last_unused {
            if new_len > old_len {
                self.base.set(old_len as i64, -prev);
            }
        }
    }

    /// Drops the trailing run of unused cells, keeping one as a sentinel.
    pub fn shrink(&mut self) {
        let len = self.check.len();
        let Some(last_used) = (0..len).rev().find(|&i| self.check.get(i as i64) >= 0) else {
            return;
        };
        let keep = last_used + 2;
        if keep >= len {
            return;
        }
        tracing::trace!(from = len, to = keep, "shrinking node storage");
        self.base.truncate(keep.min(self.base.len()));
        self.check.truncate(keep);
    }

    /// Counts unused cells and the ratio of used cells to all cells.
    pub fn utilization(&self) -> Utilization {
        Utilization::of(self.check.as_slice())
    }

    /// Renders both arrays as text and emits them at debug level.
    pub fn dump(&self) -> String {
        let render = |cells: &LogicalArray<C>| {
            (0..cells.len())
                .map(|i| cells.get(i as i64).to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        let base = format!("base: {}", render(&self.base));
        let check = format!("chck: {}", render(&self.check));
        tracing::debug!(%base, %check, "node storage dump");
        format!("{base} {check}")
    }

    pub(crate) fn base_slice(&self) -> &[C] {
        self.base.as_slice()
    }

    pub(crate) fn check_slice(&self) -> &[C] {
        self.check.as_slice()
    }

    pub(crate) fn into_raw(self) -> (Vec<C>, Vec<C>) {
        (self.base.into_vec(), self.check.into_vec())
    }
}

impl<C: Cell> Default for NodeStorage<C> {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_SIZE)
    }
}
