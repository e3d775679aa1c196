/// A fixed-width signed integer used for BASE and CHECK cells.
///
/// Free-list links and leaf records are stored as negative values, so only
/// signed widths implement this trait. An unsigned or otherwise unsupported
/// cell type is rejected at compile time.
///
/// Arithmetic on cells is carried out in `i64`; `MAX` bounds every node id
/// and record a trie of this width can hold.
pub trait Cell: Copy + Default + Ord + std::fmt::Debug + std::fmt::Display + Send + Sync {
    /// Width of one cell in bytes.
    const BYTES: usize;
    /// Largest value representable in a cell.
    const MAX: i64;

    /// Widens the cell to `i64`.
    fn to_i64(self) -> i64;

    /// Narrows an `i64` into a cell. The value must lie in `-(MAX + 1)..=MAX`.
    fn from_i64(v: i64) -> Self;
}

macro_rules! impl_cell {
    ($($t:ty),*) => {
        $(
            impl Cell for $t {
                const BYTES: usize = std::mem::size_of::<$t>();
                const MAX: i64 = <$t>::MAX as i64;

                #[inline]
                fn to_i64(self) -> i64 {
                    self as i64
                }

                #[inline]
                fn from_i64(v: i64) -> Self {
                    debug_assert!(
                        v >= -<Self as Cell>::MAX - 1 && v <= <Self as Cell>::MAX,
                        "value {v} does not fit a {}-byte cell",
                        Self::BYTES
                    );
                    v as $t
                }
            }
        )*
    };
}

impl_cell!(i8, i16, i32, i64);
