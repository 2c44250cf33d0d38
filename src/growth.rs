//! Growth policy: decides when the bucket index doubles.
//!
//! The trigger is local to the chain that just received a slot, not a global
//! load factor. A chain may hold up to `table_size / DEFAULT_TABLE_SIZE`
//! slots, i.e. `2^k` after `k` doublings. A skewed hash that piles keys into
//! one chain can therefore force a rehash while the table is mostly empty.
//! That worst case is accepted; a global load factor would instead let the
//! hot chain grow without bound.

/// Number of chains in a fresh (or cleared) map.
pub const DEFAULT_TABLE_SIZE: usize = 1024;

/// Longest chain tolerated at `table_size` before a doubling.
#[inline]
pub fn chain_threshold(table_size: usize) -> usize {
    table_size / DEFAULT_TABLE_SIZE
}

/// True if a chain of `chain_len` slots forces the table to grow.
#[inline]
pub fn should_grow(table_size: usize, chain_len: usize) -> bool {
    chain_len > chain_threshold(table_size)
}

/// Size of the table after one doubling. Saturates at `usize::MAX`, where
/// growth stops.
#[inline]
pub fn next_table_size(table_size: usize) -> usize {
    table_size.saturating_mul(2)
}
