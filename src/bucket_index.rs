//! BucketIndex: separate-chaining index from hashes to record store keys.
//!
//! Chain `i` holds one `Slot` per entry whose `hash % table_size == i`. The
//! index owns no keys or values, only `(hash, EntryKey)` pairs, so it can be
//! rebuilt at any size without touching the record store.

use crate::growth::DEFAULT_TABLE_SIZE;
use crate::record_store::EntryKey;

/// Chain element: cached hash plus the entry it locates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) hash: u64,
    pub(crate) key: EntryKey,
}

pub(crate) struct BucketIndex {
    chains: Vec<Vec<Slot>>,
}

fn empty_chains(table_size: usize) -> Vec<Vec<Slot>> {
    core::iter::repeat_with(Vec::new).take(table_size).collect()
}

impl BucketIndex {
    pub(crate) fn new() -> Self {
        Self::with_table_size(DEFAULT_TABLE_SIZE)
    }

    pub(crate) fn with_table_size(table_size: usize) -> Self {
        debug_assert!(table_size > 0);
        Self {
            chains: empty_chains(table_size),
        }
    }

    #[inline]
    pub(crate) fn table_size(&self) -> usize {
        self.chains.len()
    }

    #[inline]
    pub(crate) fn chain_of(&self, hash: u64) -> usize {
        (hash % self.chains.len() as u64) as usize
    }

    /// Scan the chain for `hash`; `is_match` only runs on slots whose cached
    /// hash is equal.
    pub(crate) fn locate<F>(&self, hash: u64, mut is_match: F) -> Option<EntryKey>
    where
        F: FnMut(EntryKey) -> bool,
    {
        self.chains[self.chain_of(hash)]
            .iter()
            .find(|s| s.hash == hash && is_match(s.key))
            .map(|s| s.key)
    }

    /// Append a slot and return the resulting chain length.
    pub(crate) fn register(&mut self, hash: u64, key: EntryKey) -> usize {
        let i = self.chain_of(hash);
        let chain = &mut self.chains[i];
        chain.push(Slot { hash, key });
        chain.len()
    }

    /// Drop the slot pointing at `key`. Chains are unordered, so the last
    /// slot takes its place.
    pub(crate) fn unregister(&mut self, hash: u64, key: EntryKey) -> bool {
        let i = self.chain_of(hash);
        let chain = &mut self.chains[i];
        match chain.iter().position(|s| s.key == key) {
            Some(pos) => {
                chain.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    /// Rebuild every chain at `table_size` from the live entries.
    pub(crate) fn rehash<I>(&mut self, table_size: usize, entries: I)
    where
        I: IntoIterator<Item = Slot>,
    {
        debug_assert!(table_size > 0);
        let mut chains = empty_chains(table_size);
        for slot in entries {
            chains[(slot.hash % table_size as u64) as usize].push(slot);
        }
        self.chains = chains;
    }

    /// Back to `DEFAULT_TABLE_SIZE` empty chains.
    pub(crate) fn reset(&mut self) {
        self.chains = empty_chains(DEFAULT_TABLE_SIZE);
    }

    #[cfg(test)]
    pub(crate) fn chain_len(&self, i: usize) -> usize {
        self.chains.get(i).map_or(0, Vec::len)
    }

    #[cfg(any(test, feature = "bench_internal"))]
    pub(crate) fn chain_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.chains.iter().map(Vec::len)
    }

    #[cfg(test)]
    pub(crate) fn slots(&self) -> impl Iterator<Item = (usize, &Slot)> + '_ {
        self.chains
            .iter()
            .enumerate()
            .flat_map(|(i, c)| c.iter().map(move |s| (i, s)))
    }
}
