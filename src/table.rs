//! ChainedTable: record store and bucket index kept in lockstep.
//!
//! Works purely on precomputed hashes; hashing and the public API live in
//! `ChainedHashMap`. Every structural change goes through this type so the
//! two halves never disagree once a method returns:
//! - `append` pushes a node, registers its slot, then applies the growth
//!   policy to the chain it landed in;
//! - `unlink` removes the node and its slot together;
//! - `grow` rebuilds the index from the record store, leaving nodes alone.

use crate::bucket_index::{BucketIndex, Slot};
use crate::growth;
use crate::record_store::{self, EntryKey, Node, RecordStore};

pub(crate) struct ChainedTable<K, V> {
    records: RecordStore<K, V>,
    index: BucketIndex,
}

impl<K, V> ChainedTable<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            records: RecordStore::new(),
            index: BucketIndex::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn table_size(&self) -> usize {
        self.index.table_size()
    }

    #[cfg(feature = "bench_internal")]
    pub(crate) fn chain_lengths(&self) -> Vec<usize> {
        self.index.chain_lengths().collect()
    }

    /// Entry key of the live entry with `hash` whose key satisfies `is_match`.
    pub(crate) fn locate<F>(&self, hash: u64, mut is_match: F) -> Option<EntryKey>
    where
        F: FnMut(&K) -> bool,
    {
        let records = &self.records;
        self.index.locate(hash, |k| {
            records.get(k).map(|n| is_match(&n.key)).unwrap_or(false)
        })
    }

    /// Add a new entry. The caller has already checked the key is absent.
    pub(crate) fn append(&mut self, hash: u64, key: K, value: V) -> EntryKey {
        let k = self.records.push_back(key, value, hash);
        let chain_len = self.index.register(hash, k);
        if growth::should_grow(self.index.table_size(), chain_len) {
            self.grow(chain_len);
        }
        k
    }

    /// Value stored under `key`, appending `key -> default()` on a miss.
    pub(crate) fn get_or_append_with<D>(&mut self, hash: u64, key: K, default: D) -> &mut V
    where
        K: Eq,
        D: FnOnce() -> V,
    {
        let k = match self.locate(hash, |k| *k == key) {
            Some(k) => k,
            None => self.append(hash, key, default()),
        };
        &mut self.records[k].value
    }

    fn grow(&mut self, chain_len: usize) {
        let old_size = self.index.table_size();
        let new_size = growth::next_table_size(old_size);
        if new_size == old_size {
            return;
        }
        let live = self
            .records
            .iter()
            .map(|(key, n)| Slot { hash: n.hash, key });
        self.index.rehash(new_size, live);
        log::debug!(
            "rehash: {} -> {} chains ({} entries, chain of {} exceeded threshold {})",
            old_size,
            new_size,
            self.records.len(),
            chain_len,
            growth::chain_threshold(old_size),
        );
    }

    /// Remove the entry and its slot together. Stale keys yield `None`.
    pub(crate) fn unlink(&mut self, k: EntryKey) -> Option<(K, V)> {
        let removed = self.records.remove(k)?;
        let had_slot = self.index.unregister(removed.hash, k);
        debug_assert!(had_slot, "record store entry had no slot in the bucket index");
        Some((removed.key, removed.value))
    }

    pub(crate) fn get(&self, k: EntryKey) -> Option<&Node<K, V>> {
        self.records.get(k)
    }

    pub(crate) fn get_mut(&mut self, k: EntryKey) -> Option<&mut Node<K, V>> {
        self.records.get_mut(k)
    }

    pub(crate) fn first(&self) -> Option<&Node<K, V>> {
        self.records.head().and_then(|k| self.records.get(k))
    }

    pub(crate) fn last(&self) -> Option<&Node<K, V>> {
        self.records.tail().and_then(|k| self.records.get(k))
    }

    /// Keep only entries for which `keep` returns true, in order.
    pub(crate) fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cursor = self.records.head();
        while let Some(k) = cursor {
            cursor = self.records.next_of(k);
            let drop_it = match self.records.get_mut(k) {
                Some(n) => !keep(&n.key, &mut n.value),
                None => false,
            };
            if drop_it {
                self.unlink(k);
            }
        }
    }

    /// Drop every entry and shrink back to the default table.
    pub(crate) fn clear(&mut self) {
        let dropped = self.records.len();
        let old_size = self.index.table_size();
        self.records.clear();
        self.index.reset();
        log::trace!(
            "clear: dropped {} entries, {} -> {} chains",
            dropped,
            old_size,
            growth::DEFAULT_TABLE_SIZE,
        );
    }

    pub(crate) fn iter(&self) -> record_store::Iter<'_, K, V> {
        self.records.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> record_store::IterMut<'_, K, V> {
        self.records.iter_mut()
    }

    /// Give up the index and keep the ordered entries.
    pub(crate) fn into_records(self) -> RecordStore<K, V> {
        self.records
    }

    /// Panic unless records and slots are in bijection and every slot sits
    /// in the chain its hash selects.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut seen = std::collections::HashSet::new();
        for (chain, slot) in self.index.slots() {
            assert_eq!(chain, self.index.chain_of(slot.hash), "slot in wrong chain");
            let node = self.records.get(slot.key).expect("slot points at a live entry");
            assert_eq!(node.hash, slot.hash, "slot hash differs from entry hash");
            assert!(seen.insert(slot.key), "entry indexed twice");
        }
        assert_eq!(seen.len(), self.records.len(), "unindexed entries");
        assert_eq!(self.records.iter().count(), self.records.len());
    }
}
