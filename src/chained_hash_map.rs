//! ChainedHashMap: public map with insertion-ordered iteration and stable
//! handles, built on `ChainedTable`.

use crate::error::KeyNotFound;
use crate::iter::{Handles, IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::record_store::EntryKey;
use crate::reentrancy::DebugReentrancy;
use crate::table::ChainedTable;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;

/// Stable reference to one entry of a [`ChainedHashMap`].
///
/// A handle survives every operation except removal of its own entry,
/// including rehashes and the removal of other entries. Once its entry is
/// gone the handle resolves to `None`, even if the storage slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(EntryKey);

impl Handle {
    pub(crate) fn new(k: EntryKey) -> Self {
        Handle(k)
    }

    pub(crate) fn raw_handle(&self) -> EntryKey {
        self.0
    }

    pub fn key<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a K> {
        map.handle_key(*self)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a V> {
        map.handle_value(*self)
    }

    pub fn value_mut<'a, K, V, S>(
        &self,
        map: &'a mut ChainedHashMap<K, V, S>,
    ) -> Option<&'a mut V> {
        map.handle_value_mut(*self)
    }
}

/// Insertion-ordered hash map using separate chaining.
///
/// Iteration visits entries in the order their keys were first inserted.
/// Inserting an existing key keeps the stored value ("first write wins").
/// See the crate docs for the growth policy.
pub struct ChainedHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    table: ChainedTable<K, V>,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainedHashMap<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V> Default for ChainedHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    /// Empty map hashing keys with `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            table: ChainedTable::new(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The hashing strategy this map was built with.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Current number of chains in the bucket index.
    pub fn table_size(&self) -> usize {
        self.table.table_size()
    }

    /// Length of every chain, in chain order.
    #[cfg(feature = "bench_internal")]
    pub fn chain_lengths(&self) -> Vec<usize> {
        self.table.chain_lengths()
    }

    /// Remove every entry and reset the bucket index to its default size.
    /// All outstanding handles become stale.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.table.clear();
    }

    /// Remove the entry behind `handle`, if it is still live.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        let _g = self.reentrancy.enter("remove_handle");
        self.table.unlink(handle.raw_handle())
    }

    /// Keep only the entries for which `keep` returns true. Survivors keep
    /// their relative order.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let _g = self.reentrancy.enter("retain");
        self.table.retain(keep);
    }

    /// Oldest live entry.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.table.first().map(|n| (&n.key, &n.value))
    }

    /// Newest live entry.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.table.last().map(|n| (&n.key, &n.value))
    }

    pub(crate) fn handle_key(&self, h: Handle) -> Option<&K> {
        let _g = self.reentrancy.enter("handle_key");
        self.table.get(h.raw_handle()).map(|n| &n.key)
    }

    pub(crate) fn handle_value(&self, h: Handle) -> Option<&V> {
        let _g = self.reentrancy.enter("handle_value");
        self.table.get(h.raw_handle()).map(|n| &n.value)
    }

    pub(crate) fn handle_value_mut(&mut self, h: Handle) -> Option<&mut V> {
        let _g = self.reentrancy.enter("handle_value_mut");
        self.table.get_mut(h.raw_handle()).map(|n| &mut n.value)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.table.iter())
    }

    /// Entries in insertion order, values mutable.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.table.iter_mut())
    }

    /// Handles of all entries in insertion order.
    pub fn handles(&self) -> Handles<'_, K, V> {
        Handles::new(self.table.iter())
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.table.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.table.iter())
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut::new(self.table.iter_mut())
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.table.assert_consistent();
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.table.locate(hash, |k| k.borrow() == q)
    }

    /// Insert `key -> value` if `key` is absent. Returns whether the map
    /// changed; an existing value is never overwritten.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.insert_full(key, value).1
    }

    /// Like [`insert`](Self::insert), also returning the handle of the entry
    /// now stored under `key`: the new one, or the untouched existing one.
    pub fn insert_full(&mut self, key: K, value: V) -> (Handle, bool) {
        let _g = self.reentrancy.enter("insert_full");
        let hash = self.make_hash(&key);
        match self.locate(hash, &key) {
            Some(k) => (Handle::new(k), false),
            None => (Handle::new(self.table.append(hash, key, value)), true),
        }
    }

    /// Value for `key`, inserting `default()` first if the key is absent.
    ///
    /// Performs a single chain scan; `default` only runs on a miss.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter("get_or_insert_with");
        let hash = self.make_hash(&key);
        self.table.get_or_append_with(hash, key, default)
    }

    /// Value for `key`, inserting `V::default()` first if the key is absent.
    ///
    /// Side effect: a miss grows the map by one entry.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Handle of the entry stored under `q`.
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("find");
        let hash = self.make_hash(q);
        self.locate(hash, q).map(Handle::new)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_key_value");
        let hash = self.make_hash(q);
        let k = self.locate(hash, q)?;
        self.table.get(k).map(|n| (&n.key, &n.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("get_mut");
        let hash = self.make_hash(q);
        let k = self.locate(hash, q)?;
        self.table.get_mut(k).map(|n| &mut n.value)
    }

    /// Checked lookup: `Err(KeyNotFound)` if `q` has no entry.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(KeyNotFound)
    }

    /// Checked mutable lookup: `Err(KeyNotFound)` if `q` has no entry.
    pub fn at_mut<Q>(&mut self, q: &Q) -> Result<&mut V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_mut(q).ok_or(KeyNotFound)
    }

    /// Remove `q`'s entry and return its value. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter("remove_entry");
        let hash = self.make_hash(q);
        let k = self.locate(hash, q)?;
        self.table.unlink(k)
    }
}

impl<K, V, S> Clone for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        let mut map = Self::with_hasher(self.hasher.clone());
        map.extend(self.iter().map(|(k, v)| (k.clone(), v.clone())));
        map
    }

    /// Clear `self`, then insert every entry of `source` in its iteration
    /// order. Handles into `self` become stale; handles into `source` do not
    /// carry over.
    fn clone_from(&mut self, source: &Self) {
        self.clear();
        self.hasher.clone_from(&source.hasher);
        self.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if `key` has no entry. Never inserts; see
    /// [`ChainedHashMap::get_or_insert_default`] for that.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key not found in ChainedHashMap"),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + Copy,
    V: Copy,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    /// Insert pairs in sequence order; the first pair for a key wins.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S, const N: usize> From<[(K, V); N]> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for ChainedHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    /// Consume the map, yielding owned entries in insertion order.
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.table.into_records())
    }
}
