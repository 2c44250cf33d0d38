//! chained-hashmap: an insertion-ordered hash map built from separate
//! chaining over a generational arena, with stable entry handles.
//!
//! ```
//! use chained_hashmap::{ChainedHashMap, KeyNotFound};
//!
//! let mut m = ChainedHashMap::new();
//! m.insert("a", 1);
//! m.insert("b", 2);
//! m.insert("a", 3); // ignored: first write wins
//! assert_eq!(m.len(), 2);
//! assert_eq!(m.at("a"), Ok(&1));
//! assert_eq!(m.at("zz"), Err(KeyNotFound));
//! assert_eq!(m.iter().collect::<Vec<_>>(), [(&"a", &1), (&"b", &2)]);
//! ```
//!
//! Internal Design:
//!
//! Summary
//! - Goal: O(1) average lookup, iteration in first-insertion order, and
//!   handles that survive structural mutation of other entries.
//! - Layers:
//!   - RecordStore<K, V>: the entries themselves, in a `SlotMap` threaded
//!     into a doubly-linked list. Owns every key and value. An `EntryKey`
//!     (generational slot key) is valid until its own entry is removed.
//!   - BucketIndex: `table_size` chains of `(hash, EntryKey)` slots. Owns
//!     nothing; it only locates entries in the record store.
//!   - growth: pure decision of when the index doubles.
//!   - ChainedTable<K, V>: keeps the two halves in lockstep (append +
//!     register, unregister + remove, rehash from the record store).
//!   - ChainedHashMap<K, V, S>: public API; hashes keys with `S` and wraps
//!     entry keys in `Handle`s.
//!
//! Growth policy
//! - The table starts at `DEFAULT_TABLE_SIZE` (1024) chains and only ever
//!   doubles; `clear()` resets it.
//! - After an insert, if the chain that received the slot holds more than
//!   `table_size / DEFAULT_TABLE_SIZE` slots, every slot is redistributed
//!   into `2 * table_size` chains.
//! - The trigger is per chain, not a global load factor. Keys that collide
//!   on purpose (or a poor hasher) grow the table quickly even while most
//!   chains are empty.
//!
//! Duplicate keys
//! - `insert` never overwrites: re-inserting a key leaves the stored value,
//!   position and handle untouched. Bulk construction therefore keeps the
//!   first pair for each key.
//! - `get_or_insert_default` is the explicit locate-or-insert accessor; a
//!   miss inserts `V::default()` as a documented side effect. `map[&k]`
//!   only reads and panics on a miss.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash and slots carry a copy. Chain scans
//!   compare hashes before calling `K: Eq`, and rehashing never calls
//!   `K: Hash`.
//!
//! Handles
//! - A `Handle` resolves while its entry is live, across any number of
//!   rehashes and removals of other entries. After its entry is removed (or
//!   the map is cleared) it resolves to `None`, even if the arena slot has
//!   been reused.
//!
//! Errors
//! - `KeyNotFound` from `at`/`at_mut` is the only error. Everything else
//!   reports absence through `Option` or is a no-op.
//!
//! Notes and non-goals
//! - Single-threaded: `!Send`/`!Sync` via the reentrancy tracker's marker.
//! - Reentrancy: in debug builds, reaching back into the map from `K: Hash`
//!   or `K: Eq` during an operation panics.
//! - Rehash events are logged at `debug` level through the `log` facade.

mod bucket_index;
mod chained_hash_map;
mod chained_hash_map_proptest;
mod error;
mod growth;
pub mod iter;
mod record_store;
mod reentrancy;
mod table;

// Public surface
pub use chained_hash_map::{ChainedHashMap, Handle};
pub use error::KeyNotFound;
pub use growth::DEFAULT_TABLE_SIZE;
