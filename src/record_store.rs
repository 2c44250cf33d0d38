//! RecordStore: insertion-ordered entries in a generational arena.
//!
//! Entries live in a `SlotMap` and are threaded into a doubly-linked list by
//! their arena keys. Appending or removing one entry never moves another, so
//! an `EntryKey` stays valid until its own entry is removed; after that the
//! slot's generation is bumped and the stale key resolves to `None`.

use core::iter::FusedIterator;
use core::ops::{Index, IndexMut};
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

/// Stable reference to one live entry.
pub(crate) type EntryKey = DefaultKey;

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    prev: Option<EntryKey>,
    next: Option<EntryKey>,
}

/// Owned contents of a removed node.
pub(crate) struct Removed<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
}

pub(crate) struct RecordStore<K, V> {
    nodes: SlotMap<EntryKey, Node<K, V>>,
    head: Option<EntryKey>,
    tail: Option<EntryKey>,
}

impl<K, V> RecordStore<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append at the tail and return the new entry's key.
    pub(crate) fn push_back(&mut self, key: K, value: V, hash: u64) -> EntryKey {
        let prev = self.tail;
        let k = self.nodes.insert(Node {
            key,
            value,
            hash,
            prev,
            next: None,
        });
        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
        k
    }

    /// Unlink and take the entry behind `k`. Stale keys yield `None`.
    pub(crate) fn remove(&mut self, k: EntryKey) -> Option<Removed<K, V>> {
        let node = self.nodes.remove(k)?;
        match node.prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|n| self.nodes.get_mut(n)) {
            Some(n) => n.prev = node.prev,
            None => self.tail = node.prev,
        }
        Some(Removed {
            key: node.key,
            value: node.value,
            hash: node.hash,
        })
    }

    pub(crate) fn pop_front(&mut self) -> Option<Removed<K, V>> {
        self.head.and_then(|k| self.remove(k))
    }

    pub(crate) fn pop_back(&mut self) -> Option<Removed<K, V>> {
        self.tail.and_then(|k| self.remove(k))
    }

    pub(crate) fn get(&self, k: EntryKey) -> Option<&Node<K, V>> {
        self.nodes.get(k)
    }

    pub(crate) fn get_mut(&mut self, k: EntryKey) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(k)
    }

    pub(crate) fn head(&self) -> Option<EntryKey> {
        self.head
    }

    pub(crate) fn tail(&self) -> Option<EntryKey> {
        self.tail
    }

    /// Key of the entry inserted right after `k`.
    pub(crate) fn next_of(&self, k: EntryKey) -> Option<EntryKey> {
        self.nodes.get(k).and_then(|n| n.next)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            front: self.head,
            back: self.tail,
            remaining: self.nodes.len(),
        }
    }

    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(&mut self.nodes, self.head, self.tail)
    }
}

impl<K, V> Index<EntryKey> for RecordStore<K, V> {
    type Output = Node<K, V>;

    /// Panics on a stale key; callers index only keys they just located.
    fn index(&self, k: EntryKey) -> &Node<K, V> {
        &self.nodes[k]
    }
}

impl<K, V> IndexMut<EntryKey> for RecordStore<K, V> {
    fn index_mut(&mut self, k: EntryKey) -> &mut Node<K, V> {
        &mut self.nodes[k]
    }
}

/// Ordered walk over `(EntryKey, &Node)`.
pub(crate) struct Iter<'a, K, V> {
    nodes: &'a SlotMap<EntryKey, Node<K, V>>,
    front: Option<EntryKey>,
    back: Option<EntryKey>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (EntryKey, &'a Node<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.front?;
        let node = self.nodes.get(k)?;
        self.front = node.next;
        self.remaining -= 1;
        Some((k, node))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.back?;
        let node = self.nodes.get(k)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some((k, node))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Ordered walk handing out `&K` and `&mut V`.
///
/// All element borrows come from one `SlotMap::iter_mut` pass at
/// construction, parked by key; the linked order then decides which one to
/// hand out next.
pub(crate) struct IterMut<'a, K, V> {
    parked: SecondaryMap<EntryKey, Parked<'a, K, V>>,
    front: Option<EntryKey>,
    back: Option<EntryKey>,
}

struct Parked<'a, K, V> {
    key: &'a K,
    value: &'a mut V,
    prev: Option<EntryKey>,
    next: Option<EntryKey>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    fn new(
        nodes: &'a mut SlotMap<EntryKey, Node<K, V>>,
        head: Option<EntryKey>,
        tail: Option<EntryKey>,
    ) -> Self {
        let mut parked = SecondaryMap::with_capacity(nodes.len());
        for (k, node) in nodes.iter_mut() {
            let Node {
                key,
                value,
                prev,
                next,
                ..
            } = node;
            parked.insert(
                k,
                Parked {
                    key: &*key,
                    value,
                    prev: *prev,
                    next: *next,
                },
            );
        }
        Self {
            parked,
            front: head,
            back: tail,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (EntryKey, &'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.front?;
        let p = self.parked.remove(k)?;
        self.front = p.next;
        Some((k, p.key, p.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.parked.len(), Some(self.parked.len()))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        let k = self.back?;
        let p = self.parked.remove(k)?;
        self.back = p.prev;
        Some((k, p.key, p.value))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}
