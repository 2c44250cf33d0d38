//! Debug-only reentrancy tracker.
//!
//! `ChainedHashMap` calls user code (`K: Hash`, `K: Eq`) while a chain scan
//! or a slot registration is in flight. Reaching back into the same map from
//! that code would observe a record store and bucket index that disagree.
//! In debug builds the tracker turns that into a panic naming both the
//! operation in flight and the one that tried to start; in release builds it
//! compiles away.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map record of the operation currently touching the structure.
/// Public entry points take `let _g = self.reentrancy.enter("op");` first.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // Single-threaded container: keep !Send + !Sync.
    _nosend: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosend: PhantomData,
        }
    }

    /// Mark the map busy with `op` until the returned guard drops. Panics in
    /// debug builds if another operation is already in flight.
    #[inline]
    #[cfg_attr(not(debug_assertions), allow(unused_variables))]
    pub(crate) fn enter(&self, op: &'static str) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!(
                    "reentrancy detected: ChainedHashMap::{} called from Hash/Eq \
                     while ChainedHashMap::{} is in progress",
                    op, outer
                );
            }
            self.active.set(Some(op));
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _z: PhantomData }
        }
    }

    /// Operation holding the guard, if any. Always `None` in release builds.
    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> Option<&'static str> {
        #[cfg(debug_assertions)]
        {
            self.active.get()
        }

        #[cfg(not(debug_assertions))]
        {
            None
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`DebugReentrancy::enter`]. Also released while
/// unwinding, so a caught panic leaves the map usable.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DebugReentrancy;

    #[test]
    fn guard_released_on_drop() {
        let r = DebugReentrancy::new();
        {
            let _g = r.enter("insert");
            let expected = if cfg!(debug_assertions) { Some("insert") } else { None };
            assert_eq!(r.in_flight(), expected);
        }
        assert_eq!(r.in_flight(), None);
        let _g = r.enter("remove");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_enter_names_both_operations() {
        let r = DebugReentrancy::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _g1 = r.enter("insert");
            let _g2 = r.enter("find");
        }));
        let payload = res.expect_err("expected reentrancy to panic in debug builds");
        let msg = payload
            .downcast_ref::<String>()
            .expect("panic message is formatted");
        assert!(msg.contains("ChainedHashMap::find"), "{msg}");
        assert!(msg.contains("ChainedHashMap::insert is in progress"), "{msg}");
        assert_eq!(r.in_flight(), None, "guard must release during unwind");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_enter_is_noop_in_release() {
        let r = DebugReentrancy::new();
        let _g1 = r.enter("insert");
        let _g2 = r.enter("find");
    }
}
