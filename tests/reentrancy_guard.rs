use chained_hashmap::ChainedHashMap;
use std::borrow::Borrow;
use std::cell::Cell;
use std::hash::{BuildHasher, Hash, Hasher};

#[derive(Clone, Default)]
struct OneChain;
struct ZeroHasher;

impl BuildHasher for OneChain {
    type Hasher = ZeroHasher;
    fn build_hasher(&self) -> ZeroHasher {
        ZeroHasher
    }
}

impl Hasher for ZeroHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

type Map = ChainedHashMap<CallbackKey, i32, OneChain>;

// Key whose `Eq` reads the map it is stored in when `map` is set. Every key
// hashes to chain 0, so any lookup compares against the stored keys.
struct CallbackKey {
    id: &'static str,
    map: Cell<*const Map>,
}

impl CallbackKey {
    fn plain(id: &'static str) -> Self {
        CallbackKey {
            id,
            map: Cell::new(std::ptr::null()),
        }
    }
}

impl PartialEq for CallbackKey {
    fn eq(&self, other: &Self) -> bool {
        let map = other.map.get();
        if !map.is_null() {
            // SAFETY: the map outlives the lookup and is only shared-borrowed.
            let m = unsafe { &*map };
            let _ = m.get(self.id);
        }
        self.id == other.id
    }
}

impl Eq for CallbackKey {}

impl Hash for CallbackKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Borrow<str> for CallbackKey {
    fn borrow(&self) -> &str {
        self.id
    }
}

fn map_with_a() -> Map {
    let mut m = Map::with_hasher(OneChain);
    m.insert(CallbackKey::plain("a"), 1);
    m
}

#[test]
fn plain_keys_never_trip_the_guard() {
    let mut m = map_with_a();
    m.insert(CallbackKey::plain("b"), 2);
    assert_eq!(m.get("a"), Some(&1));
    assert!(m.contains_key("b"));
    assert_eq!(m.remove("a"), Some(1));
    assert_eq!(m.len(), 1);
}

#[cfg(debug_assertions)]
#[test]
fn lookup_from_eq_panics_and_names_both_operations() {
    let m = map_with_a();
    let query = CallbackKey::plain("b");
    query.map.set(&m as *const Map);

    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| m.find(&query)));
    let payload = res.expect_err("expected reentrancy to panic in debug builds");
    let msg = payload
        .downcast_ref::<String>()
        .expect("panic message is formatted");
    assert!(msg.contains("ChainedHashMap::get_key_value"), "{msg}");
    assert!(msg.contains("ChainedHashMap::find is in progress"), "{msg}");
}

#[cfg(debug_assertions)]
#[test]
fn map_is_usable_after_a_caught_reentrancy_panic() {
    let m = map_with_a();
    let query = CallbackKey::plain("a");
    query.map.set(&m as *const Map);

    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| m.contains_key(&query)));
    assert!(res.is_err(), "expected reentrancy to panic in debug builds");

    assert_eq!(m.get("a"), Some(&1));
    assert_eq!(m.at("missing").ok(), None);
    assert_eq!(m.len(), 1);
}

#[cfg(not(debug_assertions))]
#[test]
fn lookup_from_eq_is_allowed_in_release() {
    let m = map_with_a();
    let query = CallbackKey::plain("a");
    query.map.set(&m as *const Map);
    assert!(m.find(&query).is_some());
    assert_eq!(m.get("a"), Some(&1));
}
