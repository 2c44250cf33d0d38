//! Error returned by checked accessors.

use thiserror::Error;

/// The requested key has no entry in the map.
///
/// Only the checked accessors ([`at`] and [`at_mut`]) produce it; every other
/// lookup reports absence through `Option`.
///
/// [`at`]: crate::ChainedHashMap::at
/// [`at_mut`]: crate::ChainedHashMap::at_mut
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[error("key not found")]
pub struct KeyNotFound;
