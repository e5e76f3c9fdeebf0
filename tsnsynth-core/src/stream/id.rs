use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// a generator for monotonically increasing **unique** [`StreamId`]
///
/// Clones share the same counter: every stream created from any clone
/// gets a different identifier. Identifiers are never reused, even when
/// the construction of the stream fails afterward.
#[derive(Debug, Clone, Default)]
pub struct StreamIdGenerator(Arc<AtomicU64>);

/// # [`Stream`] Identifier
///
/// [`Stream`]: crate::stream::Stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(u64);

impl StreamIdGenerator {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0)))
    }

    /// generate a new unique identifier
    pub fn generate(&self) -> StreamId {
        let id = self.0.fetch_add(1, Ordering::SeqCst);

        debug_assert!(
            id != u64::MAX,
            "The stream identifier generator is about to wrap around"
        );

        StreamId(id)
    }

    /// the identifier the next call to [`generate`](Self::generate) returns
    pub fn peek(&self) -> StreamId {
        StreamId(self.0.load(Ordering::SeqCst))
    }
}

impl StreamId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn into_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
