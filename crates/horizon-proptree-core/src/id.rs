//! Wire identifiers for synchronized nodes.
//!
//! Every [`SyncNode`](crate::SyncNode) carries a [`NodeId`] that both sides of
//! a sync boundary use as the correlation key. IDs come from an explicit
//! [`IdGenerator`] rather than global state, so tests can seed them
//! deterministically and several forests can share one ID space through a
//! [`SharedIdGenerator`].

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Identifier stamped on a synchronized node at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The raw wire value.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Monotonic source of [`NodeId`]s.
///
/// IDs are never handed out twice by the same generator. A restart gets a
/// fresh ID space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    /// `None` once `u32::MAX` has been handed out.
    next: Option<u32>,
}

impl IdGenerator {
    /// Seed used by [`IdGenerator::new`].
    pub const DEFAULT_SEED: u32 = 0x1234_5678;

    /// Create a generator starting at [`Self::DEFAULT_SEED`].
    pub fn new() -> Self {
        Self::with_seed(Self::DEFAULT_SEED)
    }

    /// Create a generator whose first ID is `seed`.
    pub fn with_seed(seed: u32) -> Self {
        Self { next: Some(seed) }
    }

    /// Hand out the next ID.
    ///
    /// # Panics
    ///
    /// Panics if the 32-bit ID space is exhausted.
    pub fn next_id(&mut self) -> NodeId {
        let Some(id) = self.next else {
            panic!("node id space exhausted");
        };
        self.next = id.checked_add(1);
        NodeId(id)
    }

    /// The ID the next call to [`next_id`](Self::next_id) returns, or `None`
    /// when the space is exhausted.
    pub fn peek(&self) -> Option<NodeId> {
        self.next.map(NodeId)
    }

    /// Whether [`reserve`](Self::reserve) would accept `id`.
    ///
    /// The last ID of the space is never accepted: reserving it would leave
    /// nothing to hand out.
    pub fn can_reserve(&self, id: NodeId) -> bool {
        self.next.is_some() && id.0 != u32::MAX
    }

    /// Make sure `id` is never produced later.
    ///
    /// Used when nodes arrive from a create document carrying IDs minted by
    /// the other side. Returns `false`, leaving the generator unchanged, when
    /// `id` cannot be reserved; see [`can_reserve`](Self::can_reserve).
    pub fn reserve(&mut self, id: NodeId) -> bool {
        if !self.can_reserve(id) {
            return false;
        }
        if self.next.is_some_and(|next| id.0 >= next) {
            self.next = Some(id.0 + 1);
        }
        true
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle to an [`IdGenerator`] shared by several forests.
#[derive(Debug, Clone, Default)]
pub struct SharedIdGenerator {
    inner: Arc<Mutex<IdGenerator>>,
}

impl SharedIdGenerator {
    /// Wrap a generator.
    pub fn new(generator: IdGenerator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(generator)),
        }
    }

    pub fn next_id(&self) -> NodeId {
        self.inner.lock().next_id()
    }

    pub fn peek(&self) -> Option<NodeId> {
        self.inner.lock().peek()
    }

    pub fn can_reserve(&self, id: NodeId) -> bool {
        self.inner.lock().can_reserve(id)
    }

    pub fn reserve(&self, id: NodeId) -> bool {
        self.inner.lock().reserve(id)
    }

    /// Whether two handles draw from the same generator.
    pub fn shares_with(&self, other: &SharedIdGenerator) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<IdGenerator> for SharedIdGenerator {
    fn from(generator: IdGenerator) -> Self {
        Self::new(generator)
    }
}

static_assertions::assert_impl_all!(SharedIdGenerator: Send, Sync);
