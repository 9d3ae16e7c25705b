//! Lock-guarded freelist pools for recycling arena buffers.
//!
//! [`SyncPool`] keeps idle objects on a stack behind one mutex: the most
//! recently released object is the next one handed out, and the factory runs
//! only when the stack is empty. [`ShardedPool`] splits the freelist by
//! execution context so concurrent callers mostly take different locks.
//!
//! Every operation, including the factory calls made by `get` and
//! `reserve`, runs while the pool's lock is held.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::PoolConfig;
use crate::context::current_execution_context_id;
use crate::stats::{AtomicPoolStats, PoolStats};

/// Shared constructor for pooled objects. Trusted to always succeed.
pub type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// A thread-safe LIFO freelist of objects built by one factory.
///
/// An object is either idle (inside the pool) or checked out (owned by
/// exactly one caller). Putting back an object that belongs to another pool
/// is allowed by the types but is a caller error.
pub struct SyncPool<T> {
    factory: Factory<T>,
    idle: Mutex<Vec<T>>,
    stats: AtomicPoolStats,
}

impl<T> SyncPool<T> {
    /// Create an empty pool.
    pub fn new(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self::from_factory(Arc::new(factory), 0)
    }

    /// Create a pool sized and pre-warmed per `config`.
    ///
    /// `config.shards` is ignored.
    pub fn with_config(
        factory: impl Fn() -> T + Send + Sync + 'static,
        config: &PoolConfig,
    ) -> Self {
        let pool = Self::from_factory(Arc::new(factory), config.initial_capacity);
        if config.prewarm > 0 {
            pool.reserve(config.prewarm);
        }
        pool
    }

    fn from_factory(factory: Factory<T>, capacity: usize) -> Self {
        Self {
            factory,
            idle: Mutex::new(Vec::with_capacity(capacity)),
            stats: AtomicPoolStats::new(),
        }
    }

    /// Check out an object: the most recently released idle one, or a fresh
    /// one from the factory.
    pub fn get(&self) -> T {
        let mut idle = self.idle.lock();
        if let Some(obj) = idle.pop() {
            self.stats.record_hit();
            return obj;
        }
        self.stats.record_miss();
        (self.factory)()
    }

    /// Return a checked-out object.
    pub fn put(&self, obj: T) {
        self.idle.lock().push(obj);
        self.stats.record_released(1);
    }

    /// Return several checked-out objects, in iteration order.
    ///
    /// The iterator is drained before the lock is taken, so it may itself
    /// call into this pool.
    pub fn put_many(&self, objs: impl IntoIterator<Item = T>) {
        let objs: Vec<T> = objs.into_iter().collect();
        let count = objs.len();
        self.idle.lock().extend(objs);
        self.stats.record_released(count as u64);
    }

    /// Drop every idle object.
    ///
    /// Checked-out objects are unaffected; their owners may still put them
    /// back later.
    pub fn clear(&self) {
        let discarded = std::mem::take(&mut *self.idle.lock());
        self.stats.record_discarded(discarded.len() as u64);
        debug!(discarded = discarded.len(), "pool cleared");
    }

    /// Build `count` objects with the factory and park them as idle.
    pub fn reserve(&self, count: usize) {
        let mut idle = self.idle.lock();
        idle.reserve(count);
        for _ in 0..count {
            idle.push((self.factory)());
            self.stats.record_reserved(1);
        }
        debug!(count, idle = idle.len(), "pool reserved");
    }

    /// Number of idle objects.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Snapshot of this pool's counters.
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    /// Reset this pool's counters.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }
}

impl<T> fmt::Debug for SyncPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncPool")
            .field("idle", &self.idle_count())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// A set of [`SyncPool`] shards selected by execution-context id.
///
/// Callers on different threads usually land on different shards, so they
/// rarely contend for a lock. Objects return to the caller's shard, not
/// necessarily the shard they came from.
pub struct ShardedPool<T> {
    shards: Box<[SyncPool<T>]>,
}

impl<T> ShardedPool<T> {
    /// Create `shards` empty shards (at least one).
    pub fn new(factory: impl Fn() -> T + Send + Sync + 'static, shards: usize) -> Self {
        let factory: Factory<T> = Arc::new(factory);
        let shards = (0..shards.max(1))
            .map(|_| SyncPool::from_factory(Arc::clone(&factory), 0))
            .collect();
        Self { shards }
    }

    /// Create shards per `config`; `config.prewarm` is spread across them.
    pub fn with_config(
        factory: impl Fn() -> T + Send + Sync + 'static,
        config: &PoolConfig,
    ) -> Self {
        let factory: Factory<T> = Arc::new(factory);
        let shards = (0..config.effective_shards())
            .map(|_| SyncPool::from_factory(Arc::clone(&factory), config.initial_capacity))
            .collect();
        let pool = Self { shards };
        if config.prewarm > 0 {
            pool.reserve(config.prewarm);
        }
        pool
    }

    #[allow(clippy::cast_possible_truncation)]
    fn local(&self) -> &SyncPool<T> {
        let id = current_execution_context_id();
        &self.shards[(id % self.shards.len() as u64) as usize]
    }

    /// Check out an object from the caller's shard.
    pub fn get(&self) -> T {
        self.local().get()
    }

    /// Return an object to the caller's shard.
    pub fn put(&self, obj: T) {
        self.local().put(obj);
    }

    /// Return several objects to the caller's shard.
    pub fn put_many(&self, objs: impl IntoIterator<Item = T>) {
        self.local().put_many(objs);
    }

    /// Drop every idle object in every shard.
    pub fn clear(&self) {
        for shard in &*self.shards {
            shard.clear();
        }
    }

    /// Build `count` objects, spread round-robin over the shards.
    pub fn reserve(&self, count: usize) {
        let n = self.shards.len();
        for (i, shard) in self.shards.iter().enumerate() {
            let share = count / n + usize::from(i < count % n);
            if share > 0 {
                shard.reserve(share);
            }
        }
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard at `index`, if it exists.
    pub fn shard(&self, index: usize) -> Option<&SyncPool<T>> {
        self.shards.get(index)
    }

    /// Idle objects across all shards.
    pub fn idle_count(&self) -> usize {
        self.shards.iter().map(SyncPool::idle_count).sum()
    }

    /// Counters summed across all shards.
    pub fn stats(&self) -> PoolStats {
        self.shards
            .iter()
            .map(SyncPool::stats)
            .fold(PoolStats::default(), |acc, s| acc + s)
    }
}

impl<T> fmt::Debug for ShardedPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedPool")
            .field("shards", &self.shards)
            .finish()
    }
}
