//! Pool configuration.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Construction-time settings for [`SyncPool`](crate::pool::SyncPool) and
/// [`ShardedPool`](crate::pool::ShardedPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Capacity the idle collection starts with.
    pub initial_capacity: usize,
    /// Objects built with `reserve` when the pool is created.
    pub prewarm: usize,
    /// Shard count for a sharded pool. Zero is treated as one.
    pub shards: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            prewarm: 0,
            shards: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }
}

impl PoolConfig {
    /// Set the initial idle-collection capacity.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the number of objects built up front.
    #[must_use]
    pub fn with_prewarm(mut self, count: usize) -> Self {
        self.prewarm = count;
        self
    }

    /// Set the shard count.
    #[must_use]
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Shard count actually used, never zero.
    pub fn effective_shards(&self) -> usize {
        self.shards.max(1)
    }
}
