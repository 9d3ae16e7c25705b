//! # linac-core
//!
//! Low-level support beneath a linear (arena) allocator.
//!
//! - [`mem`]: word-then-byte copy and zero-fill over raw memory spans.
//! - [`context`]: cheap identifier of the calling execution context, with a
//!   self-calibrating fast path.
//! - [`boxed`]: raw data pointers behind `dyn Any` values and an
//!   optimization barrier.
//! - [`pool`]: mutex-guarded LIFO freelists for recycling arena buffers.
//!
//! Outside of tests, only [`mem`] contains `unsafe` code.
#![warn(missing_docs)]

pub mod boxed;
pub mod config;
pub mod context;
pub mod error;
pub mod mem;
pub mod pool;
pub mod stats;

pub use boxed::{prevent_escape, raw_data_pointer, BoxedValue, ScalarKind};
pub use config::PoolConfig;
pub use context::{current_execution_context_id, ContextIdResolver, ExecutionHost, ThreadHost};
pub use error::ContextIdError;
pub use mem::{clear_memory, copy_memory, MemorySpan};
pub use pool::{ShardedPool, SyncPool};
pub use stats::PoolStats;
