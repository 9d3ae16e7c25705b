//! Execution-context identification.
//!
//! Resolves a small integer naming the calling execution unit, for sharding
//! per-context caches without a lock. Two paths back the lookup:
//!
//! - **Authoritative:** parse the host's diagnostic description of the
//!   current unit (`"context 17 [worker-3]:"`). Always correct, comparatively
//!   slow, and fatal if the description is malformed.
//! - **Calibrated:** read the identifier straight out of the unit's control
//!   block at a cached word offset. The offset is discovered by scanning the
//!   control block for the authoritative id and is published only when
//!   exactly one word in the window matches.
//!
//! Units may race to calibrate. Each publisher validated its own scan before
//! storing, so whichever store lands last is correct, and a single atomic
//! word is all the shared state there is.

#[cfg(test)]
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::{debug, error, trace};

use crate::error::ContextIdError;

/// Number of control-block words scanned during calibration.
pub const CONTROL_BLOCK_WORDS: usize = 32;

/// Label every diagnostic description starts with.
pub const DESCRIPTION_PREFIX: &str = "context ";

/// Offset cache value before any calibration succeeded.
const UNCALIBRATED: usize = usize::MAX;

/// The host runtime as seen by the identifier.
pub trait ExecutionHost {
    /// Copy of the scanned window of the calling unit's control block.
    fn control_block(&self) -> [u64; CONTROL_BLOCK_WORDS];

    /// Read one word of the calling unit's control block.
    ///
    /// `offset` is always below [`CONTROL_BLOCK_WORDS`].
    fn read_slot(&self, offset: usize) -> u64;

    /// Diagnostic description of the calling unit, starting with
    /// [`DESCRIPTION_PREFIX`] followed by the numeric identifier.
    fn describe_current(&self) -> String;
}

/// Extract the numeric identifier from a diagnostic description.
pub fn parse_description(description: &str) -> Result<u64, ContextIdError> {
    let rest = description
        .strip_prefix(DESCRIPTION_PREFIX)
        .ok_or_else(|| ContextIdError::MissingPrefix {
            description: description.to_owned(),
            expected: DESCRIPTION_PREFIX,
        })?;
    let token = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| ContextIdError::MissingId(description.to_owned()))?;
    token.parse().map_err(|source| ContextIdError::InvalidId {
        token: token.to_owned(),
        source,
    })
}

/// Index of the only word equal to `id`, or `None` if there are zero or
/// several.
fn unique_slot(window: &[u64], id: u64) -> Option<usize> {
    let mut found = None;
    for (idx, &word) in window.iter().enumerate() {
        if word == id {
            if found.is_some() {
                return None;
            }
            found = Some(idx);
        }
    }
    found
}

/// Identifier lookup over one host, owning that host's offset cache.
pub struct ContextIdResolver<H> {
    host: H,
    offset: AtomicUsize,
}

impl<H> ContextIdResolver<H> {
    /// Create an uncalibrated resolver.
    pub const fn new(host: H) -> Self {
        Self {
            host,
            offset: AtomicUsize::new(UNCALIBRATED),
        }
    }

    /// The cached control-block offset, once some call calibrated it.
    pub fn calibrated_offset(&self) -> Option<usize> {
        match self.offset.load(Ordering::Acquire) {
            UNCALIBRATED => None,
            offset => Some(offset),
        }
    }

    /// The host this resolver reads from.
    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: ExecutionHost> ContextIdResolver<H> {
    /// Identifier of the calling execution unit.
    ///
    /// Uses the cached offset when one is published. Otherwise resolves the
    /// authoritative id and tries to calibrate on the way out; a failed
    /// attempt is simply retried by a later call.
    ///
    /// # Panics
    ///
    /// Panics if the host's description is malformed (see
    /// [`authoritative_id`](Self::authoritative_id)).
    pub fn current_id(&self) -> u64 {
        if let Some(offset) = self.calibrated_offset() {
            return self.host.read_slot(offset);
        }

        let id = self.authoritative_id();
        let window = self.host.control_block();
        match unique_slot(&window, id) {
            Some(offset) => {
                self.offset.store(offset, Ordering::Release);
                debug!(offset, id, "calibrated execution-context id offset");
            }
            None => trace!(id, "calibration scan not unique, keeping slow path"),
        }
        id
    }

    /// Identifier from the host's diagnostic description, bypassing the
    /// offset cache.
    ///
    /// # Panics
    ///
    /// Panics if the description cannot be parsed. The host broke its
    /// contract and there is no fallback.
    pub fn authoritative_id(&self) -> u64 {
        let description = self.host.describe_current();
        match parse_description(&description) {
            Ok(id) => id,
            Err(err) => {
                error!(%err, "execution host produced a malformed description");
                panic!("cannot identify execution context: {err}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Native host: one control block per OS thread
// ---------------------------------------------------------------------------

const BLOCK_MAGIC: u64 = 0x6c69_6e61_635f_7463;
const STATUS_RUNNING: u64 = 2;

const SLOT_MAGIC: usize = 0;
const SLOT_STATUS: usize = 1;
const SLOT_ID: usize = 9;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// Per-thread bookkeeping record, created on the thread's first lookup.
struct ThreadControlBlock {
    words: [u64; CONTROL_BLOCK_WORDS],
    #[cfg(test)]
    reads: Cell<u64>,
}

impl ThreadControlBlock {
    fn new() -> Self {
        let mut words = [0; CONTROL_BLOCK_WORDS];
        words[SLOT_MAGIC] = BLOCK_MAGIC;
        words[SLOT_STATUS] = STATUS_RUNNING;
        words[SLOT_ID] = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            words,
            #[cfg(test)]
            reads: Cell::new(0),
        }
    }
}

thread_local! {
    static CONTROL_BLOCK: ThreadControlBlock = ThreadControlBlock::new();
}

/// Host backed by thread-local control blocks.
///
/// Thread ids start at 1 and are never reused within the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadHost;

#[cfg(test)]
impl ThreadHost {
    /// Fast-path reads performed by the calling thread so far.
    fn slot_reads(self) -> u64 {
        CONTROL_BLOCK.with(|block| block.reads.get())
    }
}

impl ExecutionHost for ThreadHost {
    fn control_block(&self) -> [u64; CONTROL_BLOCK_WORDS] {
        CONTROL_BLOCK.with(|block| block.words)
    }

    fn read_slot(&self, offset: usize) -> u64 {
        CONTROL_BLOCK.with(|block| {
            #[cfg(test)]
            block.reads.set(block.reads.get() + 1);
            block.words[offset]
        })
    }

    fn describe_current(&self) -> String {
        let id = CONTROL_BLOCK.with(|block| block.words[SLOT_ID]);
        let thread = std::thread::current();
        format!(
            "{DESCRIPTION_PREFIX}{id} [{}]:",
            thread.name().unwrap_or("unnamed")
        )
    }
}

static RESOLVER: ContextIdResolver<ThreadHost> = ContextIdResolver::new(ThreadHost);

/// Identifier of the calling thread, via the process-wide resolver.
pub fn current_execution_context_id() -> u64 {
    RESOLVER.current_id()
}

/// Identifier of the calling thread from the slow path only.
pub fn authoritative_execution_context_id() -> u64 {
    RESOLVER.authoritative_id()
}

/// The process-wide resolver's calibrated offset, if any.
pub fn process_calibrated_offset() -> Option<usize> {
    RESOLVER.calibrated_offset()
}
