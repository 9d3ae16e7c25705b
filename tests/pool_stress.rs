//! Concurrent stress tests for the object pools.
//!
//! Every pooled object carries an `in_use` flag. A `get` that returns an
//! object whose flag is already set means two callers hold it at once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;

use linac_core::pool::{ShardedPool, SyncPool};
use linac_core::PoolConfig;
use linac_tests::init_tracing;

#[derive(Debug, Default)]
struct Slot {
    in_use: AtomicBool,
}

type Obj = Arc<Slot>;

#[derive(Debug, Clone, Copy)]
enum Op {
    Get,
    Put,
    PutMany(usize),
    Reserve(usize),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => Just(Op::Get),
        6 => Just(Op::Put),
        2 => (1usize..4).prop_map(Op::PutMany),
        1 => (0usize..4).prop_map(Op::Reserve),
        1 => Just(Op::Clear),
    ]
}

/// Minimal surface shared by both pool kinds.
trait Pool: Sync {
    fn get(&self) -> Obj;
    fn put(&self, obj: Obj);
    fn put_many(&self, objs: Vec<Obj>);
    fn reserve(&self, count: usize);
    fn clear(&self);
}

impl Pool for SyncPool<Obj> {
    fn get(&self) -> Obj {
        SyncPool::get(self)
    }
    fn put(&self, obj: Obj) {
        SyncPool::put(self, obj);
    }
    fn put_many(&self, objs: Vec<Obj>) {
        SyncPool::put_many(self, objs);
    }
    fn reserve(&self, count: usize) {
        SyncPool::reserve(self, count);
    }
    fn clear(&self) {
        SyncPool::clear(self);
    }
}

impl Pool for ShardedPool<Obj> {
    fn get(&self) -> Obj {
        ShardedPool::get(self)
    }
    fn put(&self, obj: Obj) {
        ShardedPool::put(self, obj);
    }
    fn put_many(&self, objs: Vec<Obj>) {
        ShardedPool::put_many(self, objs);
    }
    fn reserve(&self, count: usize) {
        ShardedPool::reserve(self, count);
    }
    fn clear(&self) {
        ShardedPool::clear(self);
    }
}

fn checkout(pool: &dyn Pool, held: &mut Vec<Obj>, double: &AtomicUsize) {
    let obj = pool.get();
    if obj.in_use.swap(true, Ordering::SeqCst) {
        double.fetch_add(1, Ordering::SeqCst);
    }
    held.push(obj);
}

fn release(obj: &Obj) {
    obj.in_use.store(false, Ordering::SeqCst);
}

/// Run each script on its own thread; returns the double-checkout count.
fn run_scripts(pool: &dyn Pool, scripts: &[Vec<Op>]) -> usize {
    let double = AtomicUsize::new(0);
    std::thread::scope(|s| {
        for script in scripts {
            let double = &double;
            s.spawn(move || {
                let mut held = Vec::new();
                for &op in script {
                    match op {
                        Op::Get => checkout(pool, &mut held, double),
                        Op::Put => {
                            if let Some(obj) = held.pop() {
                                release(&obj);
                                pool.put(obj);
                            }
                        }
                        Op::PutMany(n) => {
                            let keep = held.len().saturating_sub(n);
                            let batch = held.split_off(keep);
                            batch.iter().for_each(release);
                            pool.put_many(batch);
                        }
                        Op::Reserve(n) => pool.reserve(n),
                        Op::Clear => pool.clear(),
                    }
                }
                held.iter().for_each(release);
                pool.put_many(held);
            });
        }
    });
    double.load(Ordering::SeqCst)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn sync_pool_never_double_checks_out(
        scripts in proptest::collection::vec(proptest::collection::vec(op(), 0..200), 2..8),
    ) {
        init_tracing();
        let pool = SyncPool::new(Obj::default);
        prop_assert_eq!(run_scripts(&pool, &scripts), 0);
    }

    #[test]
    fn sharded_pool_never_double_checks_out(
        scripts in proptest::collection::vec(proptest::collection::vec(op(), 0..200), 2..8),
    ) {
        init_tracing();
        let pool = ShardedPool::with_config(Obj::default, &PoolConfig::default().with_shards(3));
        prop_assert_eq!(run_scripts(&pool, &scripts), 0);
    }
}

#[test]
fn hot_loop_on_shared_pool() {
    init_tracing();
    let pool = SyncPool::with_config(Obj::default, &PoolConfig::default().with_prewarm(4));
    let scripts: Vec<Vec<Op>> = (0..8)
        .map(|_| {
            std::iter::repeat([Op::Get, Op::Get, Op::PutMany(2)])
                .take(2_000)
                .flatten()
                .collect()
        })
        .collect();
    assert_eq!(run_scripts(&pool, &scripts), 0);

    let stats = pool.stats();
    assert_eq!(stats.hits + stats.misses, 8 * 2_000 * 2);
    assert_eq!(stats.released, 8 * 2_000 * 2);
    assert_eq!(pool.idle_count() as u64, stats.constructed());
}

#[test]
fn reserve_then_drain_then_clear() {
    let made = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&made);
    let pool = SyncPool::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Obj::default()
    });

    pool.reserve(5);
    let got: Vec<Obj> = (0..5).map(|_| pool.get()).collect();
    assert_eq!(made.load(Ordering::SeqCst), 5);
    for (i, a) in got.iter().enumerate() {
        for b in &got[i + 1..] {
            assert!(!Arc::ptr_eq(a, b));
        }
    }

    pool.put_many(got);
    pool.clear();
    let _fresh = pool.get();
    assert_eq!(made.load(Ordering::SeqCst), 6);
}
