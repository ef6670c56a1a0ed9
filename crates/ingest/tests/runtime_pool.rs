use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::ThreadId;

use jdvault_ingest::{CommitSink, Executor, IngestError, PoolConfig, WorkerPool};

fn config(workers: usize) -> PoolConfig {
    PoolConfig {
        workers,
        max_workers: 4,
        result_capacity: 2,
    }
}

struct DoublingExecutor {
    seen_threads: Mutex<BTreeSet<String>>,
}

impl Executor<u32, (u32, ThreadId)> for DoublingExecutor {
    fn execute(&self, item: u32) -> (u32, ThreadId) {
        let current = std::thread::current();
        self.seen_threads
            .lock()
            .expect("lock poisoned")
            .insert(current.name().unwrap_or_default().to_string());
        (item * 2, current.id())
    }
}

#[derive(Default)]
struct CollectingSink {
    values: Vec<u32>,
    consumer_threads: HashSet<ThreadId>,
}

impl CommitSink<(u32, ThreadId)> for CollectingSink {
    fn commit(&mut self, result: (u32, ThreadId)) -> Result<(), IngestError> {
        self.values.push(result.0);
        self.consumer_threads.insert(std::thread::current().id());
        Ok(())
    }
}

struct FailingSink {
    fail_at: usize,
    seen: usize,
}

impl CommitSink<u32> for FailingSink {
    fn commit(&mut self, _result: u32) -> Result<(), IngestError> {
        self.seen += 1;
        if self.seen == self.fail_at {
            return Err(IngestError::Commit("disk full".to_string()));
        }
        Ok(())
    }
}

#[test]
fn test_every_item_is_committed_once() {
    let pool = WorkerPool::new(&config(3));
    let executor = DoublingExecutor {
        seen_threads: Mutex::new(BTreeSet::new()),
    };
    let mut sink = CollectingSink::default();

    let stats = pool
        .run((0..100).collect::<Vec<u32>>(), &executor, &mut sink)
        .unwrap();

    assert_eq!(stats.workers, 3);
    assert_eq!(stats.submitted, 100);
    assert_eq!(stats.committed, 100);

    let mut values = sink.values.clone();
    values.sort_unstable();
    assert_eq!(values, (0..100).map(|v| v * 2).collect::<Vec<_>>());

    // Workers run on the named pool; the sink only ever sees the caller.
    let names = executor.seen_threads.lock().unwrap();
    assert!(names.iter().all(|n| n.starts_with("jdvault-parse-")));
    assert_eq!(sink.consumer_threads.len(), 1);
    assert!(sink.consumer_threads.contains(&std::thread::current().id()));
}

#[test]
fn test_empty_input_spawns_nothing() {
    let pool = WorkerPool::new(&config(2));
    let calls = AtomicUsize::new(0);
    let executor = |item: u32| {
        calls.fetch_add(1, Ordering::SeqCst);
        item
    };
    let mut sink = FailingSink {
        fail_at: 1,
        seen: 0,
    };

    let stats = pool.run(Vec::<u32>::new(), &executor, &mut sink).unwrap();

    assert_eq!(stats.submitted, 0);
    assert_eq!(stats.workers, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_sink_error_stops_the_run() {
    let pool = WorkerPool::new(&config(4));
    let executor = |item: u32| item;
    let mut sink = FailingSink {
        fail_at: 5,
        seen: 0,
    };

    let err = pool
        .run((0..1_000).collect::<Vec<u32>>(), &executor, &mut sink)
        .unwrap_err();

    assert!(matches!(err, IngestError::Commit(msg) if msg == "disk full"));
    assert_eq!(sink.seen, 5);
}

#[test]
fn test_worker_count_never_exceeds_items() {
    let pool = WorkerPool::new(&PoolConfig {
        workers: 0,
        max_workers: 16,
        result_capacity: 1,
    });
    let executor = |item: u32| item;
    let mut sink = FailingSink {
        fail_at: usize::MAX,
        seen: 0,
    };

    let stats = pool.run(vec![7u32, 8], &executor, &mut sink).unwrap();

    assert!(stats.workers >= 1 && stats.workers <= 2);
    assert_eq!(stats.committed, 2);
}
