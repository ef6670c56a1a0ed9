use std::time::Instant;

use crossbeam_channel::bounded;
use rayon::ThreadPoolBuilder;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::traits::{CommitSink, Executor};
use crate::types::{PoolConfig, PoolStats};

pub mod flow_control;

use flow_control::FlowController;

/// Fixed-size fan-out / single-consumer fan-in.
///
/// The task queue holds the whole item list up front, so filling it never
/// waits on workers. Results flow through a bounded queue to the calling
/// thread, which is the only place the sink is invoked.
pub struct WorkerPool {
    flow: FlowController,
}

impl WorkerPool {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            flow: FlowController::new(config),
        }
    }

    pub fn flow(&self) -> &FlowController {
        &self.flow
    }

    pub fn run<T, R, EX, S>(
        &self,
        items: Vec<T>,
        executor: &EX,
        sink: &mut S,
    ) -> Result<PoolStats, IngestError>
    where
        T: Send,
        R: Send,
        EX: Executor<T, R> + ?Sized,
        S: CommitSink<R> + ?Sized,
    {
        let started = Instant::now();
        let submitted = items.len();
        if submitted == 0 {
            return Ok(PoolStats {
                elapsed: started.elapsed(),
                ..PoolStats::default()
            });
        }

        let workers = self.flow.workers_for(submitted);
        let (task_tx, task_rx) = bounded::<T>(submitted);
        for item in items {
            task_tx
                .send(item)
                .map_err(|_| IngestError::Disconnected("task"))?;
        }
        drop(task_tx);

        let (result_tx, result_rx) = bounded::<R>(self.flow.result_capacity());
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("jdvault-parse-{i}"))
            .build()
            .map_err(|e| IngestError::Worker(e.to_string()))?;

        debug!(workers, submitted, "starting worker pool");

        let (committed, failure) = pool.in_place_scope(move |scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move |_| {
                    for item in task_rx.iter() {
                        if result_tx.send(executor.execute(item)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            let mut committed = 0usize;
            let mut failure = None;
            for result in result_rx.iter() {
                match sink.commit(result) {
                    Ok(()) => committed += 1,
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            // Disconnect so blocked workers stop instead of filling the queue.
            drop(result_rx);
            (committed, failure)
        });

        if let Some(e) = failure {
            warn!("worker pool stopped after {committed}/{submitted} results: {e}");
            return Err(e);
        }

        Ok(PoolStats {
            workers,
            submitted,
            committed,
            elapsed: started.elapsed(),
        })
    }
}
