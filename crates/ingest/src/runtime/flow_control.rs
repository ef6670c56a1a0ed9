use std::num::NonZeroUsize;

use crate::types::PoolConfig;

/// Resolved sizing for one pool run.
#[derive(Debug, Clone)]
pub struct FlowController {
    max_workers: usize,
    requested: usize,
    result_capacity: usize,
}

impl FlowController {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            max_workers: config.max_workers.max(1),
            requested: config.workers,
            result_capacity: config.result_capacity.max(1),
        }
    }

    /// Worker count for `pending` items: the requested (or detected) count,
    /// clamped to the cap and never more than there is work for.
    pub fn workers_for(&self, pending: usize) -> usize {
        let wanted = if self.requested == 0 {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        } else {
            self.requested
        };
        wanted.min(self.max_workers).min(pending).max(1)
    }

    pub fn result_capacity(&self) -> usize {
        self.result_capacity
    }
}
