use std::time::Duration;

/// Upper bound on parse workers; each worker holds at most one open file.
pub const DEFAULT_MAX_WORKERS: usize = 8;
pub const DEFAULT_RESULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Requested worker count. `0` means one per available core.
    pub workers: usize,
    pub max_workers: usize,
    pub result_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            max_workers: DEFAULT_MAX_WORKERS,
            result_capacity: DEFAULT_RESULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    pub submitted: usize,
    pub committed: usize,
    pub elapsed: Duration,
}
