pub mod error;
pub mod runtime;
pub mod traits;
pub mod types;

pub use error::IngestError;
pub use runtime::WorkerPool;
pub use runtime::flow_control::FlowController;
pub use traits::{CommitSink, Executor};
pub use types::{DEFAULT_MAX_WORKERS, DEFAULT_RESULT_CAPACITY, PoolConfig, PoolStats};
