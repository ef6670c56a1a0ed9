use crate::error::IngestError;

/// Turns one work item into one result. Runs on pool threads, so it must be
/// shareable across them; it never touches the sink.
pub trait Executor<T, R>: Send + Sync {
    fn execute(&self, item: T) -> R;
}

/// Receives every result of a run on the calling thread, one at a time.
pub trait CommitSink<R> {
    fn commit(&mut self, result: R) -> Result<(), IngestError>;
}

impl<T, R, F> Executor<T, R> for F
where
    F: Fn(T) -> R + Send + Sync,
{
    fn execute(&self, item: T) -> R {
        self(item)
    }
}
