//! Bounded-parallel task runner.
//!
//! Keeps up to `limit` tasks running at once; when one finishes, the next
//! queued task is started until the queue is empty. The first failure stops
//! further scheduling: tasks already running are drained, then that error is
//! returned.

use std::fmt;
use std::future::Future;

use tokio::task::JoinSet;

/// First failure observed by [`run_bounded`].
#[derive(Debug)]
pub enum RunnerError<E> {
    /// A task returned an error. `index` is its position in submission order.
    Task { index: usize, source: E },
    /// A task panicked or was cancelled before it produced a result.
    Join(tokio::task::JoinError),
}

impl<E> RunnerError<E> {
    /// Unwraps the task's own error, if this was a task failure.
    pub fn into_task_error(self) -> Option<E> {
        match self {
            RunnerError::Task { source, .. } => Some(source),
            RunnerError::Join(_) => None,
        }
    }
}

impl<E> fmt::Display for RunnerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::Task { index, .. } => write!(f, "task {} failed", index),
            RunnerError::Join(e) => write!(f, "task did not complete: {}", e),
        }
    }
}

impl<E> std::error::Error for RunnerError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunnerError::Task { source, .. } => Some(source),
            RunnerError::Join(e) => Some(e),
        }
    }
}

/// Runs `tasks` with at most `limit` of them in flight at once.
///
/// Each task is a zero-argument closure producing a future; the closure is
/// only called when a slot frees up, so queued work costs nothing until it is
/// dispatched. Returns every task's output in submission order when all
/// succeed. A `limit` of 0 is treated as 1.
pub async fn run_bounded<I, F, Fut, T, E>(tasks: I, limit: usize) -> Result<Vec<T>, RunnerError<E>>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let limit = limit.max(1);
    let mut queue = tasks.into_iter().enumerate();
    let mut outputs: Vec<Option<T>> = Vec::new();
    let mut join_set = JoinSet::new();
    let mut first_error: Option<RunnerError<E>> = None;

    loop {
        while first_error.is_none() && join_set.len() < limit {
            let Some((index, task)) = queue.next() else {
                break;
            };
            outputs.push(None);
            let fut = task();
            join_set.spawn(async move { (index, fut.await) });
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        match joined {
            Ok((index, Ok(value))) => outputs[index] = Some(value),
            Ok((index, Err(source))) => {
                if first_error.is_none() {
                    tracing::debug!(index, "task failed, no further tasks will be started");
                    first_error = Some(RunnerError::Task { index, source });
                }
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(RunnerError::Join(e));
                }
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }
    Ok(outputs.into_iter().flatten().collect())
}
