//! Batches of independent calls.

use std::future::Future;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use lyceum_domain::{ApiError, BatchState};
use tokio::sync::watch;

type Operation<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;
type ErrorCallback = Box<dyn Fn(usize, &ApiError) + Send + Sync>;

/// How a [`BatchCall`] schedules its calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// All calls start together; results are collected as they settle.
    #[default]
    Parallel,
    /// Calls run one at a time in insertion order.
    Sequential,
}

/// Runs several zero-argument calls and records each outcome in its own slot.
///
/// A failure never aborts the batch: its result slot stays `None` and the
/// error lands at the same index of [`BatchState::errors`].
pub struct BatchCall<T> {
    operations: Vec<Operation<T>>,
    mode: BatchMode,
    on_error: Option<ErrorCallback>,
    state: watch::Sender<BatchState<T>>,
}

impl<T> Default for BatchCall<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(BatchMode::default())
    }
}

impl<T> BatchCall<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Empty batch in the given mode.
    #[must_use]
    pub fn new(mode: BatchMode) -> Self {
        let (state, _) = watch::channel(BatchState::default());
        Self {
            operations: Vec::new(),
            mode,
            on_error: None,
            state,
        }
    }

    /// Appends a call. Its index is its insertion position.
    #[must_use]
    pub fn with_call<F, Fut>(mut self, operation: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.operations.push(Box::new(move || Box::pin(operation())));
        self
    }

    /// Called with the index and error of each failed call, as it settles.
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(usize, &ApiError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Scheduling mode.
    #[must_use]
    pub const fn mode(&self) -> BatchMode {
        self.mode
    }

    /// Number of calls in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if no call was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> BatchState<T> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BatchState<T>> {
        self.state.subscribe()
    }

    /// Per-slot errors of the last run.
    #[must_use]
    pub fn errors(&self) -> Vec<Option<ApiError>> {
        self.state.borrow().errors.clone()
    }

    /// Returns true while the batch runs.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Runs every call and returns one slot per call, `None` where it failed.
    pub async fn execute(&self) -> Vec<Option<T>> {
        let total = self.operations.len();
        self.state.send_modify(|state| {
            state.loading = true;
            state.results = vec![None; total];
            state.errors = vec![None; total];
        });

        match self.mode {
            BatchMode::Parallel => {
                let mut pending: FuturesUnordered<_> = self
                    .operations
                    .iter()
                    .enumerate()
                    .map(|(index, operation)| async move { (index, operation().await) })
                    .collect();
                while let Some((index, outcome)) = pending.next().await {
                    self.record(index, outcome);
                }
            }
            BatchMode::Sequential => {
                for (index, operation) in self.operations.iter().enumerate() {
                    let outcome = operation().await;
                    self.record(index, outcome);
                }
            }
        }

        self.state.send_modify(|state| state.loading = false);
        let state = self.state.borrow();
        tracing::debug!(
            total,
            failed = state.failure_count(),
            mode = ?self.mode,
            "batch settled"
        );
        state.results.clone()
    }

    /// Clears results, errors and the loading flag.
    pub fn reset(&self) {
        self.state.send_replace(BatchState::default());
    }

    fn record(&self, index: usize, outcome: Result<T, ApiError>) {
        match outcome {
            Ok(value) => self.state.send_modify(|state| state.results[index] = Some(value)),
            Err(error) => {
                if let Some(callback) = &self.on_error {
                    callback(index, &error);
                }
                self.state.send_modify(|state| state.errors[index] = Some(error));
            }
        }
    }
}
