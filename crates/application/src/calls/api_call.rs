//! One async operation bound to observable request state.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use lyceum_domain::{ApiError, RequestState};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::ports::SessionHandle;

/// Manual retries allowed by default.
pub const DEFAULT_RETRY_COUNT: u32 = 3;

/// Fixed wait before each manual retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

type Operation<A, T> = Box<dyn Fn(A) -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;
type SuccessCallback<T> = Box<dyn Fn(&T) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&ApiError) + Send + Sync>;

/// Binds an async operation to a [`RequestState`] that UI code can watch.
///
/// State moves `idle -> loading -> {success, error}`; a new `execute`
/// (or a retry) moves it back to `loading`. When calls overlap, only the
/// most recently started one writes state; earlier calls still return
/// their own result to their caller.
///
/// Manual [`retry`](Self::retry) uses a fixed delay and its own budget,
/// independent from the transport client's exponential backoff.
pub struct ApiCall<A, T> {
    operation: Operation<A, T>,
    state: watch::Sender<RequestState<T>>,
    last_args: Mutex<Option<A>>,
    retries: AtomicU32,
    generation: AtomicU64,
    retry_count: u32,
    retry_delay: Duration,
    on_success: Option<SuccessCallback<T>>,
    on_error: Option<ErrorCallback>,
    session: Option<Arc<dyn SessionHandle>>,
}

impl<A, T> ApiCall<A, T>
where
    A: Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Binds `operation`.
    pub fn new<F, Fut>(operation: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            operation: Box::new(move |args| Box::pin(operation(args))),
            state,
            last_args: Mutex::new(None),
            retries: AtomicU32::new(0),
            generation: AtomicU64::new(0),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            on_success: None,
            on_error: None,
            session: None,
        }
    }

    /// Sets the manual retry budget and delay.
    #[must_use]
    pub const fn with_retry(mut self, retry_count: u32, retry_delay: Duration) -> Self {
        self.retry_count = retry_count;
        self.retry_delay = retry_delay;
        self
    }

    /// Called with every successful result.
    #[must_use]
    pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Called with every error.
    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&ApiError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Session to log out when a call ends in 401.
    #[must_use]
    pub fn with_session(mut self, session: Arc<dyn SessionHandle>) -> Self {
        self.session = Some(session);
        self
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    /// Manual retries used since the last success or reset.
    #[must_use]
    pub fn retries_used(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }

    /// Runs the operation with `args`.
    ///
    /// # Errors
    ///
    /// Returns the operation's error after recording it in the state.
    pub async fn execute(&self, args: A) -> Result<T, ApiError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_args.lock() = Some(args.clone());
        self.state.send_modify(RequestState::begin);

        let result = (self.operation)(args).await;
        let is_latest = self.generation.load(Ordering::SeqCst) == generation;

        match result {
            Ok(data) => {
                if is_latest {
                    self.retries.store(0, Ordering::SeqCst);
                    self.state.send_modify(|state| state.succeed(data.clone()));
                }
                if let Some(callback) = &self.on_success {
                    callback(&data);
                }
                Ok(data)
            }
            Err(error) => {
                if error.is_unauthorized()
                    && let Some(session) = &self.session
                {
                    session.logout().await;
                }
                if is_latest {
                    self.state.send_modify(|state| state.fail(error.clone()));
                } else {
                    tracing::debug!(generation, "discarding result of superseded call");
                }
                if let Some(callback) = &self.on_error {
                    callback(&error);
                }
                Err(error)
            }
        }
    }

    /// Re-runs the last call after the retry delay.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MaxRetriesExceeded`] once the budget is spent,
    /// [`ApiError::NothingToRetry`] before any call, or the operation's error.
    pub async fn retry(&self) -> Result<T, ApiError> {
        let Some(args) = self.last_args.lock().clone() else {
            return Err(ApiError::NothingToRetry);
        };
        let budget = self.retry_count;
        let used = self
            .retries
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < budget).then_some(used + 1)
            });
        let Ok(used) = used else {
            tracing::debug!(budget, "manual retry budget exhausted");
            return Err(ApiError::MaxRetriesExceeded { attempts: budget });
        };

        tracing::debug!(attempt = used + 1, budget, "retrying call");
        tokio::time::sleep(self.retry_delay).await;
        self.execute(args).await
    }

    /// Clears state and the retry counter. In-flight calls are not cancelled.
    pub fn reset(&self) {
        self.retries.store(0, Ordering::SeqCst);
        self.state.send_replace(RequestState::default());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lyceum_domain::RequestPhase;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::Instant;

    fn failing_call(calls: Arc<AtomicUsize>) -> ApiCall<u32, String> {
        ApiCall::new(move |_id: u32| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::from_response(500, br#"{"detail":"database unavailable"}"#))
            }
        })
    }

    #[tokio::test]
    async fn test_execute_success_updates_state() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let call = ApiCall::new(|id: u32| async move { Ok(format!("subject-{id}")) })
            .on_success(move |value: &String| sink.lock().push(value.clone()));

        let result = call.execute(3).await.unwrap();

        assert_eq!(result, "subject-3");
        let state = call.state();
        assert_eq!(state.data.as_deref(), Some("subject-3"));
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.phase(), RequestPhase::Success);
        assert_eq!(*seen.lock(), vec!["subject-3".to_string()]);
    }

    #[tokio::test]
    async fn test_execute_failure_records_error_and_rethrows() {
        let errors = Arc::new(AtomicUsize::new(0));
        let counter = errors.clone();
        let call = failing_call(Arc::new(AtomicUsize::new(0))).on_error(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let error = call.execute(1).await.unwrap_err();

        assert_eq!(error.message(), "database unavailable");
        let state = call.state();
        assert_eq!(state.error, Some(error));
        assert!(!state.loading);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loading_is_observable_while_in_flight() {
        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(gate)));
        let call = Arc::new(ApiCall::new(move |fail: bool| {
            let gate = gate.lock().take();
            async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                if fail {
                    Err(ApiError::network("offline"))
                } else {
                    Ok(1u8)
                }
            }
        }));

        let mut rx = call.subscribe();
        let background = {
            let call = call.clone();
            tokio::spawn(async move { call.execute(false).await })
        };
        rx.wait_for(|state| state.loading).await.unwrap();
        let during = call.state();
        assert!(during.loading);
        assert!(during.error.is_none());

        release.send(()).unwrap();
        assert_eq!(background.await.unwrap(), Ok(1));
        assert_eq!(call.state().phase(), RequestPhase::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_is_enforced() {
        let calls = Arc::new(AtomicUsize::new(0));
        let call = failing_call(calls.clone()).with_retry(2, Duration::from_millis(500));

        assert!(call.execute(9).await.is_err());
        assert!(call.retry().await.is_err());
        assert!(call.retry().await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let error = call.retry().await.unwrap_err();

        assert_eq!(error, ApiError::MaxRetriesExceeded { attempts: 2 });
        assert_eq!(error.message(), "Maximum retry attempts reached");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_fixed_delay_with_last_args() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let call = ApiCall::new(move |id: u32| {
            sink.lock().push((id, Instant::now()));
            async move { Err::<(), _>(ApiError::network("offline")) }
        })
        .with_retry(3, Duration::from_millis(250));

        call.execute(42).await.unwrap_err();
        call.retry().await.unwrap_err();
        call.retry().await.unwrap_err();

        let seen = seen.lock().clone();
        assert_eq!(seen.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![42, 42, 42]);
        assert_eq!(seen[1].1 - seen[0].1, Duration::from_millis(250));
        assert_eq!(seen[2].1 - seen[1].1, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_retry_before_execute() {
        let call = failing_call(Arc::new(AtomicUsize::new(0)));
        assert_eq!(call.retry().await, Err(ApiError::NothingToRetry));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_retry_counter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let call = ApiCall::new(move |_: ()| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 1 {
                    Ok(n)
                } else {
                    Err(ApiError::network("flaky"))
                }
            }
        })
        .with_retry(1, Duration::from_millis(10));

        call.execute(()).await.unwrap_err();
        assert_eq!(call.retry().await, Ok(1));
        assert_eq!(call.retries_used(), 0);
        call.execute(()).await.unwrap_err();
        assert!(matches!(call.retry().await, Err(ApiError::Network { .. })));
    }

    struct CountingSession(AtomicUsize);

    impl SessionHandle for CountingSession {
        fn logout(&self) -> BoxFuture<'_, ()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {})
        }
    }

    #[tokio::test]
    async fn test_unauthorized_triggers_logout() {
        let session = Arc::new(CountingSession(AtomicUsize::new(0)));
        let call = ApiCall::new(|_: ()| async {
            Err::<(), _>(ApiError::from_response(401, br#"{"detail":"expired"}"#))
        })
        .with_retry(0, Duration::ZERO)
        .with_session(session.clone());

        let error = call.execute(()).await.unwrap_err();

        assert!(error.is_unauthorized());
        assert_eq!(session.0.load(Ordering::SeqCst), 1);
        assert_eq!(call.state().error, Some(error));
    }

    #[tokio::test]
    async fn test_non_auth_failure_does_not_logout() {
        let session = Arc::new(CountingSession(AtomicUsize::new(0)));
        let call = failing_call(Arc::new(AtomicUsize::new(0))).with_session(session.clone());

        call.execute(1).await.unwrap_err();

        assert_eq!(session.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let call = failing_call(Arc::new(AtomicUsize::new(0))).with_retry(1, Duration::ZERO);
        call.execute(1).await.unwrap_err();
        call.retry().await.unwrap_err();

        call.reset();
        let once = call.state();
        let used_once = call.retries_used();
        call.reset();

        assert_eq!(call.state(), once);
        assert_eq!(call.retries_used(), used_once);
        assert_eq!(once, RequestState::default());
        assert_eq!(used_once, 0);
    }

    #[tokio::test]
    async fn test_latest_call_owns_state() {
        let (release_first, first_gate) = tokio::sync::oneshot::channel::<()>();
        let gates = Arc::new(Mutex::new(vec![first_gate]));
        let call = Arc::new(ApiCall::new(move |id: u32| {
            let gate = if id == 1 { gates.lock().pop() } else { None };
            async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                Ok(id)
            }
        }));

        let slow = {
            let call = call.clone();
            tokio::spawn(async move { call.execute(1).await })
        };
        tokio::task::yield_now().await;
        let mut rx = call.subscribe();
        rx.wait_for(|state| state.loading).await.unwrap();

        assert_eq!(call.execute(2).await, Ok(2));
        release_first.send(()).unwrap();
        assert_eq!(slow.await.unwrap(), Ok(1));

        assert_eq!(call.state().data, Some(2));
    }
}
