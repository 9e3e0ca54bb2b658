//! Accumulating paginated listings.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::future::BoxFuture;
use lyceum_domain::{ApiError, Page, PaginationState};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

type PageFetcher<T> =
    Box<dyn Fn(u32, u32) -> BoxFuture<'static, Result<Page<T>, ApiError>> + Send + Sync>;

/// Paging options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationOptions {
    /// First page number.
    pub initial_page: u32,
    /// Items requested per page.
    pub page_size: u32,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            initial_page: 1,
            page_size: 10,
        }
    }
}

/// What a load request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and applied.
    Loaded {
        /// Items in the fetched page.
        count: usize,
        /// Whether another page follows.
        has_more: bool,
    },
    /// Nothing was fetched: a load was in flight, the listing is complete,
    /// or a reset discarded the result.
    Skipped,
}

/// Accumulates successive pages from a `(page, page_size)` fetcher.
///
/// `current_page` always names the next page to fetch. Items are appended in
/// page order and never reordered or deduplicated.
pub struct PaginatedCall<T> {
    fetch: PageFetcher<T>,
    options: PaginationOptions,
    state: watch::Sender<PaginationState<T>>,
    initialized: AtomicBool,
    epoch: AtomicU64,
}

impl<T> PaginatedCall<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Binds `fetch` without loading anything.
    pub fn new<F, Fut>(fetch: F, options: PaginationOptions) -> Self
    where
        F: Fn(u32, u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>, ApiError>> + Send + 'static,
    {
        let (state, _) = watch::channel(PaginationState::new(options.initial_page));
        Self {
            fetch: Box::new(move |page, size| Box::pin(fetch(page, size))),
            options,
            state,
            initialized: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
        }
    }

    /// Binds `fetch` and performs the initial load.
    ///
    /// A failed first page is recorded in the state, not returned.
    pub async fn start<F, Fut>(fetch: F, options: PaginationOptions) -> Self
    where
        F: Fn(u32, u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>, ApiError>> + Send + 'static,
    {
        let call = Self::new(fetch, options);
        if let Err(error) = call.initialize().await {
            tracing::debug!(error = %error, "initial page failed");
        }
        call
    }

    /// Paging options.
    #[must_use]
    pub const fn options(&self) -> PaginationOptions {
        self.options
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> PaginationState<T> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PaginationState<T>> {
        self.state.subscribe()
    }

    /// Loads the first page. Only the first call does anything.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error.
    pub async fn initialize(&self) -> Result<LoadOutcome, ApiError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(LoadOutcome::Skipped);
        }
        self.load_more().await
    }

    /// Fetches `current_page` and appends its items.
    ///
    /// Skipped while another load is in flight or once `has_more` is false.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error after recording it in the state.
    pub async fn load_more(&self) -> Result<LoadOutcome, ApiError> {
        let mut page = 0;
        let started = self.state.send_if_modified(|state| {
            if state.loading || !state.has_more {
                return false;
            }
            state.loading = true;
            state.error = None;
            page = state.current_page;
            true
        });
        if !started {
            return Ok(LoadOutcome::Skipped);
        }
        self.initialized.store(true, Ordering::SeqCst);

        let epoch = self.epoch.load(Ordering::SeqCst);
        let result = (self.fetch)(page, self.options.page_size).await;
        self.apply(epoch, page, result, false)
    }

    /// Reloads from the initial page and replaces the accumulated items.
    ///
    /// Runs even while a load is in flight or the listing is complete;
    /// results of loads started before the refresh are discarded. A failed
    /// refresh keeps the accumulated items and the page cursor.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error after recording it in the state.
    pub async fn refresh(&self) -> Result<LoadOutcome, ApiError> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let page = self.options.initial_page;
        self.initialized.store(true, Ordering::SeqCst);
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = (self.fetch)(page, self.options.page_size).await;
        self.apply(epoch, page, result, true)
    }

    /// Empties the listing and rewinds to the initial page.
    ///
    /// Does not fetch. In-flight loads finish but their results are dropped.
    pub fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(PaginationState::new(self.options.initial_page));
    }

    fn apply(
        &self,
        epoch: u64,
        page: u32,
        result: Result<Page<T>, ApiError>,
        replace: bool,
    ) -> Result<LoadOutcome, ApiError> {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(page, "dropping page fetched before reset");
            return result.map(|_| LoadOutcome::Skipped);
        }

        match result {
            Ok(fetched) => {
                let count = fetched.data.len();
                let has_more = fetched.has_more;
                self.state.send_modify(|state| {
                    if replace {
                        state.items = fetched.data;
                    } else {
                        state.items.extend(fetched.data);
                    }
                    state.current_page = page + 1;
                    state.has_more = has_more;
                    state.loading = false;
                });
                tracing::debug!(page, count, has_more, "page loaded");
                Ok(LoadOutcome::Loaded { count, has_more })
            }
            Err(error) => {
                self.state.send_modify(|state| {
                    state.error = Some(error.clone());
                    state.loading = false;
                });
                Err(error)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Fetcher that serves scripted pages and records each `(page, size)` asked for.
    #[derive(Clone, Default)]
    struct ScriptedPages {
        pages: Arc<Mutex<VecDeque<Result<Page<char>, ApiError>>>>,
        calls: Arc<Mutex<Vec<(u32, u32)>>>,
    }

    impl ScriptedPages {
        fn then(self, page: Result<Page<char>, ApiError>) -> Self {
            self.pages.lock().push_back(page);
            self
        }

        fn calls(&self) -> Vec<(u32, u32)> {
            self.calls.lock().clone()
        }

        fn call(&self, options: PaginationOptions) -> PaginatedCall<char> {
            let script = self.clone();
            PaginatedCall::new(
                move |page, size| {
                    script.calls.lock().push((page, size));
                    let next = script
                        .pages
                        .lock()
                        .pop_front()
                        .unwrap_or_else(|| Ok(Page::empty()));
                    async move { next }
                },
                options,
            )
        }
    }

    #[tokio::test]
    async fn test_accumulates_pages_then_stops() {
        let script = ScriptedPages::default()
            .then(Ok(Page::new(vec!['a', 'b'], true)))
            .then(Ok(Page::new(vec!['c'], false)));
        let call = script.call(PaginationOptions::default());

        call.load_more().await.unwrap();
        assert_eq!(call.state().current_page, 2);
        let last = call.load_more().await.unwrap();
        let third = call.load_more().await.unwrap();

        let state = call.state();
        assert_eq!(state.items, vec!['a', 'b', 'c']);
        assert_eq!(state.current_page, 3);
        assert!(!state.has_more);
        assert_eq!(last, LoadOutcome::Loaded { count: 1, has_more: false });
        assert_eq!(third, LoadOutcome::Skipped);
        assert_eq!(script.calls(), vec![(1, 10), (2, 10)]);
    }

    #[tokio::test]
    async fn test_start_loads_initial_page_once() {
        let script = ScriptedPages::default().then(Ok(Page::new(vec!['x'], true)));
        let options = PaginationOptions {
            initial_page: 0,
            page_size: 25,
        };
        let captured = script.clone();
        let call = PaginatedCall::start(
            move |page, size| {
                captured.calls.lock().push((page, size));
                let next = captured.pages.lock().pop_front().unwrap();
                async move { next }
            },
            options,
        )
        .await;

        assert_eq!(call.initialize().await.unwrap(), LoadOutcome::Skipped);
        assert_eq!(call.state().items, vec!['x']);
        assert_eq!(call.state().current_page, 1);
        assert_eq!(script.calls(), vec![(0, 25)]);
    }

    #[tokio::test]
    async fn test_load_more_skipped_while_loading() {
        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(gate)));
        let call = Arc::new(PaginatedCall::new(
            move |_, _| {
                let gate = gate.lock().take();
                async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    Ok(Page::new(vec![1u8], true))
                }
            },
            PaginationOptions::default(),
        ));

        let first = {
            let call = call.clone();
            tokio::spawn(async move { call.load_more().await })
        };
        call.subscribe().wait_for(|state| state.loading).await.unwrap();

        assert_eq!(call.load_more().await.unwrap(), LoadOutcome::Skipped);
        release.send(()).unwrap();
        first.await.unwrap().unwrap();
        assert_eq!(call.state().items, vec![1]);
    }

    #[tokio::test]
    async fn test_refresh_replaces_items_and_bypasses_guard() {
        let script = ScriptedPages::default()
            .then(Ok(Page::new(vec!['a'], false)))
            .then(Ok(Page::new(vec!['z', 'y'], true)));
        let call = script.call(PaginationOptions::default());

        call.load_more().await.unwrap();
        assert!(!call.state().has_more);
        call.refresh().await.unwrap();

        let state = call.state();
        assert_eq!(state.items, vec!['z', 'y']);
        assert_eq!(state.current_page, 2);
        assert!(state.has_more);
        assert_eq!(script.calls(), vec![(1, 10), (1, 10)]);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cursor() {
        let script = ScriptedPages::default()
            .then(Ok(Page::new(vec!['a', 'b'], true)))
            .then(Ok(Page::new(vec!['c'], true)))
            .then(Err(ApiError::network("offline")))
            .then(Ok(Page::new(vec!['d'], false)));
        let call = script.call(PaginationOptions::default());

        call.load_more().await.unwrap();
        call.load_more().await.unwrap();
        let error = call.refresh().await.unwrap_err();

        let failed = call.state();
        assert_eq!(failed.items, vec!['a', 'b', 'c']);
        assert_eq!(failed.current_page, 3);
        assert_eq!(failed.error, Some(error));
        assert!(!failed.loading);

        call.load_more().await.unwrap();
        let state = call.state();
        assert_eq!(state.items, vec!['a', 'b', 'c', 'd']);
        assert_eq!(state.current_page, 4);
        assert_eq!(script.calls(), vec![(1, 10), (2, 10), (1, 10), (3, 10)]);
    }

    #[tokio::test]
    async fn test_failure_keeps_page_and_allows_retry() {
        let script = ScriptedPages::default()
            .then(Err(ApiError::network("offline")))
            .then(Ok(Page::new(vec!['a'], true)));
        let call = script.call(PaginationOptions::default());

        let error = call.load_more().await.unwrap_err();
        let failed = call.state();
        assert_eq!(failed.error, Some(error));
        assert_eq!(failed.current_page, 1);
        assert!(!failed.loading);

        call.load_more().await.unwrap();
        let state = call.state();
        assert!(state.error.is_none());
        assert_eq!(state.items, vec!['a']);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let script = ScriptedPages::default().then(Ok(Page::new(vec!['a'], false)));
        let call = script.call(PaginationOptions::default());
        call.load_more().await.unwrap();

        call.reset();
        let once = call.state();
        call.reset();

        assert_eq!(call.state(), once);
        assert_eq!(once, PaginationState::new(1));
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_page() {
        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let gate = Arc::new(Mutex::new(Some(gate)));
        let call = Arc::new(PaginatedCall::new(
            move |_, _| {
                let gate = gate.lock().take();
                async move {
                    if let Some(gate) = gate {
                        let _ = gate.await;
                    }
                    Ok(Page::new(vec![7u8], true))
                }
            },
            PaginationOptions::default(),
        ));

        let pending = {
            let call = call.clone();
            tokio::spawn(async move { call.load_more().await })
        };
        call.subscribe().wait_for(|state| state.loading).await.unwrap();
        call.reset();
        release.send(()).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), LoadOutcome::Skipped);
        assert!(call.state().items.is_empty());
    }
}
