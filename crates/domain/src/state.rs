//! Request state types for UI binding.
//!
//! These are the snapshots published by the request handles in the
//! application layer; a UI renders spinners, banners and tables from them.

use serde::{Deserialize, Serialize};

use crate::api_error::ApiError;

/// Coarse phase of a [`RequestState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    /// Nothing has run yet, or the state was reset.
    #[default]
    Idle,
    /// A call is in flight.
    Loading,
    /// The last call succeeded.
    Success,
    /// The last call failed.
    Error,
}

/// State of one bound async operation.
///
/// At rest, `loading` and `error` are never set together: starting a call
/// clears the error before raising the flag.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestState<T> {
    /// Last successful result. Kept while a new call is loading.
    pub data: Option<T>,
    /// True while a call is in flight.
    pub loading: bool,
    /// Error of the last failed call.
    pub error: Option<ApiError>,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> RequestState<T> {
    /// Marks a new attempt as started.
    pub fn begin(&mut self) {
        self.error = None;
        self.loading = true;
    }

    /// Records a successful result.
    pub fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.error = None;
        self.loading = false;
    }

    /// Records a failure. Previous data is left untouched.
    pub fn fail(&mut self, error: ApiError) {
        self.error = Some(error);
        self.loading = false;
    }

    /// Returns the coarse phase.
    #[must_use]
    pub const fn phase(&self) -> RequestPhase {
        if self.loading {
            RequestPhase::Loading
        } else if self.error.is_some() {
            RequestPhase::Error
        } else if self.data.is_some() {
            RequestPhase::Success
        } else {
            RequestPhase::Idle
        }
    }

    /// Returns true if a call is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }
}

/// Accumulated state of a paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState<T> {
    /// Items of every loaded page, in page order.
    pub items: Vec<T>,
    /// Next page number to fetch.
    pub current_page: u32,
    /// Whether the backend reported more pages.
    pub has_more: bool,
    /// True while a page is in flight.
    pub loading: bool,
    /// Error of the last failed fetch.
    pub error: Option<ApiError>,
}

impl<T> PaginationState<T> {
    /// Empty state positioned at `initial_page`.
    #[must_use]
    pub const fn new(initial_page: u32) -> Self {
        Self {
            items: Vec::new(),
            current_page: initial_page,
            has_more: true,
            loading: false,
            error: None,
        }
    }
}

/// Outcome of a batch of independent calls.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchState<T> {
    /// One slot per call; `None` where the call failed.
    pub results: Vec<Option<T>>,
    /// One slot per call; `Some` where the call failed.
    pub errors: Vec<Option<ApiError>>,
    /// True while the batch runs.
    pub loading: bool,
}

impl<T> Default for BatchState<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
            loading: false,
        }
    }
}

impl<T> BatchState<T> {
    /// Number of failed calls in the last run.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_some()).count()
    }
}
