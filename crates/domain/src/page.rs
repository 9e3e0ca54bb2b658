//! One page of a paginated listing.

use serde::{Deserialize, Serialize};

/// Items of one page plus whether another page follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in backend order.
    pub data: Vec<T>,
    /// Whether a further page exists.
    #[serde(rename = "hasMore", alias = "has_more")]
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub const fn new(data: Vec<T>, has_more: bool) -> Self {
        Self { data, has_more }
    }

    /// A final page with no items.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: Vec::new(),
            has_more: false,
        }
    }
}
