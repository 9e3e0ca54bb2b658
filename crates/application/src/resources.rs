//! Typed CRUD over the backend's resource collections.

use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;
use lyceum_domain::{
    ApiError, ApiRequest, Course, ExamType, Page, PracticeExam, Resource, Subject, Topic,
};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::ports::HttpTransport;

/// Query parameter carrying the page number.
pub const PAGE_PARAM: &str = "page";
/// Query parameter carrying the page size.
pub const SIZE_PARAM: &str = "size";

/// Shapes a listing endpoint may answer with.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageEnvelope<R> {
    Page(Page<R>),
    Items {
        items: Vec<R>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default, alias = "hasMore")]
        has_more: Option<bool>,
    },
    List(Vec<R>),
}

impl<R> PageEnvelope<R> {
    fn into_page(self, page: u32, size: u32) -> Page<R> {
        match self {
            Self::Page(found) => found,
            Self::Items {
                items,
                total,
                has_more,
            } => {
                let has_more = has_more.unwrap_or_else(|| match total {
                    Some(total) => {
                        let seen = u64::from(page.saturating_sub(1)) * u64::from(size);
                        (seen + items.len() as u64) < total
                    }
                    None => items.len() == size as usize,
                });
                Page::new(items, has_more)
            }
            Self::List(items) => {
                let has_more = items.len() == size as usize;
                Page::new(items, has_more)
            }
        }
    }
}

/// CRUD service for one resource collection.
pub struct ResourceService<C: HttpTransport, R: Resource> {
    client: Arc<ApiClient<C>>,
    _resource: PhantomData<fn() -> R>,
}

impl<C: HttpTransport, R: Resource> Clone for ResourceService<C, R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _resource: PhantomData,
        }
    }
}

impl<C: HttpTransport, R: Resource> ResourceService<C, R> {
    /// Creates the service on top of a shared client.
    #[must_use]
    pub const fn new(client: Arc<ApiClient<C>>) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    /// Collection path.
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        R::COLLECTION
    }

    fn item_path(id: i64) -> String {
        format!("{}/{id}", R::COLLECTION)
    }

    /// Lists the whole collection.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the call.
    pub async fn list(&self) -> Result<Vec<R>, ApiError> {
        self.client.get(R::COLLECTION).await
    }

    /// Fetches one page of the collection.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the call.
    pub async fn page(&self, page: u32, size: u32) -> Result<Page<R>, ApiError> {
        let request = ApiRequest::get(R::COLLECTION)
            .with_query(PAGE_PARAM, page)
            .with_query(SIZE_PARAM, size);
        let envelope: PageEnvelope<R> = self.client.request(request).await?;
        Ok(envelope.into_page(page, size))
    }

    /// Fetches one item.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the call.
    pub async fn get(&self, id: i64) -> Result<R, ApiError> {
        self.client.get(&Self::item_path(id)).await
    }

    /// Creates an item from `body`.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the call.
    pub async fn create<B: Serialize + ?Sized + Sync>(&self, body: &B) -> Result<R, ApiError> {
        self.client.post(R::COLLECTION, body).await
    }

    /// Replaces an item.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the call.
    pub async fn update<B: Serialize + ?Sized + Sync>(
        &self,
        id: i64,
        body: &B,
    ) -> Result<R, ApiError> {
        self.client.put(&Self::item_path(id), body).await
    }

    /// Updates some fields of an item.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the call.
    pub async fn patch<B: Serialize + ?Sized + Sync>(
        &self,
        id: i64,
        body: &B,
    ) -> Result<R, ApiError> {
        self.client.patch(&Self::item_path(id), body).await
    }

    /// Deletes an item. Any response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the call.
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let _: serde_json::Value = self.client.delete(&Self::item_path(id)).await?;
        Ok(())
    }
}

/// Future returned by [`ResourceService::fetcher`].
pub type PageFuture<R> = BoxFuture<'static, Result<Page<R>, ApiError>>;

impl<C: HttpTransport + 'static, R: Resource> ResourceService<C, R> {
    /// Page fetcher suitable for [`PaginatedCall`](crate::calls::PaginatedCall).
    #[must_use]
    pub fn fetcher(&self) -> impl Fn(u32, u32) -> PageFuture<R> + Send + Sync + use<C, R> {
        let service = self.clone();
        move |page, size| {
            let service = service.clone();
            Box::pin(async move { service.page(page, size).await })
        }
    }
}

impl<C: HttpTransport> ResourceService<C, Topic> {
    /// Lists the topics of one subject.
    ///
    /// # Errors
    ///
    /// Returns the normalized error of the call.
    pub async fn for_subject(&self, subject_id: i64) -> Result<Vec<Topic>, ApiError> {
        let request = ApiRequest::get(Topic::COLLECTION).with_query("subject_id", subject_id);
        self.client.request(request).await
    }
}

/// Subjects.
pub type SubjectService<C> = ResourceService<C, Subject>;
/// Topics.
pub type TopicService<C> = ResourceService<C, Topic>;
/// Courses.
pub type CourseService<C> = ResourceService<C, Course>;
/// Exam types.
pub type ExamTypeService<C> = ResourceService<C, ExamType>;
/// Practice exams.
pub type PracticeExamService<C> = ResourceService<C, PracticeExam>;
