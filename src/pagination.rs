//! Incremental "load more" pagination of the post list
//!
//! [`PaginationState`] is an explicit value owned by the caller; it is
//! never held globally. [`Paginator::advance`] takes a state and returns
//! the next one, fetching at most one page.
//!
//! A state carries a single in-flight slot. [`PaginationState::begin`]
//! claims it and hands out a [`PageRequest`]; only that request can
//! [`complete`](PaginationState::complete) the page. A second `begin`
//! while the slot is held fails with [`Error::AdvanceInFlight`], so two
//! concurrent advances can never append pages out of order.

use serde::Serialize;
use tokio::sync::Mutex;

use crate::content::PostSummary;
use crate::error::{Error, Result};
use crate::helpers::DateFormatter;
use crate::store::{ContentStore, Predicate, QueryOptions, QueryResponse};

/// What a page request fetches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTarget {
    /// First page of the list query
    FirstPage,
    /// Page addressed by a cursor from the previous response
    Cursor(String),
}

/// Claim on a state's in-flight slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    token: u64,
    pub target: PageTarget,
}

impl PageRequest {
    pub fn token(&self) -> u64 {
        self.token
    }
}

/// Client-side list state across "load more" actions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationState {
    pub current_page: u32,
    pub next_page_cursor: Option<String>,
    /// Posts of every page fetched so far, in fetch order
    pub accumulated_posts: Vec<PostSummary>,
    #[serde(skip)]
    in_flight: Option<u64>,
    #[serde(skip)]
    issued: u64,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    /// State before anything was loaded
    pub fn new() -> Self {
        Self {
            current_page: 1,
            next_page_cursor: None,
            accumulated_posts: Vec::new(),
            in_flight: None,
            issued: 0,
        }
    }

    /// State seeded from an already fetched page
    pub fn from_page(
        current_page: u32,
        next_page_cursor: Option<String>,
        posts: Vec<PostSummary>,
    ) -> Self {
        Self {
            current_page,
            next_page_cursor,
            accumulated_posts: posts,
            ..Self::new()
        }
    }

    /// Whether another page can be requested
    pub fn has_more(&self) -> bool {
        self.next_page_cursor.is_some()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Claim the in-flight slot for the next fetch
    ///
    /// Returns `Ok(None)` when there is nothing to fetch: no cursor and
    /// past the first page. Without a cursor on page 1 the first page of
    /// the list is requested.
    pub fn begin(&mut self) -> Result<Option<PageRequest>> {
        if self.in_flight.is_some() {
            return Err(Error::AdvanceInFlight);
        }

        let target = match &self.next_page_cursor {
            Some(cursor) => PageTarget::Cursor(cursor.clone()),
            None if self.current_page == 1 => PageTarget::FirstPage,
            None => return Ok(None),
        };

        self.issued += 1;
        self.in_flight = Some(self.issued);
        Ok(Some(PageRequest {
            token: self.issued,
            target,
        }))
    }

    /// Release the slot after a failed fetch
    pub fn cancel(&mut self, request: &PageRequest) {
        if self.in_flight == Some(request.token) {
            self.in_flight = None;
        }
    }

    /// Append a fetched page; returns the number of posts added
    pub fn complete(
        &mut self,
        request: &PageRequest,
        response: QueryResponse,
        dates: &DateFormatter,
    ) -> Result<usize> {
        if self.in_flight != Some(request.token) {
            return Err(Error::StaleRequest(request.token));
        }

        let posts = match response
            .results
            .iter()
            .map(|doc| PostSummary::from_document(doc, dates))
            .collect::<Result<Vec<_>>>()
        {
            Ok(posts) => posts,
            Err(e) => {
                self.in_flight = None;
                return Err(e);
            }
        };

        let added = posts.len();
        self.current_page = response.page;
        self.next_page_cursor = response.next_page;
        self.accumulated_posts.extend(posts);
        self.in_flight = None;
        Ok(added)
    }
}

/// A failed advance, handing back the untouched state
#[derive(Debug, thiserror::Error)]
#[error("failed to load page {}", .state.current_page + 1)]
pub struct AdvanceError {
    pub state: PaginationState,
    #[source]
    pub source: Error,
}

/// Cancels a shared state's request if its advance is dropped mid-fetch
struct SlotGuard<'a> {
    state: &'a Mutex<PaginationState>,
    request: PageRequest,
    armed: bool,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.state.try_lock() {
            Ok(mut state) => state.cancel(&self.request),
            Err(_) => tracing::warn!(
                "could not release request {} of an abandoned advance",
                self.request.token
            ),
        }
    }
}

/// Fetches list pages for a document type
pub struct Paginator<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    dates: &'a DateFormatter,
    doc_type: String,
    page_size: u32,
    reference: Option<String>,
}

impl<'a, S: ContentStore + ?Sized> Paginator<'a, S> {
    pub fn new(store: &'a S, dates: &'a DateFormatter, doc_type: &str, page_size: u32) -> Self {
        Self {
            store,
            dates,
            doc_type: doc_type.to_string(),
            page_size,
            reference: None,
        }
    }

    /// Read the first page at a preview revision
    pub fn with_reference(mut self, reference: Option<&str>) -> Self {
        self.reference = reference.map(str::to_string);
        self
    }

    async fn fetch(&self, target: &PageTarget) -> Result<QueryResponse> {
        match target {
            PageTarget::FirstPage => {
                let options = QueryOptions::default()
                    .page_size(self.page_size)
                    .reference(self.reference.as_deref());
                self.store
                    .query(&Predicate::document_type(&self.doc_type), &options)
                    .await
            }
            PageTarget::Cursor(cursor) => self.store.fetch_page(cursor).await,
        }
    }

    /// Load the next page into `state`
    ///
    /// Returns the state unchanged, without any fetch, once the list is
    /// exhausted.
    pub async fn advance(
        &self,
        mut state: PaginationState,
    ) -> std::result::Result<PaginationState, AdvanceError> {
        let request = match state.begin() {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::debug!("no further page after {}", state.current_page);
                return Ok(state);
            }
            Err(source) => return Err(AdvanceError { state, source }),
        };

        let response = match self.fetch(&request.target).await {
            Ok(response) => response,
            Err(source) => {
                state.cancel(&request);
                return Err(AdvanceError { state, source });
            }
        };

        match state.complete(&request, response, self.dates) {
            Ok(added) => {
                tracing::debug!(
                    "loaded page {} ({} posts, {} total)",
                    state.current_page,
                    added,
                    state.accumulated_posts.len()
                );
                Ok(state)
            }
            Err(source) => Err(AdvanceError { state, source }),
        }
    }

    /// Advance a state shared between tasks
    ///
    /// The lock is not held during the fetch; a concurrent call while a
    /// fetch is outstanding fails with [`Error::AdvanceInFlight`].
    ///
    /// Dropping the returned future before it finishes releases the slot.
    pub async fn advance_shared(&self, state: &Mutex<PaginationState>) -> Result<usize> {
        let request = match state.lock().await.begin()? {
            Some(request) => request,
            None => return Ok(0),
        };
        let mut guard = SlotGuard {
            state,
            request,
            armed: true,
        };

        let result = self.fetch(&guard.request.target).await;
        let mut locked = state.lock().await;
        guard.armed = false;
        match result {
            Ok(response) => locked.complete(&guard.request, response, self.dates),
            Err(e) => {
                locked.cancel(&guard.request);
                Err(e)
            }
        }
    }

    /// Advance until at least `pages` pages are loaded or the list ends
    pub async fn load_pages(
        &self,
        mut state: PaginationState,
        pages: u32,
    ) -> std::result::Result<PaginationState, AdvanceError> {
        if state.accumulated_posts.is_empty() && !state.has_more() {
            state = self.advance(state).await?;
        }
        while state.current_page < pages && state.has_more() {
            state = self.advance(state).await?;
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteLocale;
    use crate::store::memory::{post_document, MemoryStore};
    use crate::store::RawDocument;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    /// A store whose requests never answer
    struct StalledStore;

    #[async_trait]
    impl ContentStore for StalledStore {
        async fn query(&self, _: &Predicate, _: &QueryOptions) -> Result<QueryResponse> {
            std::future::pending().await
        }

        async fn fetch_page(&self, _: &str) -> Result<QueryResponse> {
            std::future::pending().await
        }
    }

    fn dates() -> DateFormatter {
        DateFormatter::new(SiteLocale::PtBr, "UTC", "dd MMM yyyy", "H:m").unwrap()
    }

    fn docs(n: usize) -> Vec<RawDocument> {
        (1..=n)
            .map(|i| {
                let date = format!("2021-03-{:02}T10:00:00+0000", i);
                post_document(&format!("p{}", i), &date, &date)
            })
            .collect()
    }

    fn uids(state: &PaginationState) -> Vec<&str> {
        state
            .accumulated_posts
            .iter()
            .map(|p| p.uid.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_initial_load_fetches_first_page() {
        let store = MemoryStore::new(docs(3));
        let dates = dates();
        let paginator = Paginator::new(&store, &dates, "posts", 2);

        let state = paginator.advance(PaginationState::new()).await.unwrap();
        assert_eq!(store.calls(), 1);
        assert_eq!(uids(&state), vec!["p1", "p2"]);
        assert_eq!(state.current_page, 1);
        assert!(state.has_more());
        assert_eq!(state.accumulated_posts[0].display_date.as_deref(), Some("01 mar 2021"));
    }

    #[tokio::test]
    async fn test_exhausted_state_is_noop() {
        let store = MemoryStore::new(docs(3));
        let dates = dates();
        let paginator = Paginator::new(&store, &dates, "posts", 2);

        let state = PaginationState::from_page(2, None, Vec::new());
        let after = paginator.advance(state.clone()).await.unwrap();
        assert_eq!(after, state);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_two_page_scenario() {
        let store = MemoryStore::new(docs(3));
        let dates = dates();
        let paginator = Paginator::new(&store, &dates, "posts", 2);

        let first = store
            .query(
                &Predicate::document_type("posts"),
                &QueryOptions::default().page_size(2),
            )
            .await
            .unwrap();
        assert_eq!(first.page, 1);
        let seeded: Vec<PostSummary> = first
            .results
            .iter()
            .map(|d| PostSummary::from_document(d, &dates).unwrap())
            .collect();
        let state = PaginationState::from_page(first.page, first.next_page, seeded);

        let state = paginator.advance(state).await.unwrap();
        assert_eq!(uids(&state), vec!["p1", "p2", "p3"]);
        assert_eq!(state.current_page, 2);
        assert_eq!(state.next_page_cursor, None);

        let calls = store.calls();
        let again = paginator.advance(state.clone()).await.unwrap();
        assert_eq!(again, state);
        assert_eq!(store.calls(), calls);
    }

    #[tokio::test]
    async fn test_append_count_matches_fetched_records() {
        let store = MemoryStore::new(docs(5));
        let dates = dates();
        let paginator = Paginator::new(&store, &dates, "posts", 2);

        let mut state = PaginationState::new();
        let mut previous = 0;
        for expected_new in [2, 2, 1] {
            state = paginator.advance(state).await.unwrap();
            assert_eq!(state.accumulated_posts.len(), previous + expected_new);
            previous = state.accumulated_posts.len();
        }
        assert!(!state.has_more());
    }

    #[tokio::test]
    async fn test_load_pages() {
        let store = MemoryStore::new(docs(5));
        let dates = dates();
        let paginator = Paginator::new(&store, &dates, "posts", 2);

        let state = paginator.load_pages(PaginationState::new(), 2).await.unwrap();
        assert_eq!(uids(&state), vec!["p1", "p2", "p3", "p4"]);

        let state = paginator.load_pages(PaginationState::new(), 10).await.unwrap();
        assert_eq!(state.accumulated_posts.len(), 5);
        assert_eq!(store.calls(), 5);
    }

    #[test]
    fn test_second_begin_is_rejected() {
        let mut state = PaginationState::new();
        let request = state.begin().unwrap().unwrap();
        assert_eq!(request.target, PageTarget::FirstPage);
        assert!(matches!(state.begin(), Err(Error::AdvanceInFlight)));

        state.cancel(&request);
        assert!(!state.is_in_flight());
        assert!(state.begin().unwrap().is_some());
    }

    #[test]
    fn test_stale_request_is_rejected() {
        let dates = dates();
        let mut state = PaginationState::new();
        let stale = state.begin().unwrap().unwrap();
        state.cancel(&stale);
        let _current = state.begin().unwrap().unwrap();

        let response = QueryResponse {
            page: 1,
            total_pages: 1,
            next_page: None,
            results: docs(1),
        };
        assert!(matches!(
            state.complete(&stale, response, &dates),
            Err(Error::StaleRequest(_))
        ));
        assert!(state.accumulated_posts.is_empty());
        assert!(state.is_in_flight());
    }

    #[tokio::test]
    async fn test_failed_fetch_returns_state() {
        let store = MemoryStore::new(docs(1));
        let dates = dates();
        let paginator = Paginator::new(&store, &dates, "posts", 2);

        let state = PaginationState::from_page(1, Some("bogus://cursor".to_string()), Vec::new());
        let err = paginator.advance(state.clone()).await.unwrap_err();
        assert!(matches!(err.source, Error::InvalidCursor(_)));
        assert_eq!(err.state.current_page, 1);
        assert_eq!(err.state.next_page_cursor, state.next_page_cursor);
        assert!(err.state.accumulated_posts.is_empty());
        assert!(!err.state.is_in_flight());
    }

    #[tokio::test]
    async fn test_shared_state_rejects_concurrent_advance() {
        let store = MemoryStore::new(docs(3));
        let dates = dates();
        let paginator = Paginator::new(&store, &dates, "posts", 2);
        let shared = Arc::new(Mutex::new(PaginationState::new()));

        // A request outstanding elsewhere holds the slot
        let held = shared.lock().await.begin().unwrap().unwrap();
        assert!(matches!(
            paginator.advance_shared(&shared).await,
            Err(Error::AdvanceInFlight)
        ));
        assert_eq!(store.calls(), 0);

        shared.lock().await.cancel(&held);
        assert_eq!(paginator.advance_shared(&shared).await.unwrap(), 2);
        assert_eq!(paginator.advance_shared(&shared).await.unwrap(), 1);
        assert_eq!(shared.lock().await.accumulated_posts.len(), 3);
    }

    #[tokio::test]
    async fn test_abandoned_shared_advance_releases_slot() {
        let dates = dates();
        let paginator = Paginator::new(&StalledStore, &dates, "posts", 2);
        let shared = Mutex::new(PaginationState::from_page(
            1,
            Some("https://example.com/page/2".to_string()),
            Vec::new(),
        ));

        let outcome =
            tokio::time::timeout(Duration::from_millis(20), paginator.advance_shared(&shared)).await;
        assert!(outcome.is_err());

        let mut state = shared.lock().await;
        assert!(!state.is_in_flight());
        assert!(state.begin().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_preview_reference_is_used_for_first_page() {
        let store = MemoryStore::new(docs(1));
        let dates = dates();
        let paginator =
            Paginator::new(&store, &dates, "posts", 2).with_reference(Some("preview-ref"));

        paginator.advance(PaginationState::new()).await.unwrap();
        let queries = store.queries();
        assert_eq!(queries[0].1.reference.as_deref(), Some("preview-ref"));
    }
}
