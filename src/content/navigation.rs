//! Previous/next post lookup

use serde::Serialize;

use super::post::{PostDetail, PostSummary};
use crate::config::NavigationConfig;
use crate::error::Result;
use crate::helpers::DateFormatter;
use crate::store::{ContentStore, OrderField, Ordering, Predicate, QueryOptions};

/// Posts adjacent to the one being rendered
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavigationResult {
    pub previous: Option<PostSummary>,
    pub next: Option<PostSummary>,
}

/// Resolves adjacent posts with two single-result queries
///
/// Both queries are anchored `after` the post's uid. "previous" orders by
/// first publication and "next" by last publication unless configured
/// otherwise, so the two sides may disagree about what is adjacent.
pub struct NavigationResolver<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    dates: &'a DateFormatter,
    doc_type: String,
    previous_ordering: OrderField,
    next_ordering: OrderField,
}

impl<'a, S: ContentStore + ?Sized> NavigationResolver<'a, S> {
    pub fn new(
        store: &'a S,
        dates: &'a DateFormatter,
        doc_type: &str,
        config: &NavigationConfig,
    ) -> Self {
        Self {
            store,
            dates,
            doc_type: doc_type.to_string(),
            previous_ordering: config.previous_ordering,
            next_ordering: config.next_ordering,
        }
    }

    pub async fn resolve(
        &self,
        detail: &PostDetail,
        reference: Option<&str>,
    ) -> Result<NavigationResult> {
        let previous = self
            .adjacent(&detail.uid, self.previous_ordering, reference)
            .await?;
        let next = self
            .adjacent(&detail.uid, self.next_ordering, reference)
            .await?;

        tracing::debug!(
            "navigation for {}: previous={:?} next={:?}",
            detail.uid,
            previous.as_ref().map(|p| &p.uid),
            next.as_ref().map(|p| &p.uid)
        );

        Ok(NavigationResult { previous, next })
    }

    async fn adjacent(
        &self,
        uid: &str,
        field: OrderField,
        reference: Option<&str>,
    ) -> Result<Option<PostSummary>> {
        let options = QueryOptions::default()
            .page_size(1)
            .after(uid)
            .order_by(Ordering::asc(field))
            .reference(reference);

        let response = self
            .store
            .query(&Predicate::document_type(&self.doc_type), &options)
            .await?;

        response
            .results
            .first()
            .map(|doc| PostSummary::from_document(doc, self.dates))
            .transpose()
    }
}
