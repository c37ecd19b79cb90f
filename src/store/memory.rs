//! In-memory content store for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use super::{ContentStore, OrderField, Predicate, QueryOptions, QueryResponse, RawDocument};
use crate::error::{Error, Result};

const CURSOR_PREFIX: &str = "memory://search";

/// Holds documents and answers queries the way the real API does
pub(crate) struct MemoryStore {
    documents: Vec<RawDocument>,
    calls: AtomicUsize,
    queries: Mutex<Vec<(Predicate, QueryOptions)>>,
}

impl MemoryStore {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self {
            documents,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Number of requests served so far
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Queries received so far, in order
    pub fn queries(&self) -> Vec<(Predicate, QueryOptions)> {
        self.queries.lock().unwrap().clone()
    }

    fn matches(doc: &RawDocument, predicate: &Predicate) -> bool {
        let Predicate::At { path, value } = predicate;
        if path == "document.type" {
            return &doc.doc_type == value;
        }
        match path.strip_prefix("my.").and_then(|p| p.split_once('.')) {
            Some((doc_type, "uid")) => {
                doc.doc_type == doc_type && doc.uid.as_deref() == Some(value.as_str())
            }
            _ => false,
        }
    }

    fn sort_key(doc: &RawDocument, field: OrderField) -> Option<String> {
        match field {
            OrderField::FirstPublicationDate => doc.first_publication_date.clone(),
            OrderField::LastPublicationDate => doc.last_publication_date.clone(),
        }
    }

    fn run(&self, predicate: &Predicate, options: &QueryOptions) -> QueryResponse {
        let mut docs: Vec<&RawDocument> = self
            .documents
            .iter()
            .filter(|d| Self::matches(d, predicate))
            .collect();

        for ordering in options.orderings.iter().rev() {
            docs.sort_by(|a, b| {
                let ord = Self::sort_key(a, ordering.field).cmp(&Self::sort_key(b, ordering.field));
                if ordering.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(after) = &options.after {
            if let Some(pos) = docs.iter().position(|d| d.uid.as_deref() == Some(after)) {
                docs.drain(..=pos);
            }
        }

        let page_size = options.page_size.unwrap_or(20).max(1) as usize;
        let page = options.page.unwrap_or(1).max(1) as usize;
        let total_pages = docs.len().div_ceil(page_size) as u32;
        let results: Vec<RawDocument> = docs
            .iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .map(|d| (*d).clone())
            .collect();

        let next_page = if (page as u32) < total_pages {
            let Predicate::At { value, .. } = predicate;
            Some(format!(
                "{}?type={}&page={}&pageSize={}",
                CURSOR_PREFIX,
                value,
                page + 1,
                page_size
            ))
        } else {
            None
        };

        QueryResponse {
            page: page as u32,
            total_pages,
            next_page,
            results,
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn query(&self, predicate: &Predicate, options: &QueryOptions) -> Result<QueryResponse> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.queries
            .lock()
            .unwrap()
            .push((predicate.clone(), options.clone()));
        Ok(self.run(predicate, options))
    }

    async fn fetch_page(&self, cursor: &str) -> Result<QueryResponse> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let query = cursor
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|q| q.strip_prefix('?'))
            .ok_or_else(|| Error::InvalidCursor(cursor.to_string()))?;

        let mut doc_type = None;
        let mut options = QueryOptions::default();
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("type", v)) => doc_type = Some(v.to_string()),
                Some(("page", v)) => options.page = v.parse().ok(),
                Some(("pageSize", v)) => options.page_size = v.parse().ok(),
                _ => {}
            }
        }
        let doc_type = doc_type.ok_or_else(|| Error::InvalidCursor(cursor.to_string()))?;
        Ok(self.run(&Predicate::document_type(&doc_type), &options))
    }
}

/// Build a post document for tests
pub(crate) fn post_document(uid: &str, first: &str, last: &str) -> RawDocument {
    RawDocument {
        id: format!("id-{}", uid),
        uid: Some(uid.to_string()),
        doc_type: "posts".to_string(),
        first_publication_date: Some(first.to_string()),
        last_publication_date: Some(last.to_string()),
        data: serde_json::json!({
            "title": format!("Title {}", uid),
            "subtitle": format!("Subtitle {}", uid),
            "author": "Joseph Oliveira",
            "banner": { "url": format!("https://images.example.com/{}.png", uid) },
            "content": [
                {
                    "heading": "Proin et varius",
                    "body": [
                        { "type": "paragraph", "text": "Lorem ipsum dolor sit amet", "spans": [] }
                    ]
                }
            ]
        }),
    }
}
