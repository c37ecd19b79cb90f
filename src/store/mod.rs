//! Content store access
//!
//! The site never owns its content: every list, post and navigation link
//! comes from a headless document store queried by document type. This
//! module defines the query vocabulary and the [`ContentStore`] seam;
//! [`PrismicClient`] talks to the real API over HTTP.

mod client;
#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use client::PrismicClient;

/// Document field a query can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    FirstPublicationDate,
    LastPublicationDate,
}

impl OrderField {
    /// Path of the field in the store's query language
    pub fn path(&self) -> &'static str {
        match self {
            OrderField::FirstPublicationDate => "document.first_publication_date",
            OrderField::LastPublicationDate => "document.last_publication_date",
        }
    }
}

/// One ordering clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: OrderField,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: OrderField) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub fn desc(field: OrderField) -> Self {
        Self {
            field,
            descending: true,
        }
    }

    fn clause(&self) -> String {
        if self.descending {
            format!("{} desc", self.field.path())
        } else {
            self.field.path().to_string()
        }
    }
}

/// Render orderings as the `orderings` query parameter
pub fn orderings_param(orderings: &[Ordering]) -> Option<String> {
    if orderings.is_empty() {
        return None;
    }
    let clauses: Vec<String> = orderings.iter().map(Ordering::clause).collect();
    Some(format!("[{}]", clauses.join(",")))
}

/// Query filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Field at `path` equals `value`
    At { path: String, value: String },
}

impl Predicate {
    /// Documents of the given custom type
    pub fn document_type(doc_type: &str) -> Self {
        Predicate::At {
            path: "document.type".to_string(),
            value: doc_type.to_string(),
        }
    }

    /// The document of `doc_type` whose uid is `uid`
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Predicate::At {
            path: format!("my.{}.uid", doc_type),
            value: uid.to_string(),
        }
    }

    /// Render as the `q` query parameter
    pub fn to_query(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                let value = value.replace('\\', "\\\\").replace('"', "\\\"");
                format!("[[at({},\"{}\")]]", path, value)
            }
        }
    }
}

/// Paging, ordering and revision options of a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: Option<u32>,
    pub page: Option<u32>,
    /// Only return documents after the one identified here
    pub after: Option<String>,
    pub orderings: Vec<Ordering>,
    /// Revision to read; the published master when absent
    pub reference: Option<String>,
}

impl QueryOptions {
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn after(mut self, anchor: &str) -> Self {
        self.after = Some(anchor.to_string());
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn reference(mut self, reference: Option<&str>) -> Self {
        self.reference = reference.map(str::to_string);
        self
    }
}

/// A document as delivered by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    /// Cursor for the following page
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub results: Vec<RawDocument>,
}

/// Read access to the document store
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Run a filtered, paged query
    async fn query(&self, predicate: &Predicate, options: &QueryOptions) -> Result<QueryResponse>;

    /// Follow a `next_page` cursor returned by an earlier query
    async fn fetch_page(&self, cursor: &str) -> Result<QueryResponse>;

    /// Fetch one document by uid, optionally at a preview revision
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<RawDocument> {
        let options = QueryOptions::default().page_size(1).reference(reference);
        let response = self.query(&Predicate::uid(doc_type, uid), &options).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }
}
