//! Post models and their normalisation from store documents

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::richtext::{as_text, RichTextBlock};
use crate::error::{Error, Result};
use crate::helpers::{DateFormatter, Timestamp};
use crate::store::RawDocument;

/// A post as listed on the home page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    /// URL-friendly identifier
    pub uid: String,

    /// First publication, if the document was ever published
    pub first_publication_date: Option<Timestamp>,

    /// Localised rendering of `first_publication_date`
    pub display_date: Option<String>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// Map a store document onto a summary
    pub fn from_document(doc: &RawDocument, dates: &DateFormatter) -> Result<Self> {
        let uid = document_uid(doc)?;
        let first_publication_date = parse_date(doc, doc.first_publication_date.as_deref())?;

        Ok(Self {
            display_date: first_publication_date.as_ref().map(|d| dates.date(d)),
            first_publication_date,
            title: text_field(&doc.data, "title"),
            subtitle: text_field(&doc.data, "subtitle"),
            author: text_field(&doc.data, "author"),
            uid,
        })
    }
}

/// One titled section of a post body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// A full post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<Timestamp>,
    pub last_publication_date: Option<Timestamp>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    /// Rendered top to bottom
    pub content: Vec<ContentSection>,
}

impl PostDetail {
    /// Map a store document onto a post
    pub fn from_document(doc: &RawDocument) -> Result<Self> {
        let uid = document_uid(doc)?;

        let content = match doc.data.get("content") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => parse_sections(value).map_err(|e| {
                tracing::warn!("malformed content on {}: {}", doc.id, e);
                Error::Json(e)
            })?,
        };

        let banner_url = doc
            .data
            .get("banner")
            .and_then(|b| b.get("url"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            first_publication_date: parse_date(doc, doc.first_publication_date.as_deref())?,
            last_publication_date: parse_date(doc, doc.last_publication_date.as_deref())?,
            title: text_field(&doc.data, "title"),
            subtitle: text_field(&doc.data, "subtitle"),
            author: text_field(&doc.data, "author"),
            banner_url,
            content,
            uid,
        })
    }
}

/// Section headings arrive either as plain strings or as rich text
fn parse_sections(value: &Value) -> serde_json::Result<Vec<ContentSection>> {
    #[derive(Deserialize)]
    struct RawSection {
        #[serde(default)]
        heading: Value,
        #[serde(default)]
        body: Vec<RichTextBlock>,
    }

    let raw: Vec<RawSection> = serde_json::from_value(value.clone())?;
    Ok(raw
        .into_iter()
        .map(|s| ContentSection {
            heading: value_text(&s.heading),
            body: s.body,
        })
        .collect())
}

fn document_uid(doc: &RawDocument) -> Result<String> {
    doc.uid
        .clone()
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| Error::MissingField {
            document: doc.id.clone(),
            field: "uid",
        })
}

fn parse_date(doc: &RawDocument, value: Option<&str>) -> Result<Option<Timestamp>> {
    match value {
        None => Ok(None),
        Some(raw) => Timestamp::parse(raw)
            .map(Some)
            .ok_or_else(|| Error::InvalidDate {
                document: doc.id.clone(),
                value: raw.to_string(),
            }),
    }
}

/// Key text fields may be plain strings or rich-text arrays
fn text_field(data: &Value, key: &str) -> String {
    data.get(key).map(value_text).unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) => serde_json::from_value::<Vec<RichTextBlock>>(value.clone())
            .map(|blocks| as_text(&blocks))
            .unwrap_or_default(),
        _ => String::new(),
    }
}
