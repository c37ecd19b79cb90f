//! Rich-text blocks and their HTML rendering
//!
//! The store delivers post bodies as structured blocks, not markup. All
//! HTML the site emits for them is built here from escaped text, so the
//! store stays outside the trust boundary: link targets are filtered by
//! scheme and provider embeds (raw third-party HTML) are dropped.

use serde::{Deserialize, Serialize};

use crate::helpers::{html_escape, is_safe_url};

/// Kind of a rich-text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Paragraph,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    #[serde(other)]
    Unknown,
}

/// Inline formatting over a character range of a block's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// One block of a rich-text field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image source
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

impl RichTextBlock {
    #[cfg(test)]
    pub(crate) fn paragraph(text: &str) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
        }
    }
}

/// Plain text of a sequence of blocks, one block per line
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render blocks to sanitised HTML
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = match block.kind {
            BlockKind::ListItem => Some("ul"),
            BlockKind::OListItem => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        match block.kind {
            BlockKind::Heading1 => wrap(&mut html, "h1", block),
            BlockKind::Heading2 => wrap(&mut html, "h2", block),
            BlockKind::Heading3 => wrap(&mut html, "h3", block),
            BlockKind::Heading4 => wrap(&mut html, "h4", block),
            BlockKind::Heading5 => wrap(&mut html, "h5", block),
            BlockKind::Heading6 => wrap(&mut html, "h6", block),
            BlockKind::Paragraph => wrap(&mut html, "p", block),
            BlockKind::ListItem | BlockKind::OListItem => wrap(&mut html, "li", block),
            BlockKind::Preformatted => {
                html.push_str("<pre>");
                html.push_str(&html_escape(&block.text));
                html.push_str("</pre>");
            }
            BlockKind::Image => match block.url.as_deref().filter(|u| is_safe_url(u)) {
                Some(src) => html.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                    html_escape(src),
                    html_escape(block.alt.as_deref().unwrap_or(""))
                )),
                None => tracing::debug!("dropping image block without a safe url"),
            },
            BlockKind::Embed => tracing::debug!("dropping embed block"),
            BlockKind::Unknown => {
                if !block.text.is_empty() {
                    wrap(&mut html, "p", block);
                }
            }
        }
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

fn wrap(html: &mut String, tag: &str, block: &RichTextBlock) {
    html.push_str(&format!("<{}>", tag));
    html.push_str(&render_spans(&block.text, &block.spans));
    html.push_str(&format!("</{}>", tag));
}

/// Apply spans to `text`, always producing well-nested markup
///
/// The text is cut at every span boundary; each segment is wrapped in the
/// spans covering it, outermost (earliest start, latest end) first.
/// Offsets count UTF-16 code units, so an emoji spans two.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let len = units.len();

    let mut valid: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.end <= len)
        .collect();
    valid.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut cuts: Vec<usize> = vec![0, len];
    for span in &valid {
        cuts.push(span.start);
        cuts.push(span.end);
    }
    cuts.sort_unstable();
    cuts.dedup();

    let mut out = String::new();
    for window in cuts.windows(2) {
        let (from, to) = (window[0], window[1]);
        let segment = String::from_utf16_lossy(&units[from..to]);
        let covering: Vec<&&Span> = valid
            .iter()
            .filter(|s| s.start <= from && s.end >= to)
            .collect();

        let mut closers = Vec::new();
        for span in &covering {
            if let Some((open, close)) = span_tags(span) {
                out.push_str(&open);
                closers.push(close);
            }
        }
        out.push_str(&escape_with_breaks(&segment));
        for close in closers.iter().rev() {
            out.push_str(close);
        }
    }

    out
}

fn span_tags(span: &Span) -> Option<(String, &'static str)> {
    match span.kind {
        SpanKind::Strong => Some(("<strong>".to_string(), "</strong>")),
        SpanKind::Em => Some(("<em>".to_string(), "</em>")),
        SpanKind::Hyperlink => {
            let url = span.data.as_ref()?.url.as_deref()?;
            if !is_safe_url(url) {
                tracing::debug!("dropping hyperlink with unsafe url");
                return None;
            }
            Some((
                format!(
                    r#"<a href="{}" target="_blank" rel="noopener noreferrer">"#,
                    html_escape(url)
                ),
                "</a>",
            ))
        }
        SpanKind::Label => {
            let label = span.data.as_ref()?.label.as_deref()?;
            Some((
                format!(r#"<span class="{}">"#, html_escape(label)),
                "</span>",
            ))
        }
        SpanKind::Unknown => None,
    }
}

fn escape_with_breaks(text: &str) -> String {
    html_escape(text).replace('\n', "<br />")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(json: serde_json::Value) -> Vec<RichTextBlock> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_paragraph_is_escaped() {
        let html = as_html(&[RichTextBlock::paragraph("<script>alert(1)</script> & more")]);
        assert_eq!(
            html,
            "<p>&lt;script&gt;alert(1)&lt;/script&gt; &amp; more</p>"
        );
    }

    #[test]
    fn test_spans() {
        let b = blocks(serde_json::json!([{
            "type": "paragraph",
            "text": "bold and link",
            "spans": [
                { "start": 0, "end": 4, "type": "strong" },
                { "start": 9, "end": 13, "type": "hyperlink", "data": { "url": "https://rocketseat.com.br" } }
            ]
        }]));
        assert_eq!(
            as_html(&b),
            r#"<p><strong>bold</strong> and <a href="https://rocketseat.com.br" target="_blank" rel="noopener noreferrer">link</a></p>"#
        );
    }

    #[test]
    fn test_span_offsets_count_utf16_units() {
        let b = blocks(serde_json::json!([{
            "type": "paragraph",
            "text": "🚀 é bold",
            "spans": [{ "start": 5, "end": 9, "type": "strong" }]
        }]));
        assert_eq!(as_html(&b), "<p>🚀 é <strong>bold</strong></p>");
    }

    #[test]
    fn test_overlapping_spans_stay_nested() {
        let b = blocks(serde_json::json!([{
            "type": "paragraph",
            "text": "abcdef",
            "spans": [
                { "start": 0, "end": 4, "type": "strong" },
                { "start": 2, "end": 6, "type": "em" }
            ]
        }]));
        assert_eq!(
            as_html(&b),
            "<p><strong>ab</strong><strong><em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_unsafe_link_is_dropped() {
        let b = blocks(serde_json::json!([{
            "type": "paragraph",
            "text": "click",
            "spans": [
                { "start": 0, "end": 5, "type": "hyperlink", "data": { "url": "javascript:alert(1)" } }
            ]
        }]));
        assert_eq!(as_html(&b), "<p>click</p>");
    }

    #[test]
    fn test_lists_are_grouped() {
        let b = blocks(serde_json::json!([
            { "type": "list-item", "text": "one", "spans": [] },
            { "type": "list-item", "text": "two", "spans": [] },
            { "type": "o-list-item", "text": "first", "spans": [] },
            { "type": "paragraph", "text": "after", "spans": [] }
        ]));
        assert_eq!(
            as_html(&b),
            "<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><p>after</p>"
        );
    }

    #[test]
    fn test_embed_dropped_and_unknown_kind_kept() {
        let b = blocks(serde_json::json!([
            { "type": "embed", "oembed": { "html": "<iframe></iframe>" } },
            { "type": "something-new", "text": "still text" },
            { "type": "preformatted", "text": "let x = 1 < 2;" }
        ]));
        assert_eq!(
            as_html(&b),
            "<p>still text</p><pre>let x = 1 &lt; 2;</pre>"
        );
    }

    #[test]
    fn test_as_text() {
        let b = vec![
            RichTextBlock::paragraph("C D"),
            RichTextBlock::paragraph("E"),
        ];
        assert_eq!(as_text(&b), "C D\nE");
    }
}
