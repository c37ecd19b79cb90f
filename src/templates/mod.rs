//! Built-in spacetraveling templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping stays on for every
//! `.html` template; only post bodies, which are sanitised when converted
//! from rich text, are inserted with `| safe`.

use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::content::{ContentSection, PostSummary, RichTextBlock};
use crate::error::Result;

/// Default stylesheet written by `init`
pub const GLOBAL_CSS: &str = include_str!("spacetraveling/assets/global.css");
/// Default logo written by `init`
pub const LOGO_SVG: &str = include_str!("spacetraveling/assets/Logo.svg");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("home.html", include_str!("spacetraveling/home.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("not_found.html", include_str!("spacetraveling/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
            (
                "partials/preview.html",
                include_str!("spacetraveling/partials/preview.html"),
            ),
        ])?;

        tera.register_filter("rich_text", rich_text_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: render serialized rich-text blocks as sanitised HTML
fn rich_text_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let blocks = tera::try_get_value!("rich_text", "value", Vec<RichTextBlock>, value);
    Ok(tera::Value::String(crate::content::richtext::as_html(
        &blocks,
    )))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub lang: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub uid: String,
    pub title: String,
    pub author: String,
    pub banner_url: Option<String>,
    /// ISO 8601 first publication, for `<time datetime>`
    pub datetime: Option<String>,
    pub display_date: Option<String>,
    pub read_time: String,
    pub edited_label: Option<String>,
    pub sections: Vec<ContentSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub uid: String,
    pub title: String,
}

impl From<&PostSummary> for NavLink {
    fn from(post: &PostSummary) -> Self {
        Self {
            uid: post.uid.clone(),
            title: post.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NavigationView {
    pub previous: Option<NavLink>,
    pub next: Option<NavLink>,
}
