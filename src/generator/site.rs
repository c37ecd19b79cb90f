//! Page rendering shared by the static generator and the server

use tera::Context;

use crate::config::SiteConfig;
use crate::content::{NavigationResult, PostDeriver, PostDetail, ReadingMeta};
use crate::error::Result;
use crate::helpers::{date_xml, is_safe_url, DateFormatter};
use crate::i18n::I18n;
use crate::pagination::PaginationState;
use crate::templates::{NavLink, NavigationView, PostView, SiteData, TemplateRenderer};

/// Renders the home list, post pages and the not-found page
pub struct SiteRenderer {
    templates: TemplateRenderer,
    dates: DateFormatter,
    i18n: I18n,
    catalog: serde_json::Value,
    site: SiteData,
    words_per_minute: u32,
}

impl SiteRenderer {
    pub fn new(config: &SiteConfig, i18n: I18n) -> Result<Self> {
        Ok(Self {
            templates: TemplateRenderer::new()?,
            dates: DateFormatter::from_config(config)?,
            catalog: i18n.catalog(),
            site: SiteData {
                title: config.title.clone(),
                lang: i18n.locale().tag().to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            i18n,
            words_per_minute: config.words_per_minute,
        })
    }

    pub fn dates(&self) -> &DateFormatter {
        &self.dates
    }

    /// Reading time and edit label for a post
    pub fn derive(&self, detail: &PostDetail) -> ReadingMeta {
        PostDeriver::new(&self.dates, &self.i18n, self.words_per_minute).derive(detail)
    }

    fn context(&self, preview: bool) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("t", &self.catalog);
        context.insert("preview", &preview);
        context
    }

    /// Render the accumulated post list
    ///
    /// The "load more" link is only emitted while the state still has a
    /// next-page cursor.
    pub fn render_home(
        &self,
        state: &PaginationState,
        preview: bool,
        load_more_href: Option<&str>,
    ) -> Result<String> {
        let mut context = self.context(preview);
        context.insert("posts", &state.accumulated_posts);
        context.insert(
            "load_more_href",
            &load_more_href.filter(|_| state.has_more()),
        );
        self.templates.render("home.html", &context)
    }

    pub fn render_post(
        &self,
        detail: &PostDetail,
        meta: &ReadingMeta,
        navigation: &NavigationResult,
        preview: bool,
    ) -> Result<String> {
        let minutes = meta.reading_time_minutes.to_string();
        let post = PostView {
            uid: detail.uid.clone(),
            title: detail.title.clone(),
            author: detail.author.clone(),
            banner_url: Some(detail.banner_url.clone()).filter(|url| is_safe_url(url)),
            datetime: detail.first_publication_date.as_ref().map(date_xml),
            display_date: detail
                .first_publication_date
                .as_ref()
                .map(|d| self.dates.date(d)),
            read_time: self
                .i18n
                .format("post.read_time", &[("minutes", minutes.as_str())]),
            edited_label: meta.edited_label.clone(),
            sections: detail.content.clone(),
        };
        let navigation = NavigationView {
            previous: navigation.previous.as_ref().map(NavLink::from),
            next: navigation.next.as_ref().map(NavLink::from),
        };

        let mut context = self.context(preview);
        context.insert("post", &post);
        context.insert("navigation", &navigation);
        self.templates.render("post.html", &context)
    }

    pub fn render_not_found(&self, preview: bool) -> Result<String> {
        self.templates
            .render("not_found.html", &self.context(preview))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteLocale;
    use crate::content::PostSummary;
    use crate::store::memory::post_document;

    fn renderer(locale: SiteLocale) -> SiteRenderer {
        let config = SiteConfig {
            language: locale,
            ..SiteConfig::default()
        };
        SiteRenderer::new(&config, I18n::new(locale)).unwrap()
    }

    fn summary(uid: &str, title: &str) -> PostSummary {
        PostSummary {
            uid: uid.to_string(),
            first_publication_date: None,
            display_date: None,
            title: title.to_string(),
            subtitle: String::new(),
            author: String::new(),
        }
    }

    fn detail(first: &str, last: &str) -> PostDetail {
        PostDetail::from_document(&post_document("como-utilizar-hooks", first, last)).unwrap()
    }

    #[test]
    fn test_home_lists_posts() {
        let site = renderer(SiteLocale::PtBr);
        let doc = post_document("a", "2021-03-25T19:25:28+0000", "2021-03-25T19:25:28+0000");
        let state = PaginationState::from_page(
            1,
            Some("cursor".to_string()),
            vec![PostSummary::from_document(&doc, site.dates()).unwrap()],
        );

        let html = site.render_home(&state, false, Some("/?pages=2")).unwrap();
        assert!(html.contains(r#"<html lang="pt-BR">"#));
        assert!(html.contains("Title a"));
        assert!(html.contains("25 mar 2021"));
        assert!(html.contains("Joseph Oliveira"));
        assert!(html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_home_hides_load_more_without_cursor() {
        let site = renderer(SiteLocale::PtBr);
        let state = PaginationState::from_page(1, None, vec![summary("a", "A")]);
        let html = site.render_home(&state, false, Some("/?pages=2")).unwrap();
        assert!(!html.contains("Carregar mais posts"));
        assert!(!html.contains("Sair do modo Preview"));

        let html = site.render_home(&state, true, None).unwrap();
        assert!(html.contains("Sair do modo Preview"));
    }

    #[test]
    fn test_post_page() {
        let site = renderer(SiteLocale::PtBr);
        let detail = detail("2021-03-25T19:25:28+0000", "2021-03-26T10:05:00+0000");
        let meta = site.derive(&detail);
        let navigation = NavigationResult {
            previous: Some(summary("older", "Older post")),
            next: None,
        };

        let html = site.render_post(&detail, &meta, &navigation, false).unwrap();
        assert!(html.contains("Title como-utilizar-hooks"));
        assert!(html.contains("1 min"));
        assert!(html.contains("* editado em 26 mar 2021, às 10:5"));
        assert!(html.contains(r#"<section class="post-section" id="proin-et-varius">"#));
        assert!(html.contains("<p>Lorem ipsum dolor sit amet</p>"));
        assert!(html.contains(r#"href="/post/older""#));
        assert!(html.contains("Post anterior"));
        assert!(!html.contains(r#"class="next""#));
    }

    #[test]
    fn test_post_drops_unsafe_banner() {
        let site = renderer(SiteLocale::En);
        let mut detail = detail("2021-03-25T19:25:28+0000", "2021-03-25T19:25:28+0000");
        detail.banner_url = "javascript:alert(1)".to_string();
        let meta = site.derive(&detail);

        let html = site
            .render_post(&detail, &meta, &NavigationResult::default(), false)
            .unwrap();
        assert!(!html.contains("javascript:"));
        assert!(!html.contains(r#"class="banner""#));
        assert!(!html.contains("edited on"));
        assert!(!html.contains("post-navigation"));
    }

    #[test]
    fn test_not_found_page() {
        let site = renderer(SiteLocale::En);
        let html = site.render_not_found(false).unwrap();
        assert!(html.contains(r#"<a href="/">"#));
    }
}
