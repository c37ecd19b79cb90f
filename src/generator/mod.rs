//! Generator module - renders the whole site to static HTML files

mod site;

pub use site::SiteRenderer;

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::content::{NavigationResolver, PostDetail};
use crate::pagination::{PaginationState, Paginator};
use crate::store::ContentStore;
use crate::Spacetraveling;

/// Counts of what a generation run wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub list_pages: u32,
    pub posts: usize,
    pub assets: usize,
}

/// Static site generator
pub struct Generator<'a, S: ContentStore + ?Sized> {
    app: &'a Spacetraveling,
    store: &'a S,
    site: SiteRenderer,
}

impl<'a, S: ContentStore + ?Sized> Generator<'a, S> {
    pub fn new(app: &'a Spacetraveling, store: &'a S) -> Result<Self> {
        Ok(Self {
            app,
            store,
            site: app.site_renderer()?,
        })
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateStats> {
        fs::create_dir_all(&self.app.public_dir)?;

        let mut stats = GenerateStats::default();
        let state = self.generate_list_pages(&mut stats).await?;
        self.generate_post_pages(&state, &mut stats).await?;

        let not_found = self.site.render_not_found(false)?;
        write_page(&self.app.public_dir.join("404.html"), &not_found)?;

        stats.assets = self.copy_static_assets()?;

        Ok(stats)
    }

    /// Write `index.html` and one `page/{n}/index.html` per further page
    ///
    /// Each list page holds everything accumulated so far and links to the
    /// next one while a cursor remains.
    async fn generate_list_pages(&self, stats: &mut GenerateStats) -> Result<PaginationState> {
        let api = &self.app.config.api;
        let paginator = Paginator::new(
            self.store,
            self.site.dates(),
            &api.document_type,
            api.page_size,
        );

        let mut state = PaginationState::new();
        loop {
            state = paginator.advance(state).await?;

            let page = state.current_page;
            let next_href = format!("/page/{}/", page + 1);
            let html = self.site.render_home(&state, false, Some(&next_href))?;

            let output_path = if page == 1 {
                self.app.public_dir.join("index.html")
            } else {
                self.app
                    .public_dir
                    .join(format!("page/{}/index.html", page))
            };
            write_page(&output_path, &html)?;
            stats.list_pages += 1;

            if !state.has_more() {
                break;
            }
        }

        tracing::info!(
            "Listed {} posts over {} pages",
            state.accumulated_posts.len(),
            stats.list_pages
        );
        Ok(state)
    }

    /// Render every listed post to `post/{uid}/index.html`
    async fn generate_post_pages(
        &self,
        state: &PaginationState,
        stats: &mut GenerateStats,
    ) -> Result<()> {
        let doc_type = &self.app.config.api.document_type;
        let resolver = NavigationResolver::new(
            self.store,
            self.site.dates(),
            doc_type,
            &self.app.config.navigation,
        );

        for summary in &state.accumulated_posts {
            if !is_path_segment(&summary.uid) {
                tracing::warn!("Skipping post with unusable uid {:?}", summary.uid);
                continue;
            }

            let doc = self
                .store
                .get_by_uid(doc_type, &summary.uid, None)
                .await
                .with_context(|| format!("Failed to fetch post {}", summary.uid))?;
            let detail = PostDetail::from_document(&doc)?;
            let meta = self.site.derive(&detail);
            let navigation = resolver.resolve(&detail, None).await?;

            let html = self.site.render_post(&detail, &meta, &navigation, false)?;
            let output_path = self
                .app
                .public_dir
                .join("post")
                .join(&detail.uid)
                .join("index.html");
            write_page(&output_path, &html)?;
            tracing::debug!("Generated post: {:?}", output_path);
            stats.posts += 1;
        }

        Ok(())
    }

    /// Copy static assets (styles, images) to the public directory
    fn copy_static_assets(&self) -> Result<usize> {
        let static_dir = &self.app.static_dir;
        if !static_dir.exists() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest: PathBuf = self.app.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }

        Ok(copied)
    }
}

fn write_page(output_path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(output_path, html).with_context(|| format!("Failed to write {:?}", output_path))?;
    Ok(())
}

/// Whether a uid can be used as a single directory name
fn is_path_segment(uid: &str) -> bool {
    !uid.is_empty() && uid != "." && uid != ".." && !uid.contains(['/', '\\'])
}
