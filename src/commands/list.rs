//! List posts in the content store

use anyhow::Result;

use crate::content::PostSummary;
use crate::pagination::{PaginationState, Paginator};
use crate::store::ContentStore;
use crate::Spacetraveling;

/// List every post, paging through the store
pub async fn run(app: &Spacetraveling) -> Result<()> {
    let client = app.client()?;
    let posts = load_all(app, &client).await?;

    println!("Posts ({}):", posts.len());
    for post in &posts {
        println!("{}", format_line(post));
    }

    Ok(())
}

/// Follow the store's cursors until the list is exhausted
pub async fn load_all<S: ContentStore + ?Sized>(
    app: &Spacetraveling,
    store: &S,
) -> Result<Vec<PostSummary>> {
    let site = app.site_renderer()?;
    let api = &app.config.api;
    let paginator = Paginator::new(store, site.dates(), &api.document_type, api.page_size);

    let state = paginator.load_pages(PaginationState::new(), u32::MAX).await?;
    Ok(state.accumulated_posts)
}

fn format_line(post: &PostSummary) -> String {
    format!(
        "  {} - {} [{}]",
        post.display_date.as_deref().unwrap_or("unpublished"),
        post.title,
        post.uid
    )
}
