//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateStats, Generator};
use crate::store::ContentStore;
use crate::Spacetraveling;

/// Generate the static site from the configured content store
pub async fn run(app: &Spacetraveling) -> Result<GenerateStats> {
    let client = app.client()?;
    run_with_store(app, &client).await
}

/// Generate the static site from any store
pub async fn run_with_store<S: ContentStore + ?Sized>(
    app: &Spacetraveling,
    store: &S,
) -> Result<GenerateStats> {
    let start = std::time::Instant::now();

    let generator = Generator::new(app, store)?;
    let stats = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} list pages and {} posts ({} assets) in {:.2}s",
        stats.list_pages,
        stats.posts,
        stats.assets,
        duration.as_secs_f64()
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::store::memory::{post_document, MemoryStore};

    #[tokio::test]
    async fn test_run_with_store() {
        let dir = tempfile::tempdir().unwrap();
        let app = Spacetraveling::with_config(dir.path(), SiteConfig::default());
        let store = MemoryStore::new(vec![post_document(
            "hello",
            "2021-03-25T19:25:28+0000",
            "2021-03-25T19:25:28+0000",
        )]);

        let stats = run_with_store(&app, &store).await.unwrap();
        assert_eq!(stats.posts, 1);
        assert!(app.public_dir.join("post/hello/index.html").exists());
    }
}
