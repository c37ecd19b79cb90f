//! Server rendering pages on request, with revalidation and preview

use anyhow::Result;
use axum::{
    extract::{Path as UrlPath, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::RenderCache;
use crate::config::SiteConfig;
use crate::content::{NavigationResolver, PostDetail};
use crate::generator::SiteRenderer;
use crate::pagination::{PaginationState, Paginator};
use crate::store::ContentStore;
use crate::Spacetraveling;

/// Cookie carrying the preview ref
pub const PREVIEW_COOKIE: &str = "spacetraveling.preview";

/// Upper bound for `?pages=N`
const MAX_PAGES: u32 = 50;

/// Server state
pub struct AppState {
    store: Arc<dyn ContentStore>,
    site: SiteRenderer,
    config: SiteConfig,
    cache: RenderCache,
}

impl AppState {
    pub fn new(app: &Spacetraveling, store: Arc<dyn ContentStore>) -> Result<Self> {
        Ok(Self {
            store,
            site: app.site_renderer()?,
            config: app.config.clone(),
            cache: RenderCache::from_secs(app.config.revalidate_secs),
        })
    }
}

/// Build the router: pages, preview endpoints and static files
pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/post/:slug", get(post_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(app: &Spacetraveling, ip: &str, port: u16, open: bool) -> Result<()> {
    let store: Arc<dyn ContentStore> = Arc::new(app.client()?);
    let state = Arc::new(AppState::new(app, store)?);

    if app.config.revalidate_secs > 0 {
        let purge_state = state.clone();
        let period = Duration::from_secs(app.config.revalidate_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let purged = purge_state.cache.purge_stale().await;
                if purged > 0 {
                    tracing::debug!("Purged {} stale pages", purged);
                }
            }
        });
    }

    let app_router = router(state, &app.static_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app_router).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct HomeQuery {
    pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PreviewQuery {
    token: Option<String>,
}

async fn home_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HomeQuery>,
    headers: HeaderMap,
) -> Response {
    let pages = query.pages.unwrap_or(1).clamp(1, MAX_PAGES);
    let reference = preview_ref(&headers);

    let result = match reference.as_deref() {
        Some(reference) => render_home(&state, pages, Some(reference)).await,
        None => {
            let key = format!("/?pages={}", pages);
            state
                .cache
                .get_or_render(&key, || render_home(&state, pages, None))
                .await
        }
    };
    page_response(&state, "/", result, reference.is_some())
}

async fn post_handler(
    State(state): State<Arc<AppState>>,
    UrlPath(slug): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    let reference = preview_ref(&headers);

    let result = match reference.as_deref() {
        Some(reference) => render_post(&state, &slug, Some(reference)).await,
        None => {
            let key = format!("/post/{}", slug);
            state
                .cache
                .get_or_render(&key, || render_post(&state, &slug, None))
                .await
        }
    };
    page_response(&state, &slug, result, reference.is_some())
}

/// Enter preview mode for a store revision
async fn preview_handler(Query(query): Query<PreviewQuery>) -> Response {
    let Some(token) = query.token.filter(|t| !t.trim().is_empty()) else {
        return (StatusCode::UNAUTHORIZED, "Invalid token").into_response();
    };

    tracing::info!("Entering preview mode");
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        PREVIEW_COOKIE,
        utf8_percent_encode(&token, NON_ALPHANUMERIC)
    );
    ([(header::SET_COOKIE, cookie)], Redirect::temporary("/")).into_response()
}

async fn exit_preview_handler() -> Response {
    let cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        PREVIEW_COOKIE
    );
    ([(header::SET_COOKIE, cookie)], Redirect::temporary("/")).into_response()
}

/// List page after `pages` loads
async fn render_home(
    state: &AppState,
    pages: u32,
    reference: Option<&str>,
) -> crate::Result<String> {
    let api = &state.config.api;
    let paginator = Paginator::new(
        state.store.as_ref(),
        state.site.dates(),
        &api.document_type,
        api.page_size,
    )
    .with_reference(reference);

    let loaded = paginator
        .load_pages(PaginationState::new(), pages)
        .await
        .map_err(|e| e.source)?;
    let next_href = format!("/?pages={}", loaded.current_page + 1);
    state
        .site
        .render_home(&loaded, reference.is_some(), Some(&next_href))
}

async fn render_post(
    state: &AppState,
    slug: &str,
    reference: Option<&str>,
) -> crate::Result<String> {
    let doc_type = &state.config.api.document_type;
    let doc = state.store.get_by_uid(doc_type, slug, reference).await?;
    let detail = PostDetail::from_document(&doc)?;
    let meta = state.site.derive(&detail);
    let navigation = NavigationResolver::new(
        state.store.as_ref(),
        state.site.dates(),
        doc_type,
        &state.config.navigation,
    )
    .resolve(&detail, reference)
    .await?;

    state
        .site
        .render_post(&detail, &meta, &navigation, reference.is_some())
}

fn page_response(
    state: &AppState,
    what: &str,
    result: crate::Result<String>,
    preview: bool,
) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(e) if e.is_not_found() => {
            tracing::debug!("Not found: {}", what);
            match state.site.render_not_found(preview) {
                Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
                Err(e) => {
                    tracing::error!("Failed to render not-found page: {}", e);
                    (StatusCode::NOT_FOUND, "Not found").into_response()
                }
            }
        }
        Err(e) => {
            tracing::error!("Failed to render {}: {:?}", what, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Preview ref from the request cookies, if any
fn preview_ref(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == PREVIEW_COOKIE)
        .map(|(_, value)| percent_decode_str(value).decode_utf8_lossy().into_owned())
        .filter(|value| !value.is_empty())
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
