use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::aggregator::Aggregator;
use crate::article::NewsResponse;
use crate::display::DisplayItem;
use crate::poller::{FeedPoller, FeedState, PollStatus};
use crate::translate::{PageScripts, TranslationService};

pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub poller: Arc<FeedPoller>,
    pub translator: Arc<dyn TranslationService>,
    /// How often the page re-requests the feed fragment
    pub refresh_interval: Duration,
}

/// htmx event fired once a manual refresh settles; `#feed` reloads on it.
pub const FEED_REFRESHED_EVENT: &str = "feed-refreshed";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/feed", get(feed))
        .route("/api/news", get(api_news))
        .route("/refresh", post(refresh))
        .route("/refresh/status", get(refresh_status))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub items: Vec<DisplayItem>,
    pub last_updated: Option<String>,
    pub error: Option<String>,
    pub refreshing: bool,
    pub refresh_secs: u64,
    pub scripts: String,
}

#[derive(Template)]
#[template(path = "feed_items.html")]
pub struct FeedItemsTemplate {
    pub items: Vec<DisplayItem>,
    pub last_updated: Option<String>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "refresh_button.html")]
pub struct RefreshButtonTemplate {
    pub refreshing: bool,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

fn format_updated(state: &FeedState) -> Option<String> {
    state
        .last_updated
        .map(|ts| ts.format("%H:%M:%S UTC").to_string())
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let feed = state.poller.snapshot().await;

    let mut scripts = PageScripts::default();
    state.translator.inject(&mut scripts);

    HtmlTemplate(IndexTemplate {
        last_updated: format_updated(&feed),
        refreshing: feed.status == PollStatus::Loading,
        refresh_secs: state.refresh_interval.as_secs().max(1),
        items: feed.items,
        error: feed.error,
        scripts: scripts.html(),
    })
}

pub async fn feed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let feed = state.poller.snapshot().await;

    HtmlTemplate(FeedItemsTemplate {
        last_updated: format_updated(&feed),
        items: feed.items,
        error: feed.error,
    })
}

#[derive(Deserialize)]
pub struct NewsQuery {
    /// Cache-buster; ignored
    #[serde(default)]
    pub t: Option<String>,
}

pub async fn api_news(
    State(state): State<Arc<AppState>>,
    Query(_query): Query<NewsQuery>,
) -> impl IntoResponse {
    let news = state.aggregator.fetch_cyber_news().await;
    info!("Serving {} aggregated articles", news.len());

    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(NewsResponse { news }),
    )
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.poller.request_refresh();

    // Return refreshing state immediately
    HtmlTemplate(RefreshButtonTemplate { refreshing: true })
}

pub async fn refresh_status(State(state): State<Arc<AppState>>) -> Response {
    let refreshing = state.poller.is_loading();
    let button = HtmlTemplate(RefreshButtonTemplate { refreshing });

    if refreshing {
        button.into_response()
    } else {
        // Tell the page to reload the feed now that the poll has been applied
        ([("HX-Trigger", FEED_REFRESHED_EVENT)], button).into_response()
    }
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
