use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::warn;

use crate::api::{DataService, Newsletter, Podcast};
use crate::config::Config;
use crate::feed::{Card, FeedItem, FeedSection, SectionView};
use crate::footer::{Footer, FooterView};

pub struct AppState {
    pub service: Arc<DataService>,
    pub feed_limit: NonZeroU32,
    pub listing_limit: NonZeroU32,
    pub render_deadline: Duration,
    pub immersive_routes: Arc<[String]>,
}

impl AppState {
    pub fn new(config: &Config, service: Arc<DataService>) -> Self {
        Self {
            service,
            feed_limit: config.feed_limit,
            listing_limit: config.listing_limit,
            render_deadline: Duration::from_millis(config.render_deadline_ms),
            immersive_routes: config.immersive_routes.clone().into(),
        }
    }

    fn section<T: FeedItem>(&self, limit: NonZeroU32) -> FeedSection<T> {
        FeedSection::new(Arc::clone(&self.service), limit)
    }

    fn footer(&self) -> Footer {
        Footer::new(
            Arc::clone(&self.service),
            Arc::clone(&self.immersive_routes),
        )
    }

    /// Wait for a page's components, but never past the render deadline.
    /// Whatever is still loading renders as such and is cancelled on drop.
    async fn settle<F: Future>(&self, components: F) {
        if tokio::time::timeout(self.render_deadline, components)
            .await
            .is_err()
        {
            warn!(
                "Render deadline of {:?} reached, rendering pending components",
                self.render_deadline
            );
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/newsletters", get(newsletters))
        .route("/podcasts", get(podcasts))
        .route("/chat", get(chat))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

// Template structs
#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub sections: Vec<SectionView>,
    pub footer: Option<FooterView>,
}

#[derive(Template)]
#[template(path = "listing.html")]
pub struct ListingTemplate {
    pub section: SectionView,
    pub selected: Option<Card>,
    pub missing_id: Option<String>,
    pub footer: Option<FooterView>,
}

#[derive(Template)]
#[template(path = "chat.html")]
pub struct ChatTemplate {
    pub footer: Option<FooterView>,
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

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub id: Option<String>,
}

// Route handlers
pub async fn home(State(state): State<Arc<AppState>>, uri: Uri) -> impl IntoResponse {
    let mut newsletters = state.section::<Newsletter>(state.feed_limit);
    let mut podcasts = state.section::<Podcast>(state.feed_limit);
    let mut footer = state.footer();

    newsletters.activate();
    podcasts.activate();
    footer.navigate(uri.path());
    state
        .settle(async {
            tokio::join!(newsletters.settled(), podcasts.settled(), footer.settled());
        })
        .await;

    HtmlTemplate(HomeTemplate {
        sections: vec![newsletters.view(), podcasts.view()],
        footer: footer.view(),
    })
}

pub async fn newsletters(
    State(state): State<Arc<AppState>>,
    query: Option<Query<ListingQuery>>,
    uri: Uri,
) -> impl IntoResponse {
    listing::<Newsletter>(&state, query, &uri).await
}

pub async fn podcasts(
    State(state): State<Arc<AppState>>,
    query: Option<Query<ListingQuery>>,
    uri: Uri,
) -> impl IntoResponse {
    listing::<Podcast>(&state, query, &uri).await
}

async fn listing<T: FeedItem>(
    state: &AppState,
    query: Option<Query<ListingQuery>>,
    uri: &Uri,
) -> HtmlTemplate<ListingTemplate> {
    // An unparseable query shows the plain listing.
    let id = query.and_then(|Query(query)| query.id);

    let mut section = state.section::<T>(state.listing_limit);
    let mut footer = state.footer();

    section.activate();
    footer.navigate(uri.path());
    state
        .settle(async {
            tokio::join!(section.settled(), footer.settled());
        })
        .await;

    let selected = id.as_deref().and_then(|id| section.find(id));
    let missing_id = match (&id, &selected) {
        (Some(id), None) => Some(id.clone()),
        _ => None,
    };

    HtmlTemplate(ListingTemplate {
        section: section.view(),
        selected,
        missing_id,
        footer: footer.view(),
    })
}

pub async fn chat(State(state): State<Arc<AppState>>, uri: Uri) -> impl IntoResponse {
    let mut footer = state.footer();
    footer.navigate(uri.path());
    state.settle(footer.settled()).await;

    HtmlTemplate(ChatTemplate {
        footer: footer.view(),
    })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
