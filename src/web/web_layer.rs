// The web module is the HTTP adapter: axum routes on top of the core services.
// Handlers stay thin: extract, call a service, format the answer.

#[path = "api.rs"]
pub mod api;
#[path = "error.rs"]
pub mod error;
#[path = "flash.rs"]
pub mod flash;
#[path = "pages.rs"]
pub mod pages;
#[path = "session.rs"]
pub mod session;

use crate::core::accounts::AccountService;
use crate::core::board::BoardService;
use crate::core::moderation::{ModerationClassifier, ModerationService};
use crate::infra::accounts::{InMemorySessionStore, SqliteUserStore};
use crate::infra::board::SqliteBoardStore;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub type Classifier = Box<dyn ModerationClassifier>;
pub type Moderation = ModerationService<Classifier>;
pub type Accounts = AccountService<SqliteUserStore, InMemorySessionStore>;
pub type Board = BoardService<SqliteBoardStore, Classifier>;

/// Request bodies above this are rejected with 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const NO_CACHE: &str = "no-store, no-cache, must-revalidate, private, max-age=0";

/// Shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<Accounts>,
    pub board: Arc<Board>,
    pub cookie_secure: bool,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login_page).post(pages::login))
        .route("/register", get(pages::register_page).post(pages::register))
        .route("/index", get(pages::index))
        .route("/logout", get(pages::logout))
        .route("/health", get(|| async { "OK" }))
        .route("/api/posts", get(api::list_posts).post(api::create_post))
        .route("/add_post", post(api::create_post))
        .route("/api/posts/:id/like", post(api::like_post))
        .route("/api/posts/:id/comment", post(api::add_comment))
        .route("/api/stats", get(api::stats))
        .route("/api/trending", get(api::trending))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
