use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use pitchside_execution::Ledger;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::Game;

mod http;

pub struct Api<L: Ledger> {
    game: Arc<Game<L>>,
}

impl<L: Ledger + 'static> Api<L> {
    pub fn new(game: Arc<Game<L>>) -> Self {
        Self { game }
    }

    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/healthz", get(http::healthz))
            .route("/users", post(http::register::<L>))
            .route("/users/:id", get(http::get_user::<L>))
            .route("/users/:id/stats", get(http::get_stats::<L>))
            .route("/users/:id/position", get(http::get_position::<L>))
            .route("/users/:id/opponent", get(http::get_opponent::<L>))
            .route("/users/:id/match", post(http::play_match::<L>))
            .route(
                "/users/:id/minigame/access",
                get(http::get_minigame_access::<L>),
            )
            .route("/users/:id/minigame", post(http::play_minigame::<L>))
            .route(
                "/users/:id/locale",
                get(http::get_locale::<L>).put(http::put_locale::<L>),
            )
            .route("/leaderboard", get(http::get_leaderboard::<L>))
            .route("/admin/users/:id/packs", post(http::grant_packs::<L>))
            .route(
                "/admin/users/:id/ban",
                put(http::set_ban::<L>).delete(http::lift_ban::<L>),
            )
            .route(
                "/admin/minigame/reset",
                post(http::reset_minigame_attempts::<L>),
            );

        let router = match self.game.config.http_body_limit_bytes {
            Some(limit) if limit > 0 => router.layer(DefaultBodyLimit::max(limit)),
            _ => router,
        };
        let router = router.layer(middleware::from_fn(request_id_middleware));
        let router = router.layer(TraceLayer::new_for_http());

        router.with_state(self.game.clone())
    }
}

async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(header::HeaderName::from_static("x-request-id"))
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let mut response = next.run(req).await;
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(
            header::HeaderName::from_static("x-request-id"),
            header_value,
        );
    }
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "http.request"
    );
    response
}
