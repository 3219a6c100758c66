use axum::{
    extract::{Path, Query, State as AxumState},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pitchside_execution::{Ledger, Registration};
use pitchside_types::{GameError, Locale, PackTier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::Game;

const ADMIN_HEADER: &str = "x-admin-id";
const DEFAULT_LEADERBOARD_LIMIT: u64 = 10;

type GameState<L> = AxumState<Arc<Game<L>>>;

#[derive(Serialize)]
struct HealthzResponse {
    ok: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message_key: &'static str,
    detail: String,
}

#[derive(Deserialize)]
pub(super) struct RegisterRequest {
    user_id: u64,
    name: String,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    referrer_id: Option<u64>,
}

#[derive(Serialize)]
struct PositionResponse {
    position: u64,
}

#[derive(Serialize)]
struct AccessResponse {
    eligible: bool,
}

#[derive(Deserialize, Serialize)]
pub(super) struct LocaleBody {
    locale: Locale,
}

#[derive(Deserialize)]
pub(super) struct LeaderboardQuery {
    limit: Option<u64>,
}

#[derive(Deserialize)]
pub(super) struct GrantPacksRequest {
    tier: PackTier,
    count: u64,
    #[serde(default)]
    ghost: bool,
}

#[derive(Deserialize)]
pub(super) struct BanRequest {
    /// Unix seconds; omitted or null bans indefinitely.
    #[serde(default)]
    until: Option<u64>,
}

#[derive(Serialize)]
struct ResetResponse {
    reset: u64,
}

fn status_for(err: &GameError) -> StatusCode {
    match err {
        GameError::NotFound { .. } => StatusCode::NOT_FOUND,
        GameError::AlreadyRegistered { .. }
        | GameError::InsufficientResources { .. }
        | GameError::NoOpponent { .. }
        | GameError::NoAttemptsLeft => StatusCode::CONFLICT,
        GameError::InvalidName { .. } | GameError::SelfReferral => StatusCode::BAD_REQUEST,
        GameError::Banned { .. } | GameError::NotEligible { .. } | GameError::Forbidden { .. } => {
            StatusCode::FORBIDDEN
        }
        GameError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(err: GameError) -> Response {
    let detail = if err.is_expected() {
        err.to_string()
    } else {
        // Store errors are logged where they happen; callers only learn that it failed.
        "internal error".to_string()
    };
    let body = ErrorResponse {
        error: err.kind(),
        message_key: err.message_key(),
        detail,
    };
    (status_for(&err), Json(body)).into_response()
}

fn respond<T: Serialize>(result: Result<T, GameError>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(err) => error_response(err),
    }
}

fn admin_id(headers: &HeaderMap) -> Result<u64, Response> {
    headers
        .get(ADMIN_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, "missing or invalid x-admin-id").into_response())
}

pub(super) async fn healthz() -> Response {
    Json(HealthzResponse { ok: true }).into_response()
}

pub(super) async fn register<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    let registration = Registration {
        user_id: request.user_id,
        name: request.name,
        language_code: request.language_code,
        referrer_id: request.referrer_id,
    };
    match game.register(registration).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn get_user<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Path(user_id): Path<u64>,
) -> Response {
    respond(game.user(user_id).await)
}

pub(super) async fn get_stats<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Path(user_id): Path<u64>,
) -> Response {
    respond(game.stats(user_id).await)
}

pub(super) async fn get_position<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Path(user_id): Path<u64>,
) -> Response {
    respond(
        game.position(user_id)
            .await
            .map(|position| PositionResponse { position }),
    )
}

pub(super) async fn get_opponent<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Path(user_id): Path<u64>,
) -> Response {
    respond(game.opponent(user_id).await)
}

pub(super) async fn play_match<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Path(user_id): Path<u64>,
) -> Response {
    respond(game.play_match(user_id).await)
}

pub(super) async fn get_minigame_access<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Path(user_id): Path<u64>,
) -> Response {
    respond(
        game.minigame_access(user_id)
            .await
            .map(|eligible| AccessResponse { eligible }),
    )
}

pub(super) async fn play_minigame<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Path(user_id): Path<u64>,
) -> Response {
    respond(game.play_minigame(user_id).await)
}

pub(super) async fn get_locale<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Path(user_id): Path<u64>,
) -> Response {
    respond(game.locale(user_id).await.map(|locale| LocaleBody { locale }))
}

pub(super) async fn put_locale<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Path(user_id): Path<u64>,
    Json(body): Json<LocaleBody>,
) -> Response {
    match game.change_locale(user_id, body.locale).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn get_leaderboard<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    Query(query): Query<LeaderboardQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    respond(game.leaderboard(limit).await)
}

pub(super) async fn grant_packs<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
    Json(request): Json<GrantPacksRequest>,
) -> Response {
    let actor_id = match admin_id(&headers) {
        Ok(actor_id) => actor_id,
        Err(response) => return response,
    };
    match game
        .grant_packs(actor_id, user_id, request.tier, request.count, request.ghost)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn set_ban<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
    Json(request): Json<BanRequest>,
) -> Response {
    let actor_id = match admin_id(&headers) {
        Ok(actor_id) => actor_id,
        Err(response) => return response,
    };
    match game.set_ban(actor_id, user_id, request.until).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn lift_ban<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    headers: HeaderMap,
    Path(user_id): Path<u64>,
) -> Response {
    let actor_id = match admin_id(&headers) {
        Ok(actor_id) => actor_id,
        Err(response) => return response,
    };
    match game.lift_ban(actor_id, user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(super) async fn reset_minigame_attempts<L: Ledger + 'static>(
    AxumState(game): GameState<L>,
    headers: HeaderMap,
) -> Response {
    let actor_id = match admin_id(&headers) {
        Ok(actor_id) => actor_id,
        Err(response) => return response,
    };
    respond(
        game.reset_minigame_attempts(actor_id)
            .await
            .map(|reset| ResetResponse { reset }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_kind_has_a_status() {
        let cases = [
            (GameError::NotFound { user_id: 1 }, StatusCode::NOT_FOUND),
            (GameError::AlreadyRegistered { user_id: 1 }, StatusCode::CONFLICT),
            (GameError::InvalidName { len: 0, max: 32 }, StatusCode::BAD_REQUEST),
            (
                GameError::Banned {
                    user_id: 1,
                    until: None,
                },
                StatusCode::FORBIDDEN,
            ),
            (GameError::NoOpponent { position: 1 }, StatusCode::CONFLICT),
            (GameError::NoAttemptsLeft, StatusCode::CONFLICT),
            (
                GameError::StoreUnavailable("disk".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{err}");
        }
    }
}
