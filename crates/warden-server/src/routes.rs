use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::error;

use warden_types::api::{
    BanCountResponse, BanRequest, BanStatusResponse, EnforcementResponse, MigrateChatRequest,
    SetEnforcementRequest,
};

use crate::middleware::require_admin;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/bans", get(list_bans))
        .route("/bans/count", get(count_bans))
        .route(
            "/bans/{user_id}",
            get(get_ban).put(ban_user).patch(update_ban).delete(unban_user),
        )
        .route("/bans/{user_id}/status", get(ban_status))
        .route(
            "/chats/{chat_id}/enforcement",
            get(get_enforcement).put(set_enforcement),
        )
        .route("/chats/{chat_id}/setting", get(get_chat_setting))
        .route("/chats/{chat_id}/migrate", post(migrate_chat))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state)
}

/// Registry mutations and detail reads hit SQLite, so run them off the async
/// runtime.
async fn run_blocking<F, T>(f: F) -> Result<T, StatusCode>
where
    F: FnOnce() -> warden_registry::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("store error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

// -- Bans --

async fn list_bans(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let users = run_blocking(move || state.bans.list()).await?;
    Ok(Json(users))
}

async fn count_bans(State(state): State<AppState>) -> Json<BanCountResponse> {
    Json(BanCountResponse {
        count: state.bans.count(),
    })
}

async fn get_ban(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = run_blocking(move || state.bans.record(user_id))
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(user))
}

async fn ban_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<BanRequest>,
) -> Result<StatusCode, StatusCode> {
    if req.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    run_blocking(move || state.bans.ban(user_id, &req.name, req.reason.as_deref())).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_ban(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<BanRequest>,
) -> Result<StatusCode, StatusCode> {
    if req.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let updated = run_blocking(move || {
        state
            .bans
            .update_reason(user_id, &req.name, req.reason.as_deref())
    })
    .await?;

    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn unban_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    run_blocking(move || state.bans.unban(user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ban_status(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Json<BanStatusResponse> {
    Json(BanStatusResponse {
        user_id,
        banned: state.bans.is_banned(user_id),
    })
}

// -- Chat enforcement --

async fn get_enforcement(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Json<EnforcementResponse> {
    let enforced = state.chats.is_enforced(&chat_id);
    Json(EnforcementResponse { chat_id, enforced })
}

async fn set_enforcement(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(req): Json<SetEnforcementRequest>,
) -> Result<StatusCode, StatusCode> {
    run_blocking(move || {
        if req.enforced {
            state.chats.enable(&chat_id)
        } else {
            state.chats.disable(&chat_id)
        }
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_chat_setting(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let setting = run_blocking(move || state.chats.setting(&chat_id))
        .await?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(setting))
}

async fn migrate_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(req): Json<MigrateChatRequest>,
) -> Result<StatusCode, StatusCode> {
    if req.new_chat_id.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    run_blocking(move || state.chats.migrate_chat(&chat_id, &req.new_chat_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
