// src/web/auth_handlers.rs
use crate::{
    error::AppResult,
    models::user::{AuthResponse, Caller, LoginPayload, PublicUser, RegisterPayload},
    services::auth_service,
    state::AppState,
    web::{extract::AppJson, mw_auth::AuthToken},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> AppResult<Json<AuthResponse>> {
    let response = auth_service::login(&state.db_pool, &payload, state.config.token_ttl_hours).await?;
    Ok(Json(response))
}

// POST /register
pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterPayload>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let response = auth_service::register(&state.db_pool, &payload, state.config.token_ttl_hours).await?;
    tracing::info!("📝 Nova conta: {} ({})", response.user.email, response.user.role);
    Ok((StatusCode::CREATED, Json(response)))
}

// POST /logout
pub async fn handle_logout(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(AuthToken(token)): Extension<AuthToken>,
) -> AppResult<Json<Value>> {
    auth_service::revoke_token(&state.db_pool, &token).await?;
    tracing::info!("🚪 Utilizador '{}' desligado.", caller.email);
    Ok(Json(json!({ "message": "Sessão terminada." })))
}

// GET /actor
pub async fn show_actor(Extension(caller): Extension<Caller>) -> Json<PublicUser> {
    Json(caller.to_public())
}
