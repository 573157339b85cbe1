// src/web/notification_handlers.rs
use crate::{
    error::AppResult,
    models::{notification::Notification, user::Caller},
    services::notification_service,
    state::AppState,
    web::extract::AppPath,
};
use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

/// GET /notifications: as do próprio utilizador, mais recentes primeiro.
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(notification_service::list_for(&state.db_pool, &caller).await?))
}

/// PUT /notifications/{id}/read
pub async fn mark_as_read(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    AppPath(notification_id): AppPath<i64>,
) -> AppResult<Json<Value>> {
    notification_service::mark_as_read(&state.db_pool, &caller, notification_id).await?;
    Ok(Json(json!({ "message": "Notificação marcada como lida." })))
}
