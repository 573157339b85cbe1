// src/web/presence_handlers.rs
use crate::{
    error::AppResult,
    models::{
        presence::{DateFilter, Presence, PresenceFilter, PresencePayload},
        user::Caller,
    },
    services::presence_service,
    state::AppState,
    web::extract::{AppJson, AppPath, AppQuery},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};

/// GET /presences?class_id=&date=&student_id=
pub async fn list_presences(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<PresenceFilter>,
) -> AppResult<Json<Vec<Presence>>> {
    tracing::debug!("GET /presences: filtro {:?}", filter);
    Ok(Json(presence_service::list_presences(&state.db_pool, &filter).await?))
}

/// POST /presences e POST /store
pub async fn mark_presence(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    AppJson(payload): AppJson<PresencePayload>,
) -> AppResult<(StatusCode, Json<Presence>)> {
    let input = payload.validate()?;
    let presence = presence_service::mark_presence(&state.db_pool, &caller, &input).await?;
    Ok((StatusCode::CREATED, Json(presence)))
}

pub async fn show_presence(
    State(state): State<AppState>,
    AppPath(presence_id): AppPath<i64>,
) -> AppResult<Json<Presence>> {
    Ok(Json(presence_service::get_presence(&state.db_pool, presence_id).await?))
}

pub async fn update_presence(
    State(state): State<AppState>,
    AppPath(presence_id): AppPath<i64>,
    AppJson(payload): AppJson<PresencePayload>,
) -> AppResult<Json<Presence>> {
    let input = payload.validate()?;
    Ok(Json(presence_service::update_presence(&state.db_pool, presence_id, &input).await?))
}

pub async fn delete_presence(
    State(state): State<AppState>,
    AppPath(presence_id): AppPath<i64>,
) -> AppResult<StatusCode> {
    presence_service::delete_presence(&state.db_pool, presence_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /presences/class/{id}?date=
pub async fn class_presences(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    AppPath(class_id): AppPath<i64>,
    AppQuery(filter): AppQuery<DateFilter>,
) -> AppResult<Json<Vec<Presence>>> {
    let presences = presence_service::class_presences(&state.db_pool, &caller, class_id, filter.date).await?;
    Ok(Json(presences))
}

/// GET /myPresences
pub async fn my_presences(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Vec<Presence>>> {
    Ok(Json(presence_service::my_presences(&state.db_pool, &caller).await?))
}
