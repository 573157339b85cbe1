// src/web/classe_handlers.rs
use crate::{
    error::AppResult,
    models::{
        classe::{Classe, ClassePayload, RosterEntry},
        user::Caller,
    },
    services::classe_service,
    state::AppState,
    web::extract::{AppJson, AppPath},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};

pub async fn list_classes(State(state): State<AppState>) -> AppResult<Json<Vec<Classe>>> {
    Ok(Json(classe_service::list_classes(&state.db_pool).await?))
}

pub async fn create_classe(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ClassePayload>,
) -> AppResult<(StatusCode, Json<Classe>)> {
    let input = payload.validate()?;
    let classe = classe_service::create_classe(&state.db_pool, &input).await?;
    Ok((StatusCode::CREATED, Json(classe)))
}

pub async fn show_classe(
    State(state): State<AppState>,
    AppPath(class_id): AppPath<i64>,
) -> AppResult<Json<Classe>> {
    Ok(Json(classe_service::get_classe(&state.db_pool, class_id).await?))
}

pub async fn update_classe(
    State(state): State<AppState>,
    AppPath(class_id): AppPath<i64>,
    AppJson(payload): AppJson<ClassePayload>,
) -> AppResult<Json<Classe>> {
    let input = payload.validate()?;
    Ok(Json(classe_service::update_classe(&state.db_pool, class_id, &input).await?))
}

pub async fn delete_classe(
    State(state): State<AppState>,
    AppPath(class_id): AppPath<i64>,
) -> AppResult<StatusCode> {
    classe_service::delete_classe(&state.db_pool, class_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /classes/{id}/students: admin ou professor da turma.
pub async fn class_students(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    AppPath(class_id): AppPath<i64>,
) -> AppResult<Json<Vec<RosterEntry>>> {
    Ok(Json(classe_service::class_roster(&state.db_pool, &caller, class_id).await?))
}
