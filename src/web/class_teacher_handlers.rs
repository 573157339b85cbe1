// src/web/class_teacher_handlers.rs
use crate::{
    error::AppResult,
    models::class_teacher::{ClassTeacher, ClassTeacherPayload},
    services::class_teacher_service,
    state::AppState,
    web::extract::{AppJson, AppPath},
};
use axum::{extract::State, http::StatusCode, Json};

pub async fn list_links(State(state): State<AppState>) -> AppResult<Json<Vec<ClassTeacher>>> {
    Ok(Json(class_teacher_service::list_links(&state.db_pool).await?))
}

pub async fn create_link(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ClassTeacherPayload>,
) -> AppResult<(StatusCode, Json<ClassTeacher>)> {
    let input = payload.validate()?;
    let link = class_teacher_service::create_link(&state.db_pool, &input).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn show_link(
    State(state): State<AppState>,
    AppPath(link_id): AppPath<i64>,
) -> AppResult<Json<ClassTeacher>> {
    Ok(Json(class_teacher_service::get_link(&state.db_pool, link_id).await?))
}

pub async fn update_link(
    State(state): State<AppState>,
    AppPath(link_id): AppPath<i64>,
    AppJson(payload): AppJson<ClassTeacherPayload>,
) -> AppResult<Json<ClassTeacher>> {
    let input = payload.validate()?;
    Ok(Json(class_teacher_service::update_link(&state.db_pool, link_id, &input).await?))
}

pub async fn delete_link(
    State(state): State<AppState>,
    AppPath(link_id): AppPath<i64>,
) -> AppResult<StatusCode> {
    class_teacher_service::delete_link(&state.db_pool, link_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
