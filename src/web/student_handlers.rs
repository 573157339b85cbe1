// src/web/student_handlers.rs
use crate::{
    error::AppResult,
    models::{
        student::{AssignClassPayload, EnrollPayload, Student, StudentFilter, StudentPayload},
        user::Caller,
    },
    services::student_service,
    state::AppState,
    web::extract::{AppJson, AppPath, AppQuery},
};
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};

/// GET /students?class_id=&search=
pub async fn list_students(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<StudentFilter>,
) -> AppResult<Json<Vec<Student>>> {
    Ok(Json(student_service::list_students(&state.db_pool, &filter).await?))
}

pub async fn create_student(
    State(state): State<AppState>,
    AppJson(payload): AppJson<StudentPayload>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let input = payload.validate()?;
    let student = student_service::create_student(&state.db_pool, &input).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn show_student(
    State(state): State<AppState>,
    AppPath(student_id): AppPath<i64>,
) -> AppResult<Json<Student>> {
    Ok(Json(student_service::get_student(&state.db_pool, student_id).await?))
}

pub async fn update_student(
    State(state): State<AppState>,
    AppPath(student_id): AppPath<i64>,
    AppJson(payload): AppJson<StudentPayload>,
) -> AppResult<Json<Student>> {
    let input = payload.validate()?;
    Ok(Json(student_service::update_student(&state.db_pool, student_id, &input).await?))
}

/// PUT /students/{id}/class: `class_id: null` retira o aluno da turma.
pub async fn assign_class(
    State(state): State<AppState>,
    AppPath(student_id): AppPath<i64>,
    AppJson(payload): AppJson<AssignClassPayload>,
) -> AppResult<Json<Student>> {
    Ok(Json(student_service::assign_class(&state.db_pool, student_id, payload.class_id).await?))
}

pub async fn delete_student(
    State(state): State<AppState>,
    AppPath(student_id): AppPath<i64>,
) -> AppResult<StatusCode> {
    student_service::delete_student(&state.db_pool, student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /students/enroll: o aluno cria o seu próprio registo.
pub async fn enroll(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    AppJson(payload): AppJson<EnrollPayload>,
) -> AppResult<(StatusCode, Json<Student>)> {
    let student = student_service::enroll(&state.db_pool, &caller, &payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /student/profile
pub async fn my_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Student>> {
    Ok(Json(student_service::my_profile(&state.db_pool, &caller).await?))
}
