// src/web/teacher_handlers.rs
// Rotas do próprio professor (/teacher/*) e estatísticas globais.
use crate::{
    error::AppResult,
    models::{
        classe::Classe,
        stats::{GlobalStats, TeacherStats, TeacherSummary},
        user::{Caller, PublicUser},
    },
    services::{class_teacher_service, stats_service},
    state::AppState,
};
use axum::{
    extract::{Extension, State},
    Json,
};

/// GET /teacher/classes
pub async fn my_classes(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Vec<Classe>>> {
    Ok(Json(class_teacher_service::classes_of_teacher(&state.db_pool, caller.id).await?))
}

/// GET /teacher/profile
pub async fn my_profile(Extension(caller): Extension<Caller>) -> Json<PublicUser> {
    Json(caller.to_public())
}

/// GET /teacher/stats
pub async fn my_stats(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<TeacherStats>> {
    Ok(Json(stats_service::teacher_stats(&state.db_pool, &caller).await?))
}

/// GET /teacher/summary
pub async fn my_summary(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<TeacherSummary>> {
    Ok(Json(stats_service::teacher_summary(&state.db_pool, &caller).await?))
}

/// GET /stats (admin)
pub async fn global_stats(State(state): State<AppState>) -> AppResult<Json<GlobalStats>> {
    Ok(Json(stats_service::global_stats(&state.db_pool).await?))
}
