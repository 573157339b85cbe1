// src/web/user_handlers.rs
use crate::{
    error::AppResult,
    models::user::{PublicUser, Role},
    services::user_service,
    state::AppState,
};
use axum::{extract::State, Json};

/// GET /user: contas de professores e alunos.
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<PublicUser>>> {
    let users = user_service::find_users_by_roles(&state.db_pool, &[Role::Teacher, Role::Student]).await?;
    Ok(Json(users))
}

/// GET /teacher
pub async fn list_teachers(State(state): State<AppState>) -> AppResult<Json<Vec<PublicUser>>> {
    let teachers = user_service::find_users_by_roles(&state.db_pool, &[Role::Teacher]).await?;
    Ok(Json(teachers))
}
