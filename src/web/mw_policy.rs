// src/web/mw_policy.rs
use crate::{error::AppError, models::user::Caller, policy};
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

/// Aplica a tabela `policy::POLICY`. Corre depois de `require_auth`.
pub async fn enforce(request: Request, next: Next) -> Result<Response, AppError> {
    let Some((caller_id, role)) = request.extensions().get::<Caller>().map(|c| (c.id, c.role)) else {
        return Err(AppError::Unauthenticated);
    };
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_default();

    match policy::lookup(request.method(), &path) {
        Some(access) if access.allows(role) => Ok(next.run(request).await),
        Some(access) => {
            tracing::warn!(
                "Policy MW: user {} ({}) sem acesso a {} {} (exige {:?})",
                caller_id,
                role,
                request.method(),
                path,
                access
            );
            Err(AppError::Forbidden("Não tem permissão para este recurso.".to_string()))
        }
        None => {
            tracing::warn!("Policy MW: rota sem regra: {} {}", request.method(), path);
            Err(AppError::Forbidden("Não tem permissão para este recurso.".to_string()))
        }
    }
}
