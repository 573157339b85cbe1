// src/web/mw_auth.rs
use crate::{
    error::AppError,
    models::user::Caller,
    services::auth_service,
    state::AppState,
};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

/// Nome do cookie (assinado) onde o frontend guarda o token.
pub const AUTH_COOKIE: &str = "auth_token";

/// Token usado no pedido atual (para o logout o poder revogar).
#[derive(Clone, Debug)]
pub struct AuthToken(pub String);

/// Lê o token do header `Authorization: Bearer ...` ou, em alternativa, do cookie assinado.
fn token_from(request: &Request, cookies: &Cookies, state: &AppState) -> Option<String> {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        cookies
            .signed(&state.cookie_key)
            .get(AUTH_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

async fn resolve(state: &AppState, token: Option<String>) -> Result<Option<(Caller, String)>, AppError> {
    let Some(token) = token else {
        return Ok(None);
    };
    let caller = auth_service::resolve_token(&state.db_pool, &token).await?;
    Ok(caller.map(|caller| (caller, token)))
}

/// API: sem token válido -> 401. Com token, o `Caller` fica nas extensões.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = token_from(&request, &cookies, &state);
    match resolve(&state, token).await? {
        Some((caller, token)) => {
            tracing::debug!("Autenticação MW: {} ({}) autenticado.", caller.email, caller.role);
            request.extensions_mut().insert(caller);
            request.extensions_mut().insert(AuthToken(token));
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!("Autenticação MW: pedido sem token válido para {}", request.uri().path());
            Err(AppError::Unauthenticated)
        }
    }
}

/// Frontend: sem sessão válida redireciona para o login em vez de responder 401.
pub async fn require_ui_session(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = token_from(&request, &cookies, &state);
    match resolve(&state, token).await? {
        Some((caller, token)) => {
            request.extensions_mut().insert(caller);
            request.extensions_mut().insert(AuthToken(token));
            Ok(next.run(request).await)
        }
        None => {
            tracing::debug!("Sessão UI: não autenticado. Redirecionando para /app/login");
            Ok(Redirect::to("/app/login").into_response())
        }
    }
}
