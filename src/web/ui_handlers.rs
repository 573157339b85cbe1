// src/web/ui_handlers.rs
// Frontend HTML (/app). Usa os mesmos serviços da API; a sessão do browser
// é apenas o token guardado num cookie assinado.
use crate::{
    error::{AppError, AppResult},
    models::{
        presence::{PresenceFilter, PresencePayload},
        student::EnrollPayload,
        user::{Caller, LoginForm, LoginPayload, Role},
    },
    services::{
        auth_service, class_teacher_service, classe_service, notification_service, presence_service,
        stats_service, student_service,
    },
    state::AppState,
    templates::{AdminDashboard, ClassPage, LoginPage, StudentDashboard, TeacherDashboard},
    web::{extract::AppPath, mw_auth::AUTH_COOKIE},
};
use askama::Template;
use axum::{
    extract::{Extension, Form, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};

#[derive(Deserialize, Debug, Default)]
pub struct FeedbackParams {
    success: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ClassPageParams {
    date: Option<String>,
    success: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct MarkForm {
    student_id: i64,
    date: String,
    status: String,
}

// O select da turma envia "" quando não há escolha
#[derive(Deserialize, Debug)]
pub struct EnrollForm {
    first_name: String,
    last_name: String,
    #[serde(default)]
    class_id: String,
}

fn render(template: impl Template) -> AppResult<Html<String>> {
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Falha ao renderizar template: {}", e);
            Err(AppError::InternalServerError)
        }
    }
}

/// Mensagem curta para mostrar ao utilizador depois de um formulário falhar.
fn feedback_of(err: &AppError) -> String {
    match err {
        AppError::Validation(errors) => errors.messages().join(" "),
        other => other.user_message(),
    }
}

fn redirect_with(path: &str, key: &str, message: &str) -> Redirect {
    let separator = if path.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{}{}{}={}", path, separator, key, urlencoding::encode(message)))
}

fn session_cookie(token: String, ttl_hours: i64) -> Cookie<'static> {
    let mut cookie = Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if ttl_hours > 0 {
        cookie = cookie.max_age(time::Duration::hours(ttl_hours));
    }
    cookie.build()
}

// GET /app/login
pub async fn show_login_form(State(state): State<AppState>, cookies: Cookies) -> AppResult<Response> {
    let token = cookies
        .signed(&state.cookie_key)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string());
    if let Some(token) = token {
        if auth_service::resolve_token(&state.db_pool, &token).await?.is_some() {
            tracing::debug!("GET /app/login: sessão já ativa, redirecionando para /app");
            return Ok(Redirect::to("/app").into_response());
        }
    }
    Ok(render(LoginPage { error: None })?.into_response())
}

// POST /app/login
pub async fn handle_login(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let payload = LoginPayload {
        email: Some(form.email),
        password: Some(form.password),
    };
    match auth_service::login(&state.db_pool, &payload, state.config.token_ttl_hours).await {
        Ok(auth) => {
            cookies
                .signed(&state.cookie_key)
                .add(session_cookie(auth.token, state.config.token_ttl_hours));
            Ok(Redirect::to("/app").into_response())
        }
        Err(e @ (AppError::InvalidCredentials | AppError::Validation(_))) => {
            Ok(render(LoginPage { error: Some(feedback_of(&e)) })?.into_response())
        }
        Err(e) => Err(e),
    }
}

// GET /app/logout
pub async fn handle_logout(State(state): State<AppState>, cookies: Cookies) -> AppResult<Redirect> {
    let signed = cookies.signed(&state.cookie_key);
    if let Some(cookie) = signed.get(AUTH_COOKIE) {
        auth_service::revoke_token(&state.db_pool, cookie.value()).await?;
        tracing::info!("🚪 Sessão do frontend terminada.");
    }
    signed.remove(Cookie::build(AUTH_COOKIE).path("/").build());
    Ok(Redirect::to("/app/login"))
}

// GET /app: painel conforme o papel
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<FeedbackParams>,
) -> AppResult<Html<String>> {
    let db = &state.db_pool;
    tracing::debug!("GET /app: painel de {} ({})", caller.email, caller.role);
    match caller.role {
        Role::Admin => render(AdminDashboard {
            user: caller.to_public(),
            stats: stats_service::global_stats(db).await?,
            classes: classe_service::list_classes(db).await?,
            unread: notification_service::unread_count(db, &caller).await?,
            success_message: params.success,
            error_message: params.error,
        }),
        Role::Teacher => render(TeacherDashboard {
            user: caller.to_public(),
            classes: class_teacher_service::classes_of_teacher(db, caller.id).await?,
            stats: stats_service::teacher_stats(db, &caller).await?,
            summary: stats_service::teacher_summary(db, &caller).await?,
            success_message: params.success,
            error_message: params.error,
        }),
        Role::Student => {
            let profile = match student_service::my_profile(db, &caller).await {
                Ok(student) => Some(student),
                Err(AppError::NotFound(_)) => None,
                Err(e) => return Err(e),
            };
            let presences = match profile {
                Some(_) => presence_service::my_presences(db, &caller).await?,
                None => Vec::new(),
            };
            render(StudentDashboard {
                user: caller.to_public(),
                profile,
                presences,
                classes: classe_service::list_classes(db).await?,
                success_message: params.success,
                error_message: params.error,
            })
        }
    }
}

// GET /app/classes/{id}?date=
pub async fn class_page(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    AppPath(class_id): AppPath<i64>,
    Query(params): Query<ClassPageParams>,
) -> AppResult<Response> {
    let db = &state.db_pool;
    let date = params
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Local::now().date_naive());

    let access = match classe_service::get_classe(db, class_id).await {
        Ok(classe) => classe_service::ensure_class_scope(db, &caller, class_id)
            .await
            .map(|_| classe),
        Err(e) => Err(e),
    };
    let classe = match access {
        Ok(classe) => classe,
        Err(e) if e.status().is_server_error() => return Err(e),
        Err(e) => return Ok(redirect_with("/app", "error", &feedback_of(&e)).into_response()),
    };

    let roster = classe_service::roster_of(db, class_id).await?;
    let presences = presence_service::list_presences(
        db,
        &PresenceFilter {
            class_id: Some(class_id),
            date: Some(date),
            student_id: None,
        },
    )
    .await?;

    Ok(render(ClassPage {
        user: caller.to_public(),
        classe,
        roster,
        presences,
        date,
        success_message: params.success,
        error_message: params.error,
    })?
    .into_response())
}

// POST /app/classes/{id}/mark
pub async fn handle_mark(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    AppPath(class_id): AppPath<i64>,
    Form(form): Form<MarkForm>,
) -> AppResult<Redirect> {
    let back = format!("/app/classes/{}?date={}", class_id, urlencoding::encode(&form.date));
    let payload = PresencePayload {
        student_id: Some(form.student_id),
        date: Some(form.date),
        status: Some(form.status),
    };
    let result = match payload.validate() {
        Ok(input) => presence_service::mark_presence(&state.db_pool, &caller, &input).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(presence) => Ok(redirect_with(
            &back,
            "success",
            &format!("{} {}: {}", presence.first_name, presence.last_name, presence.status),
        )),
        Err(e) if e.status().is_server_error() => Err(e),
        Err(e) => Ok(redirect_with(&back, "error", &feedback_of(&e))),
    }
}

// POST /app/enroll
pub async fn handle_enroll(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Form(form): Form<EnrollForm>,
) -> AppResult<Redirect> {
    let class_id = match form.class_id.trim() {
        "" => None,
        raw => match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => return Ok(redirect_with("/app", "error", "Turma inválida.")),
        },
    };
    let payload = EnrollPayload {
        class_id,
        first_name: Some(form.first_name),
        last_name: Some(form.last_name),
    };
    match student_service::enroll(&state.db_pool, &caller, &payload).await {
        Ok(student) => Ok(redirect_with(
            "/app",
            "success",
            &format!("Inscrição concluída. Matrícula {}.", student.matricule),
        )),
        Err(e) if e.status().is_server_error() => Err(e),
        Err(e) => Ok(redirect_with("/app", "error", &feedback_of(&e))),
    }
}
