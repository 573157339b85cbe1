// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        auth_handlers, class_teacher_handlers, classe_handlers, mw_auth, mw_policy,
        notification_handlers, presence_handlers, student_handlers, teacher_handlers, ui_handlers,
        user_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/login", post(auth_handlers::handle_login))
        .route("/register", post(auth_handlers::handle_register))
        .route("/app/login", get(ui_handlers::show_login_form).post(ui_handlers::handle_login))
        .route("/app/logout", get(ui_handlers::handle_logout))
        .route("/", get(|| async { axum::response::Redirect::permanent("/app") }));

    // --- API autenticada ---
    // Os caminhos ficam todos ao mesmo nível para coincidirem com a tabela de policy.
    let api_routes = Router::new()
        .route("/logout", post(auth_handlers::handle_logout))
        .route("/actor", get(auth_handlers::show_actor))
        .route("/user", get(user_handlers::list_users))
        .route("/teacher", get(user_handlers::list_teachers))
        .route("/classes", get(classe_handlers::list_classes).post(classe_handlers::create_classe))
        .route(
            "/classes/{id}",
            get(classe_handlers::show_classe)
                .put(classe_handlers::update_classe)
                .delete(classe_handlers::delete_classe),
        )
        .route("/classes/{id}/students", get(classe_handlers::class_students))
        .route(
            "/class-teachers",
            get(class_teacher_handlers::list_links).post(class_teacher_handlers::create_link),
        )
        .route(
            "/class-teachers/{id}",
            get(class_teacher_handlers::show_link)
                .put(class_teacher_handlers::update_link)
                .delete(class_teacher_handlers::delete_link),
        )
        .route("/students", get(student_handlers::list_students).post(student_handlers::create_student))
        .route("/students/enroll", post(student_handlers::enroll))
        .route(
            "/students/{id}",
            get(student_handlers::show_student)
                .put(student_handlers::update_student)
                .delete(student_handlers::delete_student),
        )
        .route("/students/{id}/class", put(student_handlers::assign_class))
        .route("/student/profile", get(student_handlers::my_profile))
        .route(
            "/presences",
            get(presence_handlers::list_presences).post(presence_handlers::mark_presence),
        )
        .route(
            "/presences/{id}",
            get(presence_handlers::show_presence)
                .put(presence_handlers::update_presence)
                .delete(presence_handlers::delete_presence),
        )
        .route("/presences/class/{id}", get(presence_handlers::class_presences))
        .route("/store", post(presence_handlers::mark_presence))
        .route("/myPresences", get(presence_handlers::my_presences))
        .route("/teacher/classes", get(teacher_handlers::my_classes))
        .route("/teacher/profile", get(teacher_handlers::my_profile))
        .route("/teacher/stats", get(teacher_handlers::my_stats))
        .route("/teacher/summary", get(teacher_handlers::my_summary))
        .route("/stats", get(teacher_handlers::global_stats))
        .route("/notifications", get(notification_handlers::list_notifications))
        .route("/notifications/{id}/read", put(notification_handlers::mark_as_read))
        // O último route_layer corre primeiro: autenticação, depois a policy
        .route_layer(middleware::from_fn(mw_policy::enforce))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_auth::require_auth));

    // --- Frontend autenticado ---
    let ui_routes = Router::new()
        .route("/app", get(ui_handlers::dashboard))
        .route("/app/classes/{id}", get(ui_handlers::class_page))
        .route("/app/classes/{id}/mark", post(ui_handlers::handle_mark))
        .route("/app/enroll", post(ui_handlers::handle_enroll))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_ui_session,
        ));

    // --- Router Final ---
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(ui_routes)
        .with_state(app_state)
}

/// Router com as camadas globais (tracing e cookies).
pub fn create_app(app_state: AppState) -> Router {
    create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CookieManagerLayer::new()),
    )
}
