// src/web/mod.rs
pub mod auth_handlers;
pub mod class_teacher_handlers;
pub mod classe_handlers;
pub mod extract;
pub mod mw_auth;
pub mod mw_policy;
pub mod notification_handlers;
pub mod presence_handlers;
pub mod routes;
pub mod student_handlers;
pub mod teacher_handlers;
pub mod ui_handlers;
pub mod user_handlers;
