// src/services/mod.rs
pub mod auth_service;
pub mod class_teacher_service;
pub mod classe_service;
pub mod notification_service;
pub mod presence_service;
pub mod stats_service;
pub mod student_service;
pub mod user_service;
